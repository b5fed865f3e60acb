//! Certificate object model.
//!
//! [`Certificate`] is the parsed, immutable view of an X.509 certificate as
//! produced by the external decoder: subject attributes, subject-alt-name
//! directory attributes, raw extensions, key identifiers, policy OIDs,
//! validity, key usages and the raw encoding. DER parsing itself happens
//! outside this crate; [`CertificateBuilder`] is the surface the decoder
//! fills in.
//!
//! # Identity
//!
//! Evidence refers to certificates by [`CertificateIdentity`] (serial
//! number plus issuer and subject key identifiers). Issuance chains are
//! linked by matching a child's issuer key identifier against the parent's
//! subject key identifier.

mod kind;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::kind::CertificateKind;
use crate::encoding::base64_bytes;
use crate::fields::{CertificateView, FieldError, FieldLocator, FieldNamespace};

// =============================================================================
// Constants
// =============================================================================

/// Maximum serial number length (hex characters).
pub const MAX_SERIAL_NUMBER_LEN: usize = 128;

/// Maximum number of policy OIDs carried by one certificate.
pub const MAX_POLICY_OIDS: usize = 64;

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while assembling a certificate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CertificateError {
    /// A required field was not supplied.
    #[error("missing required certificate field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// The serial number is empty or too long.
    #[error("invalid serial number length: {len} (max {max})")]
    InvalidSerialNumber {
        /// Actual length.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// `not_before` is after `not_after`.
    #[error("validity period is inverted: {not_before} > {not_after}")]
    InvertedValidity {
        /// Start of validity.
        not_before: DateTime<Utc>,
        /// End of validity.
        not_after: DateTime<Utc>,
    },

    /// Too many policy OIDs.
    #[error("too many policy OIDs: {count} (max {max})")]
    TooManyPolicies {
        /// Actual count.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// A key identifier is not valid hex.
    #[error("invalid key identifier: {0}")]
    InvalidKeyIdentifier(String),
}

// =============================================================================
// KeyIdentifier
// =============================================================================

/// Subject or authority key identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyIdentifier(Vec<u8>);

impl KeyIdentifier {
    /// Wraps raw identifier bytes.
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parses a hex-encoded identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if `s` is not valid hex.
    pub fn from_hex(s: &str) -> Result<Self, CertificateError> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| CertificateError::InvalidKeyIdentifier(e.to_string()))
    }

    /// Returns the raw identifier bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` if the identifier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyIdentifier({self})")
    }
}

impl TryFrom<String> for KeyIdentifier {
    type Error = CertificateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<KeyIdentifier> for String {
    fn from(id: KeyIdentifier) -> Self {
        id.to_string()
    }
}

// =============================================================================
// CertificateIdentity
// =============================================================================

/// Identity of a certificate as referenced by revocation evidence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertificateIdentity {
    /// Serial number (hex).
    pub serial_number: String,
    /// Key identifier of the issuing certificate.
    pub issuer_key_id: KeyIdentifier,
    /// Key identifier of this certificate.
    pub subject_key_id: KeyIdentifier,
}

impl fmt::Display for CertificateIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "serial={} issuer={} subject={}",
            self.serial_number, self.issuer_key_id, self.subject_key_id
        )
    }
}

// =============================================================================
// Certificate
// =============================================================================

/// Key usage and extended key usage flags relevant to evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyUsage {
    /// digitalSignature.
    DigitalSignature,
    /// nonRepudiation / contentCommitment.
    NonRepudiation,
    /// keyCertSign.
    KeyCertSign,
    /// cRLSign.
    CrlSign,
    /// id-kp-timeStamping.
    TimeStamping,
    /// id-kp-OCSPSigning.
    OcspSigning,
}

/// A single name attribute (OID and raw value bytes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attribute {
    /// Attribute type OID.
    pub oid: String,
    /// Raw value bytes as decoded from the directory string.
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

/// Certificate validity period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Validity {
    /// Start of validity (inclusive).
    pub not_before: DateTime<Utc>,
    /// End of validity (inclusive).
    pub not_after: DateTime<Utc>,
}

impl Validity {
    /// Returns `true` if `at` falls within the period.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

/// Parsed, immutable certificate.
///
/// Deserialization goes through [`CertificateBuilder::build`], so a decoded
/// certificate satisfies the same bounds as a built one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CertificateRepr")]
pub struct Certificate {
    serial_number: String,
    subject: Vec<Attribute>,
    alt_name_directory: Vec<Attribute>,
    extensions: Vec<Attribute>,
    subject_key_id: KeyIdentifier,
    issuer_key_id: KeyIdentifier,
    policy_oids: Vec<String>,
    validity: Validity,
    key_usage: Vec<KeyUsage>,
    #[serde(with = "base64_bytes")]
    public_key: Vec<u8>,
    #[serde(with = "base64_bytes")]
    raw: Vec<u8>,
}

/// Wire form of [`Certificate`], checked on conversion.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CertificateRepr {
    serial_number: String,
    subject: Vec<Attribute>,
    alt_name_directory: Vec<Attribute>,
    extensions: Vec<Attribute>,
    subject_key_id: KeyIdentifier,
    issuer_key_id: KeyIdentifier,
    policy_oids: Vec<String>,
    validity: Validity,
    key_usage: Vec<KeyUsage>,
    #[serde(with = "base64_bytes")]
    public_key: Vec<u8>,
    #[serde(with = "base64_bytes")]
    raw: Vec<u8>,
}

impl TryFrom<CertificateRepr> for Certificate {
    type Error = CertificateError;

    fn try_from(repr: CertificateRepr) -> Result<Self, Self::Error> {
        CertificateBuilder {
            serial_number: repr.serial_number,
            subject: repr.subject,
            alt_name_directory: repr.alt_name_directory,
            extensions: repr.extensions,
            subject_key_id: Some(repr.subject_key_id),
            issuer_key_id: Some(repr.issuer_key_id),
            policy_oids: repr.policy_oids,
            validity: Some(repr.validity),
            key_usage: repr.key_usage,
            public_key: repr.public_key,
            raw: repr.raw,
        }
        .build()
    }
}

impl Certificate {
    /// Returns the serial number (hex).
    #[must_use]
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Returns the subject distinguished-name attributes, in order.
    #[must_use]
    pub fn subject(&self) -> &[Attribute] {
        &self.subject
    }

    /// Returns the subject key identifier.
    #[must_use]
    pub const fn subject_key_id(&self) -> &KeyIdentifier {
        &self.subject_key_id
    }

    /// Returns the issuer (authority) key identifier.
    #[must_use]
    pub const fn issuer_key_id(&self) -> &KeyIdentifier {
        &self.issuer_key_id
    }

    /// Returns the validity period.
    #[must_use]
    pub const fn validity(&self) -> &Validity {
        &self.validity
    }

    /// Returns `true` if the certificate carries `usage`.
    #[must_use]
    pub fn has_usage(&self, usage: KeyUsage) -> bool {
        self.key_usage.contains(&usage)
    }

    /// Returns the subject public key bytes.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Returns the raw encoded certificate.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Returns `true` if subject and issuer key identifiers coincide.
    #[must_use]
    pub fn is_self_issued(&self) -> bool {
        self.subject_key_id == self.issuer_key_id
    }

    /// Returns the identity used by revocation evidence.
    #[must_use]
    pub fn identity(&self) -> CertificateIdentity {
        CertificateIdentity {
            serial_number: self.serial_number.clone(),
            issuer_key_id: self.issuer_key_id.clone(),
            subject_key_id: self.subject_key_id.clone(),
        }
    }

    /// Returns `true` if this certificate has the given identity.
    #[must_use]
    pub fn has_identity(&self, identity: &CertificateIdentity) -> bool {
        self.serial_number == identity.serial_number
            && self.issuer_key_id == identity.issuer_key_id
            && self.subject_key_id == identity.subject_key_id
    }

    /// Returns `true` if `issuer`'s key identifier is this certificate's
    /// issuer key identifier.
    #[must_use]
    pub fn is_issued_by(&self, issuer: &Self) -> bool {
        self.issuer_key_id == issuer.subject_key_id
    }
}

fn first_attribute<'a>(attributes: &'a [Attribute], oid: &str) -> Option<&'a [u8]> {
    attributes
        .iter()
        .find(|attribute| attribute.oid == oid)
        .map(|attribute| attribute.value.as_slice())
}

impl CertificateView for Certificate {
    fn policy_oids(&self) -> &[String] {
        &self.policy_oids
    }

    fn lookup(&self, locator: &FieldLocator) -> Result<Option<String>, FieldError> {
        let attributes = match locator.namespace() {
            FieldNamespace::Subject => &self.subject,
            FieldNamespace::SubjectAltName => &self.alt_name_directory,
            FieldNamespace::Extension => &self.extensions,
        };
        let Some(bytes) = first_attribute(attributes, locator.path()) else {
            return Ok(None);
        };
        let value = std::str::from_utf8(bytes).map_err(|_| FieldError::Malformed {
            locator: locator.to_string(),
            reason: "value is not valid UTF-8".to_string(),
        })?;
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        Ok(Some(value.to_string()))
    }
}

// =============================================================================
// CertificateBuilder
// =============================================================================

/// Builder for [`Certificate`], filled in by the external decoder.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use ltsig_core::certificate::{CertificateBuilder, KeyIdentifier, KeyUsage};
///
/// let cert = CertificateBuilder::new("1a2b")
///     .subject_attribute("2.5.4.3", "Jane Example")
///     .policy_oid("2.16.724.1.3.5.7.2")
///     .subject_key_id(KeyIdentifier::from_bytes(vec![0x01]))
///     .issuer_key_id(KeyIdentifier::from_bytes(vec![0x02]))
///     .validity(
///         Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///         Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap(),
///     )
///     .key_usage(KeyUsage::NonRepudiation)
///     .public_key(vec![0u8; 32])
///     .build()
///     .unwrap();
/// assert_eq!(cert.serial_number(), "1a2b");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CertificateBuilder {
    serial_number: String,
    subject: Vec<Attribute>,
    alt_name_directory: Vec<Attribute>,
    extensions: Vec<Attribute>,
    subject_key_id: Option<KeyIdentifier>,
    issuer_key_id: Option<KeyIdentifier>,
    policy_oids: Vec<String>,
    validity: Option<Validity>,
    key_usage: Vec<KeyUsage>,
    public_key: Vec<u8>,
    raw: Vec<u8>,
}

impl CertificateBuilder {
    /// Starts a certificate with the given serial number.
    #[must_use]
    pub fn new(serial_number: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            ..Self::default()
        }
    }

    /// Appends a subject DN attribute.
    #[must_use]
    pub fn subject_attribute(mut self, oid: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.subject.push(Attribute {
            oid: oid.into(),
            value: value.into(),
        });
        self
    }

    /// Appends a subject-alt-name directory attribute.
    #[must_use]
    pub fn alt_name_attribute(
        mut self,
        oid: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.alt_name_directory.push(Attribute {
            oid: oid.into(),
            value: value.into(),
        });
        self
    }

    /// Appends a raw extension value.
    #[must_use]
    pub fn extension(mut self, oid: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.extensions.push(Attribute {
            oid: oid.into(),
            value: value.into(),
        });
        self
    }

    /// Sets the subject key identifier.
    #[must_use]
    pub fn subject_key_id(mut self, id: KeyIdentifier) -> Self {
        self.subject_key_id = Some(id);
        self
    }

    /// Sets the issuer key identifier.
    #[must_use]
    pub fn issuer_key_id(mut self, id: KeyIdentifier) -> Self {
        self.issuer_key_id = Some(id);
        self
    }

    /// Appends a policy OID. Order is preserved.
    #[must_use]
    pub fn policy_oid(mut self, oid: impl Into<String>) -> Self {
        self.policy_oids.push(oid.into());
        self
    }

    /// Sets the validity period.
    #[must_use]
    pub const fn validity(mut self, not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Self {
        self.validity = Some(Validity {
            not_before,
            not_after,
        });
        self
    }

    /// Adds a key usage flag.
    #[must_use]
    pub fn key_usage(mut self, usage: KeyUsage) -> Self {
        if !self.key_usage.contains(&usage) {
            self.key_usage.push(usage);
        }
        self
    }

    /// Sets the subject public key bytes.
    #[must_use]
    pub fn public_key(mut self, key: Vec<u8>) -> Self {
        self.public_key = key;
        self
    }

    /// Sets the raw encoded certificate.
    #[must_use]
    pub fn raw(mut self, raw: Vec<u8>) -> Self {
        self.raw = raw;
        self
    }

    /// Builds the certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing or out of bounds.
    pub fn build(self) -> Result<Certificate, CertificateError> {
        if self.serial_number.is_empty() || self.serial_number.len() > MAX_SERIAL_NUMBER_LEN {
            return Err(CertificateError::InvalidSerialNumber {
                len: self.serial_number.len(),
                max: MAX_SERIAL_NUMBER_LEN,
            });
        }
        if self.policy_oids.len() > MAX_POLICY_OIDS {
            return Err(CertificateError::TooManyPolicies {
                count: self.policy_oids.len(),
                max: MAX_POLICY_OIDS,
            });
        }
        let subject_key_id = self
            .subject_key_id
            .filter(|id| !id.is_empty())
            .ok_or(CertificateError::MissingField {
                field: "subject_key_id",
            })?;
        let issuer_key_id = self
            .issuer_key_id
            .filter(|id| !id.is_empty())
            .ok_or(CertificateError::MissingField {
                field: "issuer_key_id",
            })?;
        let validity = self
            .validity
            .ok_or(CertificateError::MissingField { field: "validity" })?;
        if validity.not_before > validity.not_after {
            return Err(CertificateError::InvertedValidity {
                not_before: validity.not_before,
                not_after: validity.not_after,
            });
        }
        if self.public_key.is_empty() {
            return Err(CertificateError::MissingField {
                field: "public_key",
            });
        }

        Ok(Certificate {
            serial_number: self.serial_number,
            subject: self.subject,
            alt_name_directory: self.alt_name_directory,
            extensions: self.extensions,
            subject_key_id,
            issuer_key_id,
            policy_oids: self.policy_oids,
            validity,
            key_usage: self.key_usage,
            public_key: self.public_key,
            raw: self.raw,
        })
    }
}
