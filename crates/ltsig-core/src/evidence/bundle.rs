//! Evidence bundle data model.
//!
//! ```text
//! EvidenceBundle
//!     |-- base                BaseSignature      (immutable once created)
//!     |-- timestamp           Option<TimestampToken>
//!     |-- revocation          Vec<RevocationEvidence>
//!     `-- archive_timestamps  Vec<TimestampToken>
//! ```
//!
//! A bundle only ever grows. Fields are private and only the chain
//! builder and the envelope decoder construct bundles, so a value can never
//! lose a layer once it has one.
//!
//! # Canonical encoding
//!
//! Each bundle is serialized as three JSON parts: base signature,
//! revocation evidence and timestamps. Archive timestamps cover
//! [`EvidenceBundle::archive_input`], a domain-separated, length-prefixed
//! concatenation of the three parts in which the timestamp part only
//! includes the archive tokens that precede the one being computed.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::certificate::{Certificate, CertificateIdentity, KeyUsage};
use crate::crypto::{ContentSigner, CryptoError, Digest};
use crate::encoding::{base64_bytes, put_len_prefixed};

// =============================================================================
// Constants
// =============================================================================

/// Domain separator for the bytes covered by the base signature.
const BASE_SIGNATURE_DOMAIN: &[u8] = b"ltsig.base_signature.v1\0";

/// Domain separator for the bytes covered by a TSA signature.
const TIMESTAMP_TOKEN_DOMAIN: &[u8] = b"ltsig.timestamp_token.v1\0";

/// Domain separator for archive timestamp input.
const ARCHIVE_DOMAIN: &[u8] = b"ltsig.archive_input.v1\0";

/// Maximum number of archive timestamps on one bundle.
pub const MAX_ARCHIVE_TIMESTAMPS: usize = 64;

// =============================================================================
// Base signature
// =============================================================================

/// What the base signature signs: a digest of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentReference {
    /// Digest of the signed content.
    pub digest: Digest,
}

impl ContentReference {
    /// Returns the bytes the signer signs.
    #[must_use]
    pub fn signed_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(BASE_SIGNATURE_DOMAIN.len() + 48);
        buf.extend_from_slice(BASE_SIGNATURE_DOMAIN);
        put_len_prefixed(&mut buf, self.digest.algorithm.as_str().as_bytes());
        put_len_prefixed(&mut buf, &self.digest.value);
        buf
    }
}

/// The signer's signature over a content reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaseSignature {
    /// Signature value.
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
    /// Signer certificate.
    pub signer: Certificate,
    /// Signed content reference.
    pub content: ContentReference,
}

// =============================================================================
// Timestamp token
// =============================================================================

/// A structural problem with a timestamp token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TokenDefect {
    /// The TSA signature is empty.
    #[error("timestamp token has an empty signature")]
    EmptySignature,

    /// The imprint length does not match its algorithm.
    #[error("imprint has {len} bytes, {algorithm} requires {expected}")]
    ImprintLength {
        /// Declared algorithm.
        algorithm: String,
        /// Actual length.
        len: usize,
        /// Required length.
        expected: usize,
    },

    /// The TSA certificate is not authorized for time-stamping.
    #[error("TSA certificate lacks time-stamping usage")]
    MissingTimeStampingUsage,

    /// The claimed time is outside the TSA certificate validity.
    #[error("generation time {gen_time} outside TSA certificate validity")]
    OutsideTsaValidity {
        /// Claimed generation time.
        gen_time: DateTime<Utc>,
    },

    /// The imprint does not cover the expected data.
    #[error("imprint does not match the covered data")]
    ImprintMismatch,
}

/// A timestamp authority's attestation that an imprint existed at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimestampToken {
    /// Serial number assigned by the authority.
    pub serial: u64,
    /// Claimed generation time.
    pub gen_time: DateTime<Utc>,
    /// Digest of the timestamped data.
    pub imprint: Digest,
    /// Certificate of the issuing authority.
    pub tsa_certificate: Certificate,
    /// Authority signature over [`signed_bytes`](Self::signed_bytes).
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

impl TimestampToken {
    /// Issues a token with a local signer.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue(
        serial: u64,
        gen_time: DateTime<Utc>,
        imprint: Digest,
        authority: &dyn ContentSigner,
    ) -> Result<Self, CryptoError> {
        let mut token = Self {
            serial,
            gen_time,
            imprint,
            tsa_certificate: authority.certificate().clone(),
            signature: Vec::new(),
        };
        token.signature = authority.sign(&token.signed_bytes())?;
        Ok(token)
    }

    /// Returns the bytes the authority signs.
    #[must_use]
    pub fn signed_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(TIMESTAMP_TOKEN_DOMAIN.len() + 128);
        buf.extend_from_slice(TIMESTAMP_TOKEN_DOMAIN);
        buf.extend_from_slice(&self.serial.to_be_bytes());
        put_len_prefixed(
            &mut buf,
            self.gen_time
                .to_rfc3339_opts(SecondsFormat::AutoSi, true)
                .as_bytes(),
        );
        put_len_prefixed(&mut buf, self.imprint.algorithm.as_str().as_bytes());
        put_len_prefixed(&mut buf, &self.imprint.value);
        put_len_prefixed(&mut buf, self.tsa_certificate.subject_key_id().as_bytes());
        buf
    }

    /// Checks the token's shape without verifying its signature.
    ///
    /// # Errors
    ///
    /// Returns the first defect found.
    pub fn check_structure(&self) -> Result<(), TokenDefect> {
        if self.signature.is_empty() {
            return Err(TokenDefect::EmptySignature);
        }
        if !self.imprint.has_expected_len() {
            return Err(TokenDefect::ImprintLength {
                algorithm: self.imprint.algorithm.as_str().to_string(),
                len: self.imprint.value.len(),
                expected: self.imprint.algorithm.output_len(),
            });
        }
        if !self.tsa_certificate.has_usage(KeyUsage::TimeStamping) {
            return Err(TokenDefect::MissingTimeStampingUsage);
        }
        if !self.tsa_certificate.validity().contains(self.gen_time) {
            return Err(TokenDefect::OutsideTsaValidity {
                gen_time: self.gen_time,
            });
        }
        Ok(())
    }

    /// Checks that the imprint equals `expected` in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`TokenDefect::ImprintMismatch`] otherwise.
    pub fn check_imprint(&self, expected: &Digest) -> Result<(), TokenDefect> {
        if self.imprint.ct_eq(expected) {
            Ok(())
        } else {
            Err(TokenDefect::ImprintMismatch)
        }
    }
}

// =============================================================================
// Revocation evidence
// =============================================================================

/// Revocation state reported for a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case", deny_unknown_fields)]
pub enum RevocationStatus {
    /// Not revoked.
    Good,
    /// Revoked at the given time.
    Revoked {
        /// Revocation time.
        revoked_at: DateTime<Utc>,
        /// Reason, if the responder gave one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// The responder does not know the certificate.
    Unknown,
}

impl RevocationStatus {
    /// Returns `true` for [`RevocationStatus::Good`].
    #[must_use]
    pub const fn is_good(&self) -> bool {
        matches!(self, Self::Good)
    }
}

/// Kind of service that produced revocation evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationSource {
    /// Online status responder.
    Ocsp,
    /// Revocation list.
    Crl,
}

/// A statement about one certificate's status over a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevocationEvidence {
    /// The certificate this evidence is about.
    pub subject: CertificateIdentity,
    /// Reported status.
    pub status: RevocationStatus,
    /// Start of the validity window.
    pub this_update: DateTime<Utc>,
    /// End of the validity window.
    pub next_update: DateTime<Utc>,
    /// Producing service kind.
    pub source: RevocationSource,
    /// Raw response, kept for archival.
    #[serde(with = "base64_bytes")]
    pub response: Vec<u8>,
}

impl RevocationEvidence {
    /// Returns `true` if `at` falls inside `[this_update, next_update]`.
    #[must_use]
    pub fn window_contains(&self, at: DateTime<Utc>) -> bool {
        self.this_update <= at && at <= self.next_update
    }

    /// Returns the window length; negative when the window is inverted.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.next_update - self.this_update
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// Timestamp part of the wire encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TimestampPart {
    pub primary: Option<TimestampToken>,
    pub archive: Vec<TimestampToken>,
}

/// A signature and the evidence layered on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceBundle {
    base: BaseSignature,
    timestamp: Option<TimestampToken>,
    revocation: Vec<RevocationEvidence>,
    archive_timestamps: Vec<TimestampToken>,
}

impl EvidenceBundle {
    pub(crate) const fn from_parts(
        base: BaseSignature,
        timestamp: Option<TimestampToken>,
        revocation: Vec<RevocationEvidence>,
        archive_timestamps: Vec<TimestampToken>,
    ) -> Self {
        Self {
            base,
            timestamp,
            revocation,
            archive_timestamps,
        }
    }

    pub(crate) fn with_timestamp(&self, token: TimestampToken) -> Self {
        let mut next = self.clone();
        next.timestamp = Some(token);
        next
    }

    pub(crate) fn with_revocation(&self, evidence: Vec<RevocationEvidence>) -> Self {
        let mut next = self.clone();
        next.revocation = evidence;
        next
    }

    pub(crate) fn with_archive_timestamp(&self, token: TimestampToken) -> Self {
        let mut next = self.clone();
        next.archive_timestamps.push(token);
        next
    }

    /// Returns the base signature.
    #[must_use]
    pub const fn base(&self) -> &BaseSignature {
        &self.base
    }

    /// Returns the signer certificate.
    #[must_use]
    pub const fn signer(&self) -> &Certificate {
        &self.base.signer
    }

    /// Returns the primary timestamp, if present.
    #[must_use]
    pub const fn timestamp(&self) -> Option<&TimestampToken> {
        self.timestamp.as_ref()
    }

    /// Returns the revocation evidence, signer first.
    #[must_use]
    pub fn revocation(&self) -> &[RevocationEvidence] {
        &self.revocation
    }

    /// Returns the archive timestamps, oldest first.
    #[must_use]
    pub fn archive_timestamps(&self) -> &[TimestampToken] {
        &self.archive_timestamps
    }

    /// Number of evidence items: base, timestamp, each revocation item and
    /// each archive timestamp.
    #[must_use]
    pub fn evidence_count(&self) -> usize {
        1 + usize::from(self.timestamp.is_some())
            + self.revocation.len()
            + self.archive_timestamps.len()
    }

    /// Number of applied layers, counting each archive timestamp.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        1 + usize::from(self.timestamp.is_some())
            + usize::from(!self.revocation.is_empty())
            + self.archive_timestamps.len()
    }

    /// Encodes the three wire parts: base, revocation, timestamp.
    pub(crate) fn encode_parts(&self) -> Result<[Vec<u8>; 3], serde_json::Error> {
        self.encode_parts_covering(self.archive_timestamps.len())
    }

    fn encode_parts_covering(&self, archive_count: usize) -> Result<[Vec<u8>; 3], serde_json::Error> {
        let covered = archive_count.min(self.archive_timestamps.len());
        let timestamp = TimestampPart {
            primary: self.timestamp.clone(),
            archive: self.archive_timestamps[..covered].to_vec(),
        };
        Ok([
            serde_json::to_vec(&self.base)?,
            serde_json::to_vec(&self.revocation)?,
            serde_json::to_vec(&timestamp)?,
        ])
    }

    /// Bytes covered by the archive timestamp at index `archive_count`.
    ///
    /// Covers every layer present when that archive timestamp was added:
    /// the base signature, the revocation evidence, the primary timestamp
    /// and the first `archive_count` archive timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if a part cannot be serialized.
    pub fn archive_input(&self, archive_count: usize) -> Result<Vec<u8>, serde_json::Error> {
        let parts = self.encode_parts_covering(archive_count)?;
        let mut buf = Vec::with_capacity(
            ARCHIVE_DOMAIN.len() + parts.iter().map(|p| p.len() + 4).sum::<usize>(),
        );
        buf.extend_from_slice(ARCHIVE_DOMAIN);
        for part in &parts {
            put_len_prefixed(&mut buf, part);
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::certificate::{CertificateBuilder, KeyIdentifier};
    use crate::crypto::DigestAlgorithm;

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    fn cert(serial: &str, usage: Option<KeyUsage>) -> Certificate {
        let mut builder = CertificateBuilder::new(serial)
            .subject_key_id(KeyIdentifier::from_bytes(vec![1; 20]))
            .issuer_key_id(KeyIdentifier::from_bytes(vec![2; 20]))
            .validity(at(2020), at(2030))
            .public_key(vec![9; 32]);
        if let Some(usage) = usage {
            builder = builder.key_usage(usage);
        }
        builder.build().unwrap()
    }

    fn digest(byte: u8) -> Digest {
        Digest::new(DigestAlgorithm::Sha256, vec![byte; 32])
    }

    fn token() -> TimestampToken {
        TimestampToken {
            serial: 7,
            gen_time: at(2025),
            imprint: digest(3),
            tsa_certificate: cert("0e", Some(KeyUsage::TimeStamping)),
            signature: vec![1; 64],
        }
    }

    fn bundle() -> EvidenceBundle {
        EvidenceBundle::from_parts(
            BaseSignature {
                value: vec![5; 64],
                signer: cert("01", None),
                content: ContentReference { digest: digest(1) },
            },
            None,
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn test_token_structure_ok() {
        assert_eq!(token().check_structure(), Ok(()));
    }

    #[test]
    fn test_token_structure_defects() {
        let mut empty = token();
        empty.signature.clear();
        assert_eq!(empty.check_structure(), Err(TokenDefect::EmptySignature));

        let mut short = token();
        short.imprint.value.truncate(16);
        assert!(matches!(
            short.check_structure(),
            Err(TokenDefect::ImprintLength { len: 16, .. })
        ));

        let mut no_usage = token();
        no_usage.tsa_certificate = cert("0e", None);
        assert_eq!(
            no_usage.check_structure(),
            Err(TokenDefect::MissingTimeStampingUsage)
        );

        let mut late = token();
        late.gen_time = at(2031);
        assert!(matches!(
            late.check_structure(),
            Err(TokenDefect::OutsideTsaValidity { .. })
        ));
    }

    #[test]
    fn test_token_signed_bytes_bind_fields() {
        let base = token();
        let mut other = token();
        other.serial += 1;
        assert_ne!(base.signed_bytes(), other.signed_bytes());

        let mut moved = token();
        moved.gen_time = at(2026);
        assert_ne!(base.signed_bytes(), moved.signed_bytes());

        let mut resigned = token();
        resigned.signature = vec![2; 64];
        assert_eq!(base.signed_bytes(), resigned.signed_bytes());
    }

    #[test]
    fn test_check_imprint() {
        assert_eq!(token().check_imprint(&digest(3)), Ok(()));
        assert_eq!(
            token().check_imprint(&digest(4)),
            Err(TokenDefect::ImprintMismatch)
        );
    }

    #[test]
    fn test_revocation_window() {
        let evidence = RevocationEvidence {
            subject: cert("01", None).identity(),
            status: RevocationStatus::Good,
            this_update: at(2024),
            next_update: at(2026),
            source: RevocationSource::Ocsp,
            response: Vec::new(),
        };
        assert!(evidence.window_contains(at(2025)));
        assert!(evidence.window_contains(at(2026)));
        assert!(!evidence.window_contains(at(2027)));
        assert!(evidence.window() > Duration::zero());
    }

    #[test]
    fn test_revocation_status_serde() {
        let status = RevocationStatus::Revoked {
            revoked_at: at(2025),
            reason: Some("key_compromise".to_string()),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"state\":\"revoked\""));
        assert_eq!(serde_json::from_str::<RevocationStatus>(&json).unwrap(), status);
    }

    #[test]
    fn test_counts_grow_with_layers() {
        let base = bundle();
        assert_eq!((base.evidence_count(), base.layer_count()), (1, 1));

        let stamped = base.with_timestamp(token());
        assert_eq!((stamped.evidence_count(), stamped.layer_count()), (2, 2));

        let archived = stamped.with_archive_timestamp(token());
        assert_eq!((archived.evidence_count(), archived.layer_count()), (3, 3));
        assert_eq!(base.evidence_count(), 1);
    }

    #[test]
    fn test_archive_input_prefix_coverage() {
        let stamped = bundle().with_timestamp(token());
        let archived = stamped.with_archive_timestamp(token());

        assert_eq!(
            archived.archive_input(0).unwrap(),
            stamped.archive_input(0).unwrap()
        );
        assert_ne!(
            archived.archive_input(1).unwrap(),
            archived.archive_input(0).unwrap()
        );
        assert!(archived.archive_input(0).unwrap().starts_with(ARCHIVE_DOMAIN));
    }
}
