//! Evidence chain validator.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! ```text
//! 1. envelope signature        -> INVALID
//! 2. content and base signature -> SIGNATURE_NOT_MATCH_DATA
//! 3. timestamps                -> INVALID_TIMESTAMP
//! 4. windows contain gen_time  -> TIMESTAMP_AFTER_VALIDITY_ITEM
//! 5. evidence follows chain    -> INVALID_VALIDITY_ITEM
//! 6. every status is good      -> INVALID_VALIDITY_ITEM
//! ```
//!
//! Validation is pure: no network access, no clock reads. The same input
//! always yields the same outcome.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::bundle::{EvidenceBundle, TimestampToken};
use super::envelope::SealedBundle;
use super::outcome::{ValidationOutcome, ValidationStatus, ValidationWarning};
use crate::crypto::{CryptoProvider, Digest};

/// What to do when a well-formed timestamp's signature does not verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSignaturePolicy {
    /// Record a warning and continue.
    #[default]
    Tolerate,
    /// Fail with `INVALID_TIMESTAMP`.
    Enforce,
}

/// Validator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidatorConfig {
    /// Handling of unverifiable timestamp signatures.
    pub timestamp_signature: TimestampSignaturePolicy,
}

impl ValidatorConfig {
    /// Sets the timestamp signature policy.
    #[must_use]
    pub const fn with_timestamp_signature(mut self, policy: TimestampSignaturePolicy) -> Self {
        self.timestamp_signature = policy;
        self
    }
}

/// The content a bundle claims to sign.
#[derive(Debug, Clone, Copy)]
pub enum ContentInput<'a> {
    /// Document bytes, digested with the bundle's algorithm.
    Document(&'a [u8]),
    /// A precomputed digest.
    Digest(&'a Digest),
}

type Check = Result<(), ValidationStatus>;

/// Validates sealed evidence bundles.
pub struct EvidenceValidator<'a> {
    crypto: &'a dyn CryptoProvider,
    config: ValidatorConfig,
}

impl std::fmt::Debug for EvidenceValidator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceValidator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> EvidenceValidator<'a> {
    /// Creates a validator.
    #[must_use]
    pub const fn new(crypto: &'a dyn CryptoProvider, config: ValidatorConfig) -> Self {
        Self { crypto, config }
    }

    /// Validates `sealed` against `content`.
    #[must_use]
    pub fn validate(&self, sealed: &SealedBundle, content: ContentInput<'_>) -> ValidationOutcome {
        let bundle = sealed.bundle();
        let mut warnings = Vec::new();

        let status = match self.run_checks(sealed, content, &mut warnings) {
            Ok(()) => ValidationStatus::Valid,
            Err(status) => status,
        };
        debug!(%status, warnings = warnings.len(), "bundle validated");

        ValidationOutcome {
            status,
            signer: bundle.signer().clone(),
            timestamp: bundle.timestamp().cloned(),
            revocation_evidence: bundle.revocation().to_vec(),
            archive_timestamps: bundle.archive_timestamps().to_vec(),
            warnings,
        }
    }

    fn run_checks(
        &self,
        sealed: &SealedBundle,
        content: ContentInput<'_>,
        warnings: &mut Vec<ValidationWarning>,
    ) -> Check {
        let bundle = sealed.bundle();
        self.check_envelope(sealed)?;
        self.check_content(bundle, content)?;
        let gen_time = self.check_timestamps(bundle, warnings)?;
        check_windows(bundle, gen_time)?;
        check_references(bundle)?;
        check_statuses(bundle)
    }

    fn check_envelope(&self, sealed: &SealedBundle) -> Check {
        self.crypto
            .verify(sealed.sealer(), &sealed.signed_bytes(), sealed.signature())
            .map_err(|e| {
                debug!(error = %e, "envelope signature rejected");
                ValidationStatus::Invalid
            })
    }

    fn check_content(&self, bundle: &EvidenceBundle, content: ContentInput<'_>) -> Check {
        let base = bundle.base();
        let reference = &base.content.digest;

        let matches = match content {
            ContentInput::Document(document) => reference.ct_eq(
                &self.crypto.digest(reference.algorithm, document),
            ),
            ContentInput::Digest(digest) => reference.ct_eq(digest),
        };
        if !matches {
            debug!("content digest does not match the signed reference");
            return Err(ValidationStatus::SignatureNotMatchData);
        }

        self.crypto
            .verify(&base.signer, &base.content.signed_bytes(), &base.value)
            .map_err(|e| {
                debug!(error = %e, "base signature rejected");
                ValidationStatus::SignatureNotMatchData
            })
    }

    fn check_timestamps(
        &self,
        bundle: &EvidenceBundle,
        warnings: &mut Vec<ValidationWarning>,
    ) -> Result<chrono::DateTime<chrono::Utc>, ValidationStatus> {
        let primary = bundle.timestamp().ok_or_else(|| {
            debug!("bundle has no timestamp");
            ValidationStatus::InvalidTimestamp
        })?;
        let expected = self
            .crypto
            .digest(primary.imprint.algorithm, &bundle.base().value);
        self.check_token(primary, &expected, warnings)?;

        for (index, token) in bundle.archive_timestamps().iter().enumerate() {
            let input = bundle.archive_input(index).map_err(|e| {
                debug!(index, error = %e, "archive input encoding failed");
                ValidationStatus::InvalidTimestamp
            })?;
            let expected = self.crypto.digest(token.imprint.algorithm, &input);
            self.check_token(token, &expected, warnings)?;
        }

        Ok(primary.gen_time)
    }

    fn check_token(
        &self,
        token: &TimestampToken,
        expected: &Digest,
        warnings: &mut Vec<ValidationWarning>,
    ) -> Check {
        token
            .check_structure()
            .and_then(|()| token.check_imprint(expected))
            .map_err(|defect| {
                debug!(serial = token.serial, %defect, "timestamp rejected");
                ValidationStatus::InvalidTimestamp
            })?;

        let Err(e) = self
            .crypto
            .verify(&token.tsa_certificate, &token.signed_bytes(), &token.signature)
        else {
            return Ok(());
        };

        match self.config.timestamp_signature {
            TimestampSignaturePolicy::Enforce => {
                debug!(serial = token.serial, error = %e, "timestamp signature rejected");
                Err(ValidationStatus::InvalidTimestamp)
            },
            TimestampSignaturePolicy::Tolerate => {
                warn!(
                    serial = token.serial,
                    error = %e,
                    "timestamp signature does not verify, tolerating"
                );
                warnings.push(ValidationWarning::TimestampSignatureUnverified {
                    serial: token.serial,
                    detail: e.to_string(),
                });
                Ok(())
            },
        }
    }
}

fn check_windows(bundle: &EvidenceBundle, gen_time: chrono::DateTime<chrono::Utc>) -> Check {
    match bundle
        .revocation()
        .iter()
        .position(|item| !item.window_contains(gen_time))
    {
        Some(index) => {
            debug!(index, %gen_time, "revocation window does not contain timestamp");
            Err(ValidationStatus::TimestampAfterValidityItem)
        },
        None => Ok(()),
    }
}

/// The first item must be about the signer and each later item about the
/// issuer of the one before it.
fn check_references(bundle: &EvidenceBundle) -> Check {
    let items = bundle.revocation();
    let Some(first) = items.first() else {
        debug!("bundle has no revocation evidence");
        return Err(ValidationStatus::InvalidValidityItem);
    };
    if !bundle.signer().has_identity(&first.subject) {
        debug!(subject = %first.subject, "first revocation item is not about the signer");
        return Err(ValidationStatus::InvalidValidityItem);
    }
    for (index, pair) in items.windows(2).enumerate() {
        if pair[1].subject.subject_key_id != pair[0].subject.issuer_key_id {
            debug!(index = index + 1, "revocation item is not about the previous issuer");
            return Err(ValidationStatus::InvalidValidityItem);
        }
    }
    Ok(())
}

fn check_statuses(bundle: &EvidenceBundle) -> Check {
    match bundle
        .revocation()
        .iter()
        .find(|item| !item.status.is_good())
    {
        Some(item) => {
            debug!(subject = %item.subject, status = ?item.status, "certificate not in good standing");
            Err(ValidationStatus::InvalidValidityItem)
        },
        None => Ok(()),
    }
}
