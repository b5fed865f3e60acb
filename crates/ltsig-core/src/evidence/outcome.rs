//! Validation outcome types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::bundle::{RevocationEvidence, TimestampToken};
use crate::certificate::Certificate;

/// Overall validation verdict.
///
/// Serialized codes are stable and used by callers to branch on the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    /// Every check passed.
    Valid,
    /// The envelope signature does not verify.
    Invalid,
    /// The content or base signature does not match.
    SignatureNotMatchData,
    /// The timestamp is missing or malformed.
    InvalidTimestamp,
    /// A revocation item's window does not contain the timestamp.
    TimestampAfterValidityItem,
    /// Revocation evidence is missing, misdirected or not good.
    InvalidValidityItem,
}

impl ValidationStatus {
    /// Returns the stable status code.
    #[must_use]
    pub const fn as_code(self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
            Self::SignatureNotMatchData => "SIGNATURE_NOT_MATCH_DATA",
            Self::InvalidTimestamp => "INVALID_TIMESTAMP",
            Self::TimestampAfterValidityItem => "TIMESTAMP_AFTER_VALIDITY_ITEM",
            Self::InvalidValidityItem => "INVALID_VALIDITY_ITEM",
        }
    }

    /// Returns `true` for [`ValidationStatus::Valid`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// A non-fatal finding recorded during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ValidationWarning {
    /// A well-formed timestamp token's signature did not verify.
    TimestampSignatureUnverified {
        /// Token serial.
        serial: u64,
        /// Verification failure.
        detail: String,
    },
}

/// Result of validating a sealed bundle.
///
/// Carries the evidence whatever the status, so callers can report on
/// failed bundles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    /// Verdict.
    pub status: ValidationStatus,
    /// Signer certificate.
    pub signer: Certificate,
    /// Primary timestamp.
    pub timestamp: Option<TimestampToken>,
    /// Revocation evidence, signer first.
    pub revocation_evidence: Vec<RevocationEvidence>,
    /// Archive timestamps, oldest first.
    pub archive_timestamps: Vec<TimestampToken>,
    /// Non-fatal findings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationOutcome {
    /// Returns `true` if the status is valid.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.status.is_valid()
    }
}
