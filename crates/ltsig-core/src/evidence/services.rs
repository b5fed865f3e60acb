//! Collaborator services consumed by the chain builder.
//!
//! Implementations talk to a timestamp authority and to revocation
//! responders. The builder hands every call the configured timeout and never
//! retries; an implementation must give up once the timeout elapses and
//! report [`ServiceError::TimedOut`].

use std::time::Duration;

use thiserror::Error;

use super::bundle::{RevocationEvidence, RevocationSource, TimestampToken};
use crate::certificate::Certificate;
use crate::crypto::Digest;

/// Failure reported by a collaborator service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ServiceError {
    /// The service could not be reached.
    #[error("service unreachable: {reason}")]
    Unreachable {
        /// Transport-level reason.
        reason: String,
    },

    /// The call did not complete within the timeout.
    #[error("service timed out after {timeout_ms}ms")]
    TimedOut {
        /// Timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The response could not be interpreted.
    #[error("invalid service response: {reason}")]
    InvalidResponse {
        /// What was wrong with it.
        reason: String,
    },

    /// The service refused the request.
    #[error("request rejected: {reason}")]
    Rejected {
        /// Refusal reason given by the service.
        reason: String,
    },
}

impl ServiceError {
    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Creates a timeout error for `timeout`.
    #[must_use]
    pub fn timed_out(timeout: Duration) -> Self {
        Self::TimedOut {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// A timestamp authority.
pub trait TimestampAuthority: Send + Sync {
    /// Identifies the authority in logs and errors.
    fn endpoint(&self) -> &str;

    /// Requests a token over `imprint`.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if the authority is unreachable, times out
    /// or answers with something other than a token.
    fn request(&self, imprint: &Digest, timeout: Duration) -> Result<TimestampToken, ServiceError>;
}

/// A revocation status responder.
pub trait RevocationClient: Send + Sync {
    /// Kind of evidence this client produces.
    fn source(&self) -> RevocationSource;

    /// Requests status for `certificate`, issued by `issuer`.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if no status can be obtained within
    /// `timeout`.
    fn request(
        &self,
        certificate: &Certificate,
        issuer: &Certificate,
        timeout: Duration,
    ) -> Result<RevocationEvidence, ServiceError>;
}
