//! Evidence error types.

use thiserror::Error;

use super::services::ServiceError;
use crate::certificate::CertificateIdentity;
use crate::crypto::CryptoError;

/// Errors from chain builder operations.
///
/// On any error the input bundle is unchanged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvidenceError {
    /// The timestamp authority failed or returned an unusable token.
    #[error("timestamp authority {endpoint} failed: {source}")]
    TimestampService {
        /// Authority endpoint.
        endpoint: String,
        /// Underlying service error.
        #[source]
        source: ServiceError,
    },

    /// No usable status could be obtained for a chain certificate.
    #[error("revocation status unavailable for {subject}: {detail}")]
    RevocationUnavailable {
        /// Certificate lacking status.
        subject: CertificateIdentity,
        /// What went wrong.
        detail: String,
    },

    /// No issuer was found for a certificate in the chain.
    #[error("issuance chain incomplete: no issuer for {subject}")]
    IncompleteChain {
        /// Certificate whose issuer is missing.
        subject: CertificateIdentity,
    },

    /// The chain ends in a self-issued certificate that is not an anchor.
    #[error("issuance chain ends at untrusted root {subject}")]
    UntrustedRoot {
        /// The untrusted root.
        subject: CertificateIdentity,
    },

    /// The chain is deeper than allowed.
    #[error("issuance chain longer than {max} certificates")]
    ChainTooLong {
        /// Maximum allowed depth.
        max: usize,
    },

    /// The layer is already present and layers are never replaced.
    #[error("{layer} layer already present")]
    LayerAlreadyPresent {
        /// Layer name.
        layer: &'static str,
    },

    /// The layer would change data already covered by an archive timestamp.
    #[error("cannot add {layer} layer after an archive timestamp")]
    LayerArchived {
        /// Layer name.
        layer: &'static str,
    },

    /// The archive timestamp bound has been reached.
    #[error("too many archive timestamps (max {max})")]
    TooManyArchiveTimestamps {
        /// Maximum allowed.
        max: usize,
    },

    /// A supplied digest has the wrong length for its algorithm.
    #[error("digest has {len} bytes, {algorithm} requires {expected}")]
    InvalidDigest {
        /// Declared algorithm.
        algorithm: String,
        /// Actual length.
        len: usize,
        /// Required length.
        expected: usize,
    },

    /// Canonical encoding failed.
    #[error("evidence encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Sealing the envelope failed.
    #[error("envelope sealing failed: {0}")]
    Envelope(#[from] EnvelopeError),

    /// The signing primitive failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl EvidenceError {
    /// Creates a timestamp service error.
    #[must_use]
    pub fn timestamp_service(endpoint: impl Into<String>, source: ServiceError) -> Self {
        Self::TimestampService {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Creates a revocation-unavailable error.
    #[must_use]
    pub fn revocation_unavailable(subject: CertificateIdentity, detail: impl Into<String>) -> Self {
        Self::RevocationUnavailable {
            subject,
            detail: detail.into(),
        }
    }
}

/// A serialized bundle that cannot be decoded.
///
/// Malformed input is always an error, never a validation outcome.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnvelopeError {
    /// The input exceeds the size bound.
    #[error("envelope too large: {size} bytes (max {max})")]
    TooLarge {
        /// Input size.
        size: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// The transport encoding is not valid Base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The magic bytes are wrong.
    #[error("bad envelope magic")]
    BadMagic,

    /// The format version is not supported.
    #[error("unsupported envelope version {version}")]
    UnsupportedVersion {
        /// Version found.
        version: u8,
    },

    /// The part count is not three.
    #[error("envelope declares {count} parts, expected 3")]
    WrongPartCount {
        /// Declared count.
        count: u32,
    },

    /// The input ends early.
    #[error("envelope truncated while reading {context}")]
    Truncated {
        /// What was being read.
        context: &'static str,
    },

    /// Bytes follow the signature.
    #[error("{count} trailing bytes after envelope")]
    TrailingBytes {
        /// Number of extra bytes.
        count: usize,
    },

    /// A part does not decode.
    #[error("cannot decode {part} part: {detail}")]
    PartDecode {
        /// Part name.
        part: &'static str,
        /// Decoder message.
        detail: String,
    },

    /// Encoding a part failed.
    #[error("envelope encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Signing the envelope failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl EnvelopeError {
    /// Creates a part-decode error.
    #[must_use]
    pub fn part_decode(part: &'static str, detail: impl ToString) -> Self {
        Self::PartDecode {
            part,
            detail: detail.to_string(),
        }
    }
}
