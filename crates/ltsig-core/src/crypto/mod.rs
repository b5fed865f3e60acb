//! Cryptographic provider boundary.
//!
//! Hashing, signing and signature verification are external collaborators.
//! The evidence builder and validator only ever reach them through the
//! [`CryptoProvider`] and [`ContentSigner`] traits, so deployments can plug
//! in an HSM, a smart card or a platform crypto library.
//!
//! [`StandardCrypto`] and [`Ed25519Signer`] are the in-process defaults:
//!
//! - **SHA-256** (`sha2`) and **BLAKE3** (`blake3`) digests
//! - **Ed25519** (`ed25519-dalek`) signatures, keyed by the certificate's
//!   public key bytes
//!
//! # Security Model
//!
//! - Digest comparison is constant-time ([`Digest::ct_eq`])
//! - Verification uses `verify_strict` (rejects malleable signatures)
//! - Signing key seeds are zeroized after use

mod ed25519;

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

pub use self::ed25519::{ED25519_PUBLIC_KEY_LEN, ED25519_SIGNATURE_LEN, Ed25519Signer};
use crate::certificate::Certificate;
use crate::encoding::base64_bytes;

// =============================================================================
// Errors
// =============================================================================

/// Errors raised by cryptographic primitives.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CryptoError {
    /// The certificate's public key cannot be used by this provider.
    #[error("invalid public key: {len} bytes")]
    InvalidPublicKey {
        /// Actual key length.
        len: usize,
    },

    /// A signing key seed has the wrong length.
    #[error("invalid signing key seed: expected 32 bytes, got {len}")]
    InvalidKeySeed {
        /// Actual seed length.
        len: usize,
    },

    /// The signature bytes have the wrong shape for this provider.
    #[error("invalid signature encoding: {len} bytes")]
    InvalidSignatureEncoding {
        /// Actual signature length.
        len: usize,
    },

    /// The signature does not verify.
    #[error("signature verification failed")]
    VerificationFailed,

    /// The signing key does not match the certificate it was paired with.
    #[error("signing key does not match certificate {serial_number}")]
    KeyMismatch {
        /// Serial number of the certificate.
        serial_number: String,
    },

    /// The signing primitive failed.
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

// =============================================================================
// Digests
// =============================================================================

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestAlgorithm {
    /// SHA-256.
    #[default]
    Sha256,
    /// BLAKE3 (256-bit output).
    Blake3,
}

impl DigestAlgorithm {
    /// Returns the output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha256 | Self::Blake3 => 32,
        }
    }

    /// Returns the stable identifier used in canonical encodings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A digest value tagged with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Digest {
    /// Algorithm that produced `value`.
    pub algorithm: DigestAlgorithm,
    /// Raw digest bytes.
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

impl Digest {
    /// Creates a digest from an algorithm and raw bytes.
    #[must_use]
    pub const fn new(algorithm: DigestAlgorithm, value: Vec<u8>) -> Self {
        Self { algorithm, value }
    }

    /// Constant-time equality over algorithm and value.
    #[must_use]
    pub fn ct_eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm
            && self.value.len() == other.value.len()
            && bool::from(self.value.ct_eq(&other.value))
    }

    /// Returns `true` if the value length matches the algorithm.
    #[must_use]
    pub fn has_expected_len(&self) -> bool {
        self.value.len() == self.algorithm.output_len()
    }

    /// Returns the digest value as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

// =============================================================================
// Provider traits
// =============================================================================

/// Hashing and verification primitives.
pub trait CryptoProvider: Send + Sync {
    /// Computes the digest of `data`.
    fn digest(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Digest;

    /// Verifies `signature` over `message` with the certificate's key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or signature is malformed or the
    /// signature does not verify.
    fn verify(
        &self,
        certificate: &Certificate,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError>;
}

/// A signing key paired with the certificate that vouches for it.
pub trait ContentSigner: Send + Sync {
    /// The certificate whose public key verifies this signer's output.
    fn certificate(&self) -> &Certificate;

    /// Signs `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing primitive fails.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Default provider: SHA-256 / BLAKE3 digests and Ed25519 verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCrypto;

impl CryptoProvider for StandardCrypto {
    fn digest(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Digest {
        let value = match algorithm {
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Blake3 => blake3::hash(data).as_bytes().to_vec(),
        };
        Digest::new(algorithm, value)
    }

    fn verify(
        &self,
        certificate: &Certificate,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        ed25519::verify(certificate.public_key(), message, signature)
    }
}
