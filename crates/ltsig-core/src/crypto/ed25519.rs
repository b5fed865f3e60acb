//! Ed25519 signing and verification.
//!
//! ```text
//! Ed25519Signer
//!     |-- signing_key: SigningKey (private)
//!     `-- certificate: Certificate (carries the matching public key)
//! ```

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use super::{ContentSigner, CryptoError};
use crate::certificate::Certificate;

/// Length of an Ed25519 public key.
pub const ED25519_PUBLIC_KEY_LEN: usize = 32;

/// Length of an Ed25519 signature.
pub const ED25519_SIGNATURE_LEN: usize = 64;

/// Signs with an Ed25519 key on behalf of a certificate holder.
pub struct Ed25519Signer {
    signing_key: SigningKey,
    certificate: Certificate,
}

impl Ed25519Signer {
    /// Pairs a signing key with its certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyMismatch`] if the certificate's public key
    /// is not the key's verifying half.
    pub fn new(signing_key: SigningKey, certificate: Certificate) -> Result<Self, CryptoError> {
        if signing_key.verifying_key().as_bytes().as_slice() != certificate.public_key() {
            return Err(CryptoError::KeyMismatch {
                serial_number: certificate.serial_number().to_string(),
            });
        }
        Ok(Self {
            signing_key,
            certificate,
        })
    }

    /// Creates a signer from a 32-byte seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the seed is not 32 bytes or does not match the
    /// certificate.
    pub fn from_seed(seed: &[u8], certificate: Certificate) -> Result<Self, CryptoError> {
        let seed: Zeroizing<[u8; 32]> = Zeroizing::new(
            seed.try_into()
                .map_err(|_| CryptoError::InvalidKeySeed { len: seed.len() })?,
        );
        Self::new(SigningKey::from_bytes(&seed), certificate)
    }

    /// Generates a random seed from the operating system RNG.
    #[must_use]
    pub fn generate_seed() -> Zeroizing<[u8; 32]> {
        let mut seed = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut *seed);
        seed
    }

    /// Returns the public key bytes for a seed, for building the matching
    /// certificate.
    #[must_use]
    pub fn public_key_for_seed(seed: &[u8; 32]) -> [u8; ED25519_PUBLIC_KEY_LEN] {
        SigningKey::from_bytes(seed).verifying_key().to_bytes()
    }
}

impl ContentSigner for Ed25519Signer {
    fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(self.signing_key.sign(message).to_bytes().to_vec())
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("certificate", &self.certificate.identity())
            .finish_non_exhaustive()
    }
}

pub(super) fn verify(
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let key_bytes: [u8; ED25519_PUBLIC_KEY_LEN] =
        public_key
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey {
                len: public_key.len(),
            })?;
    let verifying_key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| {
        CryptoError::InvalidPublicKey {
            len: public_key.len(),
        }
    })?;
    let signature = Signature::from_slice(signature).map_err(|_| {
        CryptoError::InvalidSignatureEncoding {
            len: signature.len(),
        }
    })?;
    verifying_key
        .verify_strict(message, &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::certificate::{CertificateBuilder, KeyIdentifier};
    use crate::crypto::{CryptoProvider, StandardCrypto};

    const SEED: [u8; 32] = [7; 32];

    fn certificate_for(seed: &[u8; 32]) -> Certificate {
        CertificateBuilder::new("01")
            .subject_key_id(KeyIdentifier::from_bytes(vec![1, 2, 3]))
            .issuer_key_id(KeyIdentifier::from_bytes(vec![1, 2, 3]))
            .validity(
                Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2040, 1, 1, 0, 0, 0).unwrap(),
            )
            .public_key(Ed25519Signer::public_key_for_seed(seed).to_vec())
            .build()
            .unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = Ed25519Signer::from_seed(&SEED, certificate_for(&SEED)).unwrap();
        let signature = signer.sign(b"payload").unwrap();
        assert_eq!(signature.len(), ED25519_SIGNATURE_LEN);
        assert!(
            StandardCrypto
                .verify(signer.certificate(), b"payload", &signature)
                .is_ok()
        );
    }

    #[test]
    fn test_verify_rejects_other_message() {
        let signer = Ed25519Signer::from_seed(&SEED, certificate_for(&SEED)).unwrap();
        let signature = signer.sign(b"payload").unwrap();
        assert_eq!(
            StandardCrypto.verify(signer.certificate(), b"other", &signature),
            Err(CryptoError::VerificationFailed)
        );
    }

    #[test]
    fn test_key_mismatch_rejected() {
        let result = Ed25519Signer::from_seed(&[9; 32], certificate_for(&SEED));
        assert!(matches!(result, Err(CryptoError::KeyMismatch { .. })));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        let cert = certificate_for(&SEED);
        assert_eq!(
            StandardCrypto.verify(&cert, b"payload", &[0u8; 10]),
            Err(CryptoError::InvalidSignatureEncoding { len: 10 })
        );
    }

    #[test]
    fn test_generated_seeds_differ_and_sign() {
        let seed = Ed25519Signer::generate_seed();
        assert_ne!(*seed, *Ed25519Signer::generate_seed());
        let signer = Ed25519Signer::from_seed(&*seed, certificate_for(&seed)).unwrap();
        let signature = signer.sign(b"payload").unwrap();
        assert!(
            StandardCrypto
                .verify(signer.certificate(), b"payload", &signature)
                .is_ok()
        );
    }

    #[test]
    fn test_malformed_public_key_rejected() {
        assert_eq!(
            verify(&[0u8; 5], b"payload", &[0u8; 64]),
            Err(CryptoError::InvalidPublicKey { len: 5 })
        );
    }
}
