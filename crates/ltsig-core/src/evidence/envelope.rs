//! Signed wire envelope for evidence bundles.
//!
//! # Layout
//!
//! ```text
//! +--------+---------+-------------+
//! | "LTSE" | version | part_count  |   4 + 1 + 4 bytes, counts big-endian
//! +--------+---------+-------------+
//! | len | base signature part (JSON)         |
//! | len | revocation evidence part (JSON)    |
//! | len | timestamp part (JSON)              |
//! | len | sealer certificate (JSON)          |
//! | len | envelope signature                 |
//! ```
//!
//! Lengths are u32 big-endian. Transport is standard Base64 of the whole
//! binary envelope.
//!
//! # Security Model
//!
//! The envelope signature covers the part bytes exactly as received, so
//! decoding never re-serializes before verification. Input size is bounded
//! before any parsing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;

use super::bundle::{
    BaseSignature, EvidenceBundle, MAX_ARCHIVE_TIMESTAMPS, RevocationEvidence, TimestampPart,
};
use super::chain::MAX_CHAIN_DEPTH;
use super::error::EnvelopeError;
use crate::certificate::Certificate;
use crate::crypto::ContentSigner;
use crate::encoding::put_len_prefixed;

// =============================================================================
// Constants
// =============================================================================

/// Envelope magic bytes.
pub const ENVELOPE_MAGIC: &[u8; 4] = b"LTSE";

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Number of bundle parts.
pub const ENVELOPE_PART_COUNT: u32 = 3;

/// Maximum binary envelope size (4 MiB).
pub const MAX_ENVELOPE_SIZE: usize = 4 * 1024 * 1024;

/// Domain separator for the envelope signature.
const SEAL_DOMAIN: &[u8] = b"ltsig.envelope.seal.v1\0";

const PART_NAMES: [&str; 3] = ["base signature", "revocation", "timestamp"];

// =============================================================================
// SealedBundle
// =============================================================================

/// An evidence bundle with its signed wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBundle {
    bundle: EvidenceBundle,
    parts: [Vec<u8>; 3],
    sealer: Certificate,
    sealer_raw: Vec<u8>,
    signature: Vec<u8>,
}

fn seal_input(parts: &[Vec<u8>; 3], sealer_raw: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        SEAL_DOMAIN.len()
            + parts.iter().map(|p| p.len() + 4).sum::<usize>()
            + sealer_raw.len()
            + 4,
    );
    buf.extend_from_slice(SEAL_DOMAIN);
    for part in parts {
        put_len_prefixed(&mut buf, part);
    }
    put_len_prefixed(&mut buf, sealer_raw);
    buf
}

impl SealedBundle {
    /// Encodes `bundle` and signs it with `sealer`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or signing fails.
    pub fn seal(bundle: &EvidenceBundle, sealer: &dyn ContentSigner) -> Result<Self, EnvelopeError> {
        let parts = bundle.encode_parts()?;
        let sealer_certificate = sealer.certificate().clone();
        let sealer_raw = serde_json::to_vec(&sealer_certificate)?;
        let signature = sealer.sign(&seal_input(&parts, &sealer_raw))?;
        Ok(Self {
            bundle: bundle.clone(),
            parts,
            sealer: sealer_certificate,
            sealer_raw,
            signature,
        })
    }

    /// Returns the decoded bundle.
    #[must_use]
    pub const fn bundle(&self) -> &EvidenceBundle {
        &self.bundle
    }

    /// Returns the sealer certificate.
    #[must_use]
    pub const fn sealer(&self) -> &Certificate {
        &self.sealer
    }

    /// Returns the envelope signature.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Returns the bytes covered by the envelope signature.
    #[must_use]
    pub fn signed_bytes(&self) -> Vec<u8> {
        seal_input(&self.parts, &self.sealer_raw)
    }

    /// Serializes to the binary envelope.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(ENVELOPE_MAGIC);
        buf.push(ENVELOPE_VERSION);
        buf.extend_from_slice(&ENVELOPE_PART_COUNT.to_be_bytes());
        for part in &self.parts {
            put_len_prefixed(&mut buf, part);
        }
        put_len_prefixed(&mut buf, &self.sealer_raw);
        put_len_prefixed(&mut buf, &self.signature);
        buf
    }

    /// Serializes to Base64 for transport.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Parses a binary envelope.
    ///
    /// The signature is not checked here; that is the validator's first
    /// step.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvelopeError`] for oversize, truncated or trailing
    /// input, wrong magic, version or part count, or undecodable parts.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        if bytes.len() > MAX_ENVELOPE_SIZE {
            return Err(EnvelopeError::TooLarge {
                size: bytes.len(),
                max: MAX_ENVELOPE_SIZE,
            });
        }

        let mut reader = Reader::new(bytes);
        if reader.take(ENVELOPE_MAGIC.len(), "magic")? != ENVELOPE_MAGIC {
            return Err(EnvelopeError::BadMagic);
        }
        let version = reader.u8("version")?;
        if version != ENVELOPE_VERSION {
            return Err(EnvelopeError::UnsupportedVersion { version });
        }
        let count = reader.u32("part count")?;
        if count != ENVELOPE_PART_COUNT {
            return Err(EnvelopeError::WrongPartCount { count });
        }

        let parts = [
            reader.len_prefixed(PART_NAMES[0])?.to_vec(),
            reader.len_prefixed(PART_NAMES[1])?.to_vec(),
            reader.len_prefixed(PART_NAMES[2])?.to_vec(),
        ];
        let sealer_raw = reader.len_prefixed("sealer certificate")?.to_vec();
        let signature = reader.len_prefixed("signature")?.to_vec();
        if reader.remaining() > 0 {
            return Err(EnvelopeError::TrailingBytes {
                count: reader.remaining(),
            });
        }

        let base: BaseSignature = decode_part(PART_NAMES[0], &parts[0])?;
        let revocation: Vec<RevocationEvidence> = decode_part(PART_NAMES[1], &parts[1])?;
        let timestamp: TimestampPart = decode_part(PART_NAMES[2], &parts[2])?;
        let sealer: Certificate = decode_part("sealer certificate", &sealer_raw)?;

        if revocation.len() > MAX_CHAIN_DEPTH {
            return Err(EnvelopeError::part_decode(
                PART_NAMES[1],
                format!("more than {MAX_CHAIN_DEPTH} items"),
            ));
        }
        if timestamp.archive.len() > MAX_ARCHIVE_TIMESTAMPS {
            return Err(EnvelopeError::part_decode(
                PART_NAMES[2],
                format!("more than {MAX_ARCHIVE_TIMESTAMPS} archive timestamps"),
            ));
        }

        Ok(Self {
            bundle: EvidenceBundle::from_parts(base, timestamp.primary, revocation, timestamp.archive),
            parts,
            sealer,
            sealer_raw,
            signature,
        })
    }

    /// Parses a Base64 envelope.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Base64`] for invalid Base64, otherwise any
    /// error from [`from_bytes`](Self::from_bytes).
    pub fn from_base64(text: &str) -> Result<Self, EnvelopeError> {
        let text = text.trim();
        let max_encoded = MAX_ENVELOPE_SIZE.div_ceil(3) * 4;
        if text.len() > max_encoded {
            return Err(EnvelopeError::TooLarge {
                size: text.len(),
                max: max_encoded,
            });
        }
        Self::from_bytes(&STANDARD.decode(text)?)
    }
}

fn decode_part<T: DeserializeOwned>(part: &'static str, bytes: &[u8]) -> Result<T, EnvelopeError> {
    serde_json::from_slice(bytes).map_err(|e| EnvelopeError::part_decode(part, e))
}

/// Bounds-checked cursor over envelope bytes.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize, context: &'static str) -> Result<&'a [u8], EnvelopeError> {
        if len > self.remaining() {
            return Err(EnvelopeError::Truncated { context });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self, context: &'static str) -> Result<u8, EnvelopeError> {
        Ok(self.take(1, context)?[0])
    }

    fn u32(&mut self, context: &'static str) -> Result<u32, EnvelopeError> {
        let bytes = self.take(4, context)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn len_prefixed(&mut self, context: &'static str) -> Result<&'a [u8], EnvelopeError> {
        let len = self.u32(context)? as usize;
        self.take(len, context)
    }
}
