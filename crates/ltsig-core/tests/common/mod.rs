//! Shared fixtures for integration tests.
//!
//! Provides a deterministic Ed25519 PKI (root anchor, intermediate, signer,
//! timestamp authority) and in-memory collaborators whose behavior can be
//! adjusted per test.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use ltsig_core::certificate::{Certificate, CertificateBuilder, KeyIdentifier, KeyUsage};
use ltsig_core::crypto::{ContentSigner, Digest, Ed25519Signer, StandardCrypto};
use ltsig_core::evidence::envelope::{ENVELOPE_MAGIC, ENVELOPE_PART_COUNT, ENVELOPE_VERSION};
use ltsig_core::evidence::{
    BuilderConfig, EvidenceChainBuilder, RevocationClient, RevocationEvidence, RevocationSource,
    RevocationStatus, SealedBundle, ServiceError, TimestampAuthority, TimestampToken, TrustStore,
};

pub const DOCUMENT: &[u8] = b"Resolution 2025/117: approved.";

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Certificate with an Ed25519 key derived from `key`.
pub fn keyed(serial: &str, key: u8, issuer: u8, usages: &[KeyUsage]) -> Ed25519Signer {
    let seed = [key; 32];
    let mut builder = CertificateBuilder::new(serial)
        .subject_key_id(KeyIdentifier::from_bytes(vec![key; 20]))
        .issuer_key_id(KeyIdentifier::from_bytes(vec![issuer; 20]))
        .validity(at(2020, 1, 1), at(2035, 1, 1))
        .policy_oid("2.16.724.1.3.5.7.2")
        .public_key(Ed25519Signer::public_key_for_seed(&seed).to_vec());
    for usage in usages {
        builder = builder.key_usage(*usage);
    }
    Ed25519Signer::from_seed(&seed, builder.build().unwrap()).unwrap()
}

/// Root anchor, one intermediate, an end-entity signer and a sealer.
pub struct Pki {
    pub root: Certificate,
    pub intermediate: Certificate,
    pub signer: Ed25519Signer,
    pub sealer: Ed25519Signer,
}

impl Pki {
    pub fn new() -> Self {
        Self {
            root: keyed("01", 1, 1, &[KeyUsage::KeyCertSign, KeyUsage::CrlSign])
                .certificate()
                .clone(),
            intermediate: keyed("02", 2, 1, &[KeyUsage::KeyCertSign, KeyUsage::CrlSign])
                .certificate()
                .clone(),
            signer: keyed("03", 3, 2, &[KeyUsage::DigitalSignature, KeyUsage::NonRepudiation]),
            sealer: keyed("05", 5, 2, &[KeyUsage::DigitalSignature]),
        }
    }

    pub fn store(&self) -> TrustStore {
        TrustStore::new()
            .with_anchor(self.root.clone())
            .with_intermediate(self.intermediate.clone())
    }
}

pub fn tsa_signer() -> Ed25519Signer {
    keyed("04", 4, 1, &[KeyUsage::TimeStamping])
}

pub fn builder() -> EvidenceChainBuilder<'static> {
    EvidenceChainBuilder::new(&StandardCrypto, BuilderConfig::default())
}

// =============================================================================
// Timestamp authority
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsaMode {
    Honest,
    CorruptSignature,
    WrongImprint,
    Unreachable,
}

pub struct MockTsa {
    signer: Ed25519Signer,
    pub gen_time: DateTime<Utc>,
    pub mode: TsaMode,
    serial: AtomicU64,
    calls: AtomicUsize,
    last_timeout: Mutex<Option<Duration>>,
}

impl MockTsa {
    pub fn new() -> Self {
        Self {
            signer: tsa_signer(),
            gen_time: at(2025, 6, 15),
            mode: TsaMode::Honest,
            serial: AtomicU64::new(1000),
            calls: AtomicUsize::new(0),
            last_timeout: Mutex::new(None),
        }
    }

    pub fn with_mode(mode: TsaMode) -> Self {
        Self {
            mode,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_timeout(&self) -> Option<Duration> {
        *self.last_timeout.lock().unwrap()
    }
}

impl TimestampAuthority for MockTsa {
    fn endpoint(&self) -> &str {
        "https://tsa.test/rfc3161"
    }

    fn request(&self, imprint: &Digest, timeout: Duration) -> Result<TimestampToken, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_timeout.lock().unwrap() = Some(timeout);

        let mut imprint = imprint.clone();
        match self.mode {
            TsaMode::Unreachable => {
                return Err(ServiceError::Unreachable {
                    reason: "connection refused".to_string(),
                });
            },
            TsaMode::WrongImprint => imprint.value[0] ^= 0x01,
            TsaMode::Honest | TsaMode::CorruptSignature => {},
        }

        let serial = self.serial.fetch_add(1, Ordering::SeqCst);
        let mut token = TimestampToken::issue(serial, self.gen_time, imprint, &self.signer)
            .map_err(|e| ServiceError::invalid_response(e.to_string()))?;
        if self.mode == TsaMode::CorruptSignature {
            token.signature[0] ^= 0xff;
        }
        Ok(token)
    }
}

// =============================================================================
// Revocation responder
// =============================================================================

pub struct MockRevocation {
    pub source: RevocationSource,
    pub status: RevocationStatus,
    pub this_update: DateTime<Utc>,
    pub next_update: DateTime<Utc>,
    pub fail: bool,
    /// Answer with evidence about this certificate instead of the requested
    /// one.
    pub misdirect_to: Option<Certificate>,
    calls: AtomicUsize,
}

impl MockRevocation {
    pub fn good(source: RevocationSource) -> Self {
        Self {
            source,
            status: RevocationStatus::Good,
            this_update: at(2025, 6, 1),
            next_update: at(2025, 7, 1),
            fail: false,
            misdirect_to: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn ocsp() -> Self {
        Self::good(RevocationSource::Ocsp)
    }

    pub fn crl() -> Self {
        Self::good(RevocationSource::Crl)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RevocationClient for MockRevocation {
    fn source(&self) -> RevocationSource {
        self.source
    }

    fn request(
        &self,
        certificate: &Certificate,
        _issuer: &Certificate,
        _timeout: Duration,
    ) -> Result<RevocationEvidence, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ServiceError::Unreachable {
                reason: "responder offline".to_string(),
            });
        }
        let subject = self
            .misdirect_to
            .as_ref()
            .unwrap_or(certificate)
            .identity();
        Ok(RevocationEvidence {
            subject,
            status: self.status.clone(),
            this_update: self.this_update,
            next_update: self.next_update,
            source: self.source,
            response: format!("{:?} response", self.source).into_bytes(),
        })
    }
}

// =============================================================================
// Envelope surgery
// =============================================================================

/// Offset of the first length-prefixed field: magic, version, part count.
const HEADER_LEN: usize = ENVELOPE_MAGIC.len() + 1 + 4;

/// Splits an envelope into its five length-prefixed fields: three parts,
/// sealer certificate and signature.
pub fn split_envelope(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut fields = Vec::new();
    let mut pos = HEADER_LEN;
    while pos < bytes.len() {
        let len = u32::from_be_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
        fields.push(bytes[pos + 4..pos + 4 + len].to_vec());
        pos += 4 + len;
    }
    fields
}

/// Reassembles fields produced by [`split_envelope`].
pub fn join_envelope(fields: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(ENVELOPE_MAGIC);
    bytes.push(ENVELOPE_VERSION);
    bytes.extend_from_slice(&ENVELOPE_PART_COUNT.to_be_bytes());
    for field in fields {
        bytes.extend_from_slice(&u32::try_from(field.len()).unwrap().to_be_bytes());
        bytes.extend_from_slice(field);
    }
    bytes
}

/// Replaces the revocation part and seals the result with a valid
/// envelope signature, as a party holding a sealing key could.
pub fn reseal_with_revocation(
    sealed: &SealedBundle,
    items: &[RevocationEvidence],
    sealer: &dyn ContentSigner,
) -> SealedBundle {
    let mut fields = split_envelope(&sealed.to_bytes());
    fields[1] = serde_json::to_vec(items).unwrap();
    let forged = SealedBundle::from_bytes(&join_envelope(&fields)).unwrap();
    SealedBundle::seal(forged.bundle(), sealer).unwrap()
}
