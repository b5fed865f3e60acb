//! Certificate classification and long-term signature evidence.
//!
//! `ltsig-core` covers two concerns that share a certificate model:
//!
//! - **Classification**: deciding what kind of certificate a signer holds
//!   from its policy OIDs, and extracting semantic fields whose location
//!   moved between policy revisions.
//! - **Evidence**: building a signature's timestamp, revocation and archive
//!   evidence layers, sealing them into a signed envelope, and validating
//!   that envelope offline.
//!
//! # Architecture
//!
//! ```text
//! certificate  - Certificate, CertificateKind, builder
//! classifier   - PolicyRegistry, FallbackTable, HandlerRegistry, Classifier
//! fields       - FieldLocator, resolve(), per-kind locator tables
//! crypto       - digests, CryptoProvider, ContentSigner, Ed25519
//! evidence     - bundle, builder, envelope, validator
//! config       - YAML configuration
//! ```
//!
//! Registries and classifiers are built explicitly at start-up and are
//! immutable afterwards. Nothing in this crate holds global state.
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use ltsig_core::certificate::{CertificateBuilder, CertificateKind, KeyIdentifier};
//! use ltsig_core::classifier::{Classifier, ClassificationSource};
//! use ltsig_core::fields::LogicalField;
//!
//! let cert = CertificateBuilder::new("7f")
//!     .policy_oid("2.16.724.1.3.5.7.2")
//!     .alt_name_attribute("2.16.724.1.3.5.7.2.2", "Servicio de Ejemplo")
//!     .subject_key_id(KeyIdentifier::from_bytes(vec![1; 20]))
//!     .issuer_key_id(KeyIdentifier::from_bytes(vec![2; 20]))
//!     .validity(
//!         Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//!         Utc.with_ymd_and_hms(2028, 1, 1, 0, 0, 0).unwrap(),
//!     )
//!     .public_key(vec![0; 32])
//!     .build()
//!     .unwrap();
//!
//! let classifier = Classifier::builtin();
//! let classification = classifier.classify(&cert);
//! assert_eq!(classification.kind, CertificateKind::PublicEmployee);
//! assert_eq!(classification.source, ClassificationSource::Registry);
//! ```

pub mod certificate;
pub mod classifier;
pub mod config;
pub mod crypto;
mod encoding;
pub mod evidence;
pub mod fields;

pub use certificate::{Certificate, CertificateBuilder, CertificateKind};
pub use classifier::{Classification, ClassificationSource, Classifier, PolicyRegistry};
pub use config::{ConfigError, LtsigConfig};
pub use evidence::{
    EvidenceBundle, EvidenceChainBuilder, EvidenceValidator, SealedBundle, ValidationOutcome,
    ValidationStatus,
};
