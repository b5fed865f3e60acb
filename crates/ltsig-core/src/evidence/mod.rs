//! Long-term signature evidence.
//!
//! A signature stays verifiable long after its certificate expires when it
//! carries proof of *when* it was made (a timestamp) and proof that its
//! certificates were good *at that time* (revocation evidence), all sealed
//! together and optionally re-timestamped (archive timestamps).
//!
//! # Architecture
//!
//! ```text
//!  ContentSigner ---> EvidenceChainBuilder ---> EvidenceBundle
//!                        |        |                  |
//!        TimestampAuthority   RevocationClient       | seal
//!                                                    v
//!                                               SealedBundle  <--> bytes / Base64
//!                                                    |
//!                                           EvidenceValidator
//!                                                    |
//!                                            ValidationOutcome
//! ```
//!
//! - [`bundle`]: the evidence data model and canonical encoding
//! - [`builder`]: appends layers by calling collaborators
//! - [`chain`]: issuance chain resolution through a [`TrustStore`]
//! - [`envelope`]: the signed wire format
//! - [`validator`]: ordered offline checks producing a status code
//!
//! # Invariants
//!
//! - Layers are only ever added, and the base signature never changes.
//! - A failed builder operation leaves the input bundle as it was.
//! - Malformed wire input is an [`EnvelopeError`], never a status.
//! - Validation runs its checks in a fixed order and reports the first
//!   failure.

pub mod builder;
pub mod bundle;
pub mod chain;
pub mod envelope;
mod error;
pub mod outcome;
pub mod services;
pub mod validator;


pub use self::builder::{
    BuilderConfig, DEFAULT_SERVICE_TIMEOUT, EvidenceChainBuilder, RevocationPolicy,
    RevocationSources,
};
pub use self::bundle::{
    BaseSignature, ContentReference, EvidenceBundle, MAX_ARCHIVE_TIMESTAMPS, RevocationEvidence,
    RevocationSource, RevocationStatus, TimestampToken, TokenDefect,
};
pub use self::chain::{ChainLink, MAX_CHAIN_DEPTH, TrustStore, resolve_chain};
pub use self::envelope::{MAX_ENVELOPE_SIZE, SealedBundle};
pub use self::error::{EnvelopeError, EvidenceError};
pub use self::outcome::{ValidationOutcome, ValidationStatus, ValidationWarning};
pub use self::services::{RevocationClient, ServiceError, TimestampAuthority};
pub use self::validator::{
    ContentInput, EvidenceValidator, TimestampSignaturePolicy, ValidatorConfig,
};
