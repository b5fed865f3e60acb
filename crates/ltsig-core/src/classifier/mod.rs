//! Policy-based certificate classification.
//!
//! A certificate's kind is decided from its policy OIDs in three tiers:
//!
//! ```text
//!   policy OIDs
//!       |
//!       v
//!   PolicyRegistry  --match-->  Registry
//!       | miss
//!       v
//!   FallbackTable   --match-->  Fallback   (optional, loaded at start-up)
//!       | miss
//!       v
//!   Unknown                     Generic
//! ```
//!
//! # Invariants
//!
//! - Matching is by string prefix in registration (or file) order.
//! - Classification never fails; configuration errors surface when the
//!   registry is built or the fallback table is loaded.
//! - All types here are immutable after construction and safe to share
//!   across threads.

mod builtin;
mod error;
mod fallback;
mod handler;
mod registry;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use self::builtin::BUILTIN_BINDINGS;
pub use self::error::ClassifierError;
pub use self::fallback::{FallbackTable, MAX_FALLBACK_ENTRIES};
pub use self::handler::{HandlerRegistry, MAX_HANDLER_ID_LEN};
pub use self::registry::{PolicyBinding, PolicyRegistry, PolicyRegistryBuilder};
use crate::certificate::CertificateKind;
use crate::fields::{CertificateView, ClassifiedCertificate};

/// Which tier produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    /// Matched a policy registry binding.
    Registry,
    /// Matched a fallback table entry.
    Fallback,
    /// Nothing matched; the generic kind was assigned.
    Generic,
}

/// Result of classifying one certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// The assigned kind.
    pub kind: CertificateKind,
    /// The tier that assigned it.
    pub source: ClassificationSource,
}

/// Registry, optional fallback table and generic default, composed.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    registry: PolicyRegistry,
    fallback: Option<FallbackTable>,
}

impl Classifier {
    /// Creates a classifier.
    #[must_use]
    pub const fn new(registry: PolicyRegistry, fallback: Option<FallbackTable>) -> Self {
        Self { registry, fallback }
    }

    /// Classifier over the built-in bindings with no fallback table.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(PolicyRegistry::builtin(), None)
    }

    /// Returns the policy registry.
    #[must_use]
    pub const fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Returns the fallback table, if one was loaded.
    #[must_use]
    pub const fn fallback(&self) -> Option<&FallbackTable> {
        self.fallback.as_ref()
    }

    /// Classifies a certificate.
    pub fn classify<V>(&self, certificate: &V) -> Classification
    where
        V: CertificateView + ?Sized,
    {
        let oids = certificate.policy_oids();

        if let Some(kind) = self.registry.classify(oids) {
            debug!(%kind, "classified by policy registry");
            return Classification {
                kind,
                source: ClassificationSource::Registry,
            };
        }

        if let Some(kind) = self
            .fallback
            .as_ref()
            .and_then(|table| table.lookup(oids))
        {
            debug!(%kind, "classified by fallback table");
            return Classification {
                kind,
                source: ClassificationSource::Fallback,
            };
        }

        debug!(policy_count = oids.len(), "no policy match, using generic kind");
        Classification {
            kind: CertificateKind::Unknown,
            source: ClassificationSource::Generic,
        }
    }

    /// Classifies a certificate and wraps it for field extraction.
    pub fn classified<'a, V>(&self, certificate: &'a V) -> ClassifiedCertificate<'a, V>
    where
        V: CertificateView + ?Sized,
    {
        ClassifiedCertificate::new(self.classify(certificate).kind, certificate)
    }
}
