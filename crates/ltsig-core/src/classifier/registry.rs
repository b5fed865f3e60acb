//! Ordered policy-prefix registry.
//!
//! ```text
//! PolicyRegistryBuilder
//!     |-- register(prefixes, kind)   (appends, never overwrites)
//!     `-- build() -> PolicyRegistry  (validated, immutable)
//!
//! PolicyRegistry
//!     `-- classify(policy_oids) -> Option<CertificateKind>
//! ```
//!
//! # Invariants
//!
//! - Matching is a string-prefix test: policy OIDs carry version arcs
//!   beyond the registered base.
//! - Bindings are scanned in registration order and the first binding that
//!   matches any OID wins, regardless of OID order.
//! - Re-registering a prefix adds a second candidate at its own position.

use super::builtin::BUILTIN_BINDINGS;
use super::error::ClassifierError;
use crate::certificate::CertificateKind;

/// One (policy-OID prefix, kind) binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyBinding {
    prefix: String,
    kind: CertificateKind,
}

impl PolicyBinding {
    /// Creates a binding.
    #[must_use]
    pub fn new(prefix: impl Into<String>, kind: CertificateKind) -> Self {
        Self {
            prefix: prefix.into(),
            kind,
        }
    }

    /// Returns the policy prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the bound kind.
    #[must_use]
    pub const fn kind(&self) -> CertificateKind {
        self.kind
    }

    fn matches(&self, oid: &str) -> bool {
        oid.starts_with(self.prefix.as_str())
    }
}

/// Returns `true` if `prefix` is a non-empty run of digits and dots.
pub(crate) fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && !prefix.starts_with('.')
        && !prefix.contains("..")
}

/// Scans `bindings` in order against `policy_oids`.
pub(crate) fn first_match<S: AsRef<str>>(
    bindings: &[PolicyBinding],
    policy_oids: &[S],
) -> Option<CertificateKind> {
    bindings
        .iter()
        .find(|binding| policy_oids.iter().any(|oid| binding.matches(oid.as_ref())))
        .map(PolicyBinding::kind)
}

/// Collects bindings during start-up.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistryBuilder {
    bindings: Vec<PolicyBinding>,
}

impl PolicyRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one binding per prefix, in iteration order.
    #[must_use]
    pub fn register<I, S>(mut self, prefixes: I, kind: CertificateKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bindings.extend(
            prefixes
                .into_iter()
                .map(|prefix| PolicyBinding::new(prefix, kind)),
        );
        self
    }

    /// Validates every prefix and freezes the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InvalidPrefix`] for the first prefix that
    /// is not a dotted-decimal OID prefix.
    pub fn build(self) -> Result<PolicyRegistry, ClassifierError> {
        if let Some(bad) = self
            .bindings
            .iter()
            .find(|binding| !is_valid_prefix(binding.prefix()))
        {
            return Err(ClassifierError::invalid_prefix(bad.prefix()));
        }
        Ok(PolicyRegistry {
            bindings: self.bindings,
        })
    }
}

/// Immutable, ordered policy registry.
///
/// Built once at start-up and shared by reference; it has no interior
/// mutability, so concurrent reads need no synchronisation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyRegistry {
    bindings: Vec<PolicyBinding>,
}

impl PolicyRegistry {
    /// Starts a new registry.
    #[must_use]
    pub fn builder() -> PolicyRegistryBuilder {
        PolicyRegistryBuilder::new()
    }

    /// Registry holding the built-in profile bindings.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            bindings: BUILTIN_BINDINGS
                .iter()
                .map(|(prefix, kind)| PolicyBinding::new(*prefix, *kind))
                .collect(),
        }
    }

    /// Returns the bindings in precedence order.
    #[must_use]
    pub fn bindings(&self) -> &[PolicyBinding] {
        &self.bindings
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if no bindings are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Classifies a certificate's policy OIDs.
    ///
    /// Returns `None` when nothing matches or `policy_oids` is empty.
    #[must_use]
    pub fn classify<S: AsRef<str>>(&self, policy_oids: &[S]) -> Option<CertificateKind> {
        first_match(&self.bindings, policy_oids)
    }
}
