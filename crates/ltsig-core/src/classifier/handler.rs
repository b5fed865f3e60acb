//! String-keyed handler registry used by fallback tables.

use std::collections::BTreeMap;

use super::error::ClassifierError;
use crate::certificate::CertificateKind;

/// Maximum length of a handler identifier.
pub const MAX_HANDLER_ID_LEN: usize = 128;

fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier.len() <= MAX_HANDLER_ID_LEN
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ':'))
}

/// Maps handler identifiers to certificate kinds.
///
/// Populated by explicit [`register`](Self::register) calls; nothing is
/// discovered at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, CertificateKind>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every kind under its stable identifier.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            handlers: CertificateKind::ALL
                .iter()
                .map(|kind| (kind.as_str().to_string(), *kind))
                .collect(),
        }
    }

    /// Registers `identifier` as a handler for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InvalidHandlerIdentifier`] for an empty or
    /// oversized identifier or one with characters outside
    /// `[A-Za-z0-9._:-]`, and [`ClassifierError::DuplicateHandler`] if the
    /// identifier is already taken.
    pub fn register(
        &mut self,
        identifier: impl Into<String>,
        kind: CertificateKind,
    ) -> Result<(), ClassifierError> {
        let identifier = identifier.into();
        if !is_valid_identifier(&identifier) {
            return Err(ClassifierError::InvalidHandlerIdentifier { identifier });
        }
        if self.handlers.contains_key(&identifier) {
            return Err(ClassifierError::DuplicateHandler { identifier });
        }
        self.handlers.insert(identifier, kind);
        Ok(())
    }

    /// Resolves an identifier.
    #[must_use]
    pub fn resolve(&self, identifier: &str) -> Option<CertificateKind> {
        self.handlers.get(identifier).copied()
    }

    /// Iterates over registered identifiers in lexical order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}
