//! Externally configured fallback table.
//!
//! The table is line-oriented text, one `prefix=handler-identifier` mapping
//! per line:
//!
//! ```text
//! # comments start with '#' or '!'
//! 1.3.6.1.4.1.99999.1 = legal_entity
//! 1.3.6.1.4.1.99999.2=acme.SealProfile
//! ```
//!
//! Keys and values are trimmed. Blank lines and comment lines are skipped.
//! Every identifier is resolved against a [`HandlerRegistry`] while
//! parsing, so a table that loads successfully can never name a missing
//! handler at classification time.

use std::path::Path;

use tracing::{info, instrument};

use super::error::ClassifierError;
use super::handler::HandlerRegistry;
use super::registry::{PolicyBinding, first_match, is_valid_prefix};
use crate::certificate::CertificateKind;

/// Maximum number of entries in a fallback table.
pub const MAX_FALLBACK_ENTRIES: usize = 4096;

/// Parsed fallback table, consulted after the policy registry misses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackTable {
    bindings: Vec<PolicyBinding>,
    content_hash: [u8; 32],
}

impl FallbackTable {
    /// Parses table text, resolving identifiers through `handlers`.
    ///
    /// # Errors
    ///
    /// - [`ClassifierError::MalformedLine`] for a line without `=`
    /// - [`ClassifierError::InvalidPrefix`] for an empty or non-numeric key
    /// - [`ClassifierError::UnknownHandler`] for an unregistered identifier
    /// - [`ClassifierError::TooManyEntries`] above [`MAX_FALLBACK_ENTRIES`]
    pub fn parse(text: &str, handlers: &HandlerRegistry) -> Result<Self, ClassifierError> {
        let mut bindings = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ClassifierError::malformed_line(line_number, line));
            };
            let (prefix, identifier) = (key.trim(), value.trim());

            if !is_valid_prefix(prefix) {
                return Err(ClassifierError::invalid_prefix(prefix));
            }
            let kind = handlers
                .resolve(identifier)
                .ok_or_else(|| ClassifierError::UnknownHandler {
                    identifier: identifier.to_string(),
                    line: line_number,
                })?;

            if bindings.len() >= MAX_FALLBACK_ENTRIES {
                return Err(ClassifierError::TooManyEntries {
                    max: MAX_FALLBACK_ENTRIES,
                });
            }
            bindings.push(PolicyBinding::new(prefix, kind));
        }

        Ok(Self {
            bindings,
            content_hash: *blake3::hash(text.as_bytes()).as_bytes(),
        })
    }

    /// Reads and parses a table file.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::ReadError`] if the file cannot be read,
    /// otherwise any error from [`parse`](Self::parse).
    #[instrument(skip(path, handlers), fields(path = %path.display()))]
    pub fn load(path: &Path, handlers: &HandlerRegistry) -> Result<Self, ClassifierError> {
        let content = std::fs::read_to_string(path).map_err(|e| ClassifierError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let table = Self::parse(&content, handlers)?;
        info!(
            entries = table.bindings.len(),
            content_hash = %table.content_hash_hex(),
            "fallback table loaded"
        );
        Ok(table)
    }

    /// Looks up the first entry matching any of `policy_oids`, in file order.
    #[must_use]
    pub fn lookup<S: AsRef<str>>(&self, policy_oids: &[S]) -> Option<CertificateKind> {
        first_match(&self.bindings, policy_oids)
    }

    /// Returns the entries in file order.
    #[must_use]
    pub fn bindings(&self) -> &[PolicyBinding] {
        &self.bindings
    }

    /// BLAKE3 hash of the source text, for identifying table versions in
    /// logs.
    #[must_use]
    pub const fn content_hash(&self) -> &[u8; 32] {
        &self.content_hash
    }

    /// Returns the content hash as lowercase hex, as logged on load.
    #[must_use]
    pub fn content_hash_hex(&self) -> String {
        hex::encode(self.content_hash)
    }
}
