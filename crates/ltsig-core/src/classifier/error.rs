//! Classifier-specific error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building registries or loading fallback tables.
///
/// Classification itself never fails; a miss is `None`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClassifierError {
    /// A policy prefix is not a dotted-decimal OID prefix.
    #[error("invalid policy prefix: {prefix:?}")]
    InvalidPrefix {
        /// The rejected prefix.
        prefix: String,
    },

    /// A kind identifier did not name any certificate kind.
    #[error("unknown certificate kind: {value}")]
    UnknownKind {
        /// The rejected identifier.
        value: String,
    },

    /// A handler identifier is not registered.
    #[error("unknown handler identifier {identifier:?} on line {line}")]
    UnknownHandler {
        /// The identifier that failed to resolve.
        identifier: String,
        /// 1-based line number in the table.
        line: usize,
    },

    /// A handler identifier is empty or contains invalid characters.
    #[error("invalid handler identifier: {identifier:?}")]
    InvalidHandlerIdentifier {
        /// The rejected identifier.
        identifier: String,
    },

    /// A handler identifier was registered twice.
    #[error("duplicate handler identifier: {identifier}")]
    DuplicateHandler {
        /// The duplicated identifier.
        identifier: String,
    },

    /// A fallback table line is not `prefix=identifier`.
    #[error("malformed fallback table line {line}: {content:?}")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// Line content.
        content: String,
    },

    /// The fallback table exceeds the entry bound.
    #[error("fallback table has too many entries (max {max})")]
    TooManyEntries {
        /// Maximum allowed.
        max: usize,
    },

    /// Failed to read the fallback table.
    #[error("failed to read fallback table at {path}: {source}")]
    ReadError {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ClassifierError {
    /// Creates an invalid-prefix error.
    #[must_use]
    pub fn invalid_prefix(prefix: impl Into<String>) -> Self {
        Self::InvalidPrefix {
            prefix: prefix.into(),
        }
    }

    /// Creates a malformed-line error.
    #[must_use]
    pub fn malformed_line(line: usize, content: impl Into<String>) -> Self {
        Self::MalformedLine {
            line,
            content: content.into(),
        }
    }
}
