//! Versioned field resolution.
//!
//! Certificate profiles have moved the same logical field (holder title,
//! organizational unit, subscriber identifier and name, pseudonym, national
//! identifier) between locations across policy revisions. Each logical
//! field is therefore described by an ordered list of [`FieldLocator`]s,
//! newest revision first, and [`resolve`] returns the value at the first
//! locator that yields one.
//!
//! ```text
//! fields/
//!     |-- locator.rs  - FieldNamespace, FieldLocator
//!     |-- resolver.rs - resolve() over any CertificateView
//!     `-- profile.rs  - LogicalField, per-kind locator tables, ClassifiedCertificate
//! ```
//!
//! # Invariants
//!
//! - Locator order is fixed and preserved exactly.
//! - An absent or malformed value at one locator never stops resolution of
//!   the remaining locators.
//! - A missing field is `None`, not an error.

mod locator;
pub mod profile;
mod resolver;

use thiserror::Error;

pub use self::locator::{FieldLocator, FieldNamespace};
pub use self::profile::{ClassifiedCertificate, LogicalField, locators};
pub use self::resolver::resolve;

/// A structural problem at one field location.
///
/// Only surfaces from [`CertificateView::lookup`]; [`resolve`] treats it as
/// absence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldError {
    /// The value exists but cannot be decoded.
    #[error("malformed value at {locator}: {reason}")]
    Malformed {
        /// Display form of the locator.
        locator: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Capability view over a certificate shared by classification and field
/// extraction.
pub trait CertificateView {
    /// Policy OIDs in certificate order.
    fn policy_oids(&self) -> &[String];

    /// Looks up the value at one location.
    ///
    /// Returns `Ok(None)` when nothing is stored there.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Malformed`] if a value exists but cannot be
    /// decoded.
    fn lookup(&self, locator: &FieldLocator) -> Result<Option<String>, FieldError>;
}
