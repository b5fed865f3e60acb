//! Issuance chain resolution for revocation collection.
//!
//! ```text
//! signer --issued by--> intermediate --issued by--> ... --> anchor
//!   |                      |
//!   ChainLink              ChainLink          (anchors get no link)
//! ```
//!
//! Issuers are matched by key identifier: a certificate's issuer key id
//! must equal the candidate's subject key id. Anchors are searched before
//! intermediates.

use super::error::EvidenceError;
use crate::certificate::Certificate;

/// Maximum number of non-anchor certificates in a chain.
pub const MAX_CHAIN_DEPTH: usize = 16;

/// Trust anchors and untrusted intermediates available for chain building.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    anchors: Vec<Certificate>,
    intermediates: Vec<Certificate>,
}

impl TrustStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trust anchor.
    #[must_use]
    pub fn with_anchor(mut self, anchor: Certificate) -> Self {
        self.anchors.push(anchor);
        self
    }

    /// Adds an intermediate certificate.
    #[must_use]
    pub fn with_intermediate(mut self, intermediate: Certificate) -> Self {
        self.intermediates.push(intermediate);
        self
    }

    /// Returns `true` if `certificate` is a trust anchor.
    #[must_use]
    pub fn is_anchor(&self, certificate: &Certificate) -> bool {
        self.anchors.iter().any(|anchor| anchor == certificate)
    }

    /// Finds the issuer of `certificate`, preferring anchors.
    #[must_use]
    pub fn find_issuer(&self, certificate: &Certificate) -> Option<&Certificate> {
        self.anchors
            .iter()
            .chain(&self.intermediates)
            .find(|candidate| certificate.is_issued_by(candidate))
    }
}

/// A non-anchor certificate and its issuer.
#[derive(Debug, Clone, Copy)]
pub struct ChainLink<'a> {
    /// Certificate needing revocation status.
    pub certificate: &'a Certificate,
    /// Its issuer.
    pub issuer: &'a Certificate,
}

/// Walks from `signer` up to a trust anchor.
///
/// Returns one link per non-anchor certificate, signer first. A signer that
/// is itself an anchor yields an empty chain.
///
/// # Errors
///
/// - [`EvidenceError::UntrustedRoot`] if the walk reaches a self-issued
///   certificate that is not an anchor
/// - [`EvidenceError::IncompleteChain`] if an issuer is missing
/// - [`EvidenceError::ChainTooLong`] beyond [`MAX_CHAIN_DEPTH`]
pub fn resolve_chain<'a>(
    signer: &'a Certificate,
    store: &'a TrustStore,
) -> Result<Vec<ChainLink<'a>>, EvidenceError> {
    let mut links = Vec::new();
    let mut current = signer;

    while !store.is_anchor(current) {
        if links.len() >= MAX_CHAIN_DEPTH {
            return Err(EvidenceError::ChainTooLong {
                max: MAX_CHAIN_DEPTH,
            });
        }
        if current.is_self_issued() {
            return Err(EvidenceError::UntrustedRoot {
                subject: current.identity(),
            });
        }
        let issuer = store
            .find_issuer(current)
            .ok_or_else(|| EvidenceError::IncompleteChain {
                subject: current.identity(),
            })?;
        links.push(ChainLink {
            certificate: current,
            issuer,
        });
        current = issuer;
    }

    Ok(links)
}
