//! Evidence chain builder.
//!
//! Each operation takes a bundle by reference and returns a new bundle with
//! exactly one more layer. The input is never modified, so a failed
//! operation leaves the caller with the bundle it started from.
//!
//! ```text
//! sign_document / sign_digest  -> base signature
//!     add_timestamp            -> + primary timestamp
//!     add_revocation_evidence  -> + status for every chain certificate
//!     add_archive_timestamp    -> + archive timestamp (repeatable)
//!     seal                     -> signed wire envelope
//! ```
//!
//! Collaborator calls receive the configured timeout. Nothing is retried.

use std::time::Duration;

use tracing::{info, instrument, warn};

use super::bundle::{
    BaseSignature, ContentReference, EvidenceBundle, MAX_ARCHIVE_TIMESTAMPS, RevocationEvidence,
    TimestampToken,
};
use super::chain::{ChainLink, TrustStore, resolve_chain};
use super::envelope::SealedBundle;
use super::error::EvidenceError;
use super::services::{RevocationClient, ServiceError, TimestampAuthority};
use crate::certificate::Certificate;
use crate::crypto::{ContentSigner, CryptoProvider, Digest, DigestAlgorithm};

/// Default collaborator timeout.
pub const DEFAULT_SERVICE_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Configuration
// =============================================================================

/// How revocation status is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevocationPolicy {
    /// Use the fallback client when the primary one fails.
    pub allow_fallback: bool,
    /// Longest acceptable window for fallback evidence.
    pub max_fallback_window: Option<chrono::Duration>,
}

/// Builder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Timeout handed to every collaborator call.
    pub service_timeout: Duration,
    /// Algorithm for content and imprint digests.
    pub digest_algorithm: DigestAlgorithm,
    /// Revocation collection policy.
    pub revocation: RevocationPolicy,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            service_timeout: DEFAULT_SERVICE_TIMEOUT,
            digest_algorithm: DigestAlgorithm::default(),
            revocation: RevocationPolicy::default(),
        }
    }
}

impl BuilderConfig {
    /// Sets the collaborator timeout.
    #[must_use]
    pub const fn with_service_timeout(mut self, timeout: Duration) -> Self {
        self.service_timeout = timeout;
        self
    }

    /// Sets the digest algorithm.
    #[must_use]
    pub const fn with_digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = algorithm;
        self
    }

    /// Sets the revocation policy.
    #[must_use]
    pub const fn with_revocation_policy(mut self, policy: RevocationPolicy) -> Self {
        self.revocation = policy;
        self
    }
}

/// Revocation clients, tried in order.
#[derive(Clone, Copy)]
pub struct RevocationSources<'a> {
    primary: &'a dyn RevocationClient,
    fallback: Option<&'a dyn RevocationClient>,
}

impl<'a> RevocationSources<'a> {
    /// Sources with only a primary client.
    #[must_use]
    pub const fn new(primary: &'a dyn RevocationClient) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    /// Adds a fallback client.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: &'a dyn RevocationClient) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

impl std::fmt::Debug for RevocationSources<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationSources")
            .field("primary", &self.primary.source())
            .field("fallback", &self.fallback.map(|client| client.source()))
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Appends evidence layers to a signature.
pub struct EvidenceChainBuilder<'a> {
    crypto: &'a dyn CryptoProvider,
    config: BuilderConfig,
}

impl std::fmt::Debug for EvidenceChainBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceChainBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> EvidenceChainBuilder<'a> {
    /// Creates a builder.
    #[must_use]
    pub const fn new(crypto: &'a dyn CryptoProvider, config: BuilderConfig) -> Self {
        Self { crypto, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Signs `document` and starts a bundle.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::Crypto`] if signing fails.
    #[instrument(skip(self, signer, document), fields(document_len = document.len()))]
    pub fn sign_document(
        &self,
        signer: &dyn ContentSigner,
        document: &[u8],
    ) -> Result<EvidenceBundle, EvidenceError> {
        let digest = self.crypto.digest(self.config.digest_algorithm, document);
        self.sign_digest(signer, digest)
    }

    /// Signs a precomputed content digest and starts a bundle.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::InvalidDigest`] if the digest length does
    /// not match its algorithm, or [`EvidenceError::Crypto`] if signing
    /// fails.
    #[instrument(skip(self, signer, digest), fields(digest = %digest))]
    pub fn sign_digest(
        &self,
        signer: &dyn ContentSigner,
        digest: Digest,
    ) -> Result<EvidenceBundle, EvidenceError> {
        if !digest.has_expected_len() {
            return Err(EvidenceError::InvalidDigest {
                algorithm: digest.algorithm.as_str().to_string(),
                len: digest.value.len(),
                expected: digest.algorithm.output_len(),
            });
        }
        let content = ContentReference { digest };
        let value = signer.sign(&content.signed_bytes())?;
        let bundle = EvidenceBundle::from_parts(
            BaseSignature {
                value,
                signer: signer.certificate().clone(),
                content,
            },
            None,
            Vec::new(),
            Vec::new(),
        );
        info!(signer = %bundle.signer().identity(), "base signature created");
        Ok(bundle)
    }

    /// Adds the primary timestamp over the base signature value.
    ///
    /// The token's imprint and shape are checked; its signature is left to
    /// the validator.
    ///
    /// # Errors
    ///
    /// - [`EvidenceError::LayerAlreadyPresent`] if a timestamp exists
    /// - [`EvidenceError::LayerArchived`] if the bundle is archived
    /// - [`EvidenceError::TimestampService`] if the authority fails or the
    ///   token does not cover the requested imprint
    #[instrument(skip(self, bundle, tsa), fields(endpoint = %tsa.endpoint()))]
    pub fn add_timestamp(
        &self,
        bundle: &EvidenceBundle,
        tsa: &dyn TimestampAuthority,
    ) -> Result<EvidenceBundle, EvidenceError> {
        if bundle.timestamp().is_some() {
            return Err(EvidenceError::LayerAlreadyPresent { layer: "timestamp" });
        }
        if !bundle.archive_timestamps().is_empty() {
            return Err(EvidenceError::LayerArchived { layer: "timestamp" });
        }

        let imprint = self
            .crypto
            .digest(self.config.digest_algorithm, &bundle.base().value);
        let token = self.request_token(tsa, &imprint)?;

        info!(serial = token.serial, gen_time = %token.gen_time, "timestamp layer added");
        Ok(bundle.with_timestamp(token))
    }

    /// Collects revocation status for every non-anchor certificate in the
    /// signer's chain.
    ///
    /// All-or-nothing: the layer is added only if every certificate gets
    /// usable evidence.
    ///
    /// # Errors
    ///
    /// - [`EvidenceError::LayerAlreadyPresent`] if revocation evidence exists
    /// - [`EvidenceError::LayerArchived`] if the bundle is archived
    /// - chain errors from [`resolve_chain`]
    /// - [`EvidenceError::RevocationUnavailable`] if any certificate lacks
    ///   usable status, including a signer that is itself a trust anchor
    #[instrument(skip(self, bundle, store, sources))]
    pub fn add_revocation_evidence(
        &self,
        bundle: &EvidenceBundle,
        store: &TrustStore,
        sources: RevocationSources<'_>,
    ) -> Result<EvidenceBundle, EvidenceError> {
        if !bundle.revocation().is_empty() {
            return Err(EvidenceError::LayerAlreadyPresent {
                layer: "revocation",
            });
        }
        if !bundle.archive_timestamps().is_empty() {
            return Err(EvidenceError::LayerArchived {
                layer: "revocation",
            });
        }

        let chain = resolve_chain(bundle.signer(), store)?;
        if chain.is_empty() {
            return Err(EvidenceError::revocation_unavailable(
                bundle.signer().identity(),
                "signer is a trust anchor and has no issuer to report status",
            ));
        }

        let evidence = chain
            .iter()
            .map(|link| self.fetch_status(*link, sources))
            .collect::<Result<Vec<_>, _>>()?;

        info!(items = evidence.len(), "revocation layer added");
        Ok(bundle.with_revocation(evidence))
    }

    /// Adds an archive timestamp over every current layer.
    ///
    /// # Errors
    ///
    /// - [`EvidenceError::TooManyArchiveTimestamps`] at the bound
    /// - [`EvidenceError::TimestampService`] if the authority fails
    /// - [`EvidenceError::Encoding`] if the bundle cannot be encoded
    #[instrument(skip(self, bundle, tsa), fields(endpoint = %tsa.endpoint()))]
    pub fn add_archive_timestamp(
        &self,
        bundle: &EvidenceBundle,
        tsa: &dyn TimestampAuthority,
    ) -> Result<EvidenceBundle, EvidenceError> {
        let covered = bundle.archive_timestamps().len();
        if covered >= MAX_ARCHIVE_TIMESTAMPS {
            return Err(EvidenceError::TooManyArchiveTimestamps {
                max: MAX_ARCHIVE_TIMESTAMPS,
            });
        }

        let input = bundle.archive_input(covered)?;
        let imprint = self.crypto.digest(self.config.digest_algorithm, &input);
        let token = self.request_token(tsa, &imprint)?;

        info!(serial = token.serial, index = covered, "archive timestamp layer added");
        Ok(bundle.with_archive_timestamp(token))
    }

    /// Seals a bundle into a signed envelope.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::Envelope`] if encoding or signing fails.
    #[instrument(skip(self, bundle, sealer), fields(layers = bundle.layer_count()))]
    pub fn seal(
        &self,
        bundle: &EvidenceBundle,
        sealer: &dyn ContentSigner,
    ) -> Result<SealedBundle, EvidenceError> {
        Ok(SealedBundle::seal(bundle, sealer)?)
    }

    fn request_token(
        &self,
        tsa: &dyn TimestampAuthority,
        imprint: &Digest,
    ) -> Result<TimestampToken, EvidenceError> {
        let service_error = |source| EvidenceError::timestamp_service(tsa.endpoint(), source);

        let token = tsa
            .request(imprint, self.config.service_timeout)
            .map_err(service_error)?;
        token
            .check_imprint(imprint)
            .and_then(|()| token.check_structure())
            .map_err(|defect| service_error(ServiceError::invalid_response(defect.to_string())))?;
        Ok(token)
    }

    fn fetch_status(
        &self,
        link: ChainLink<'_>,
        sources: RevocationSources<'_>,
    ) -> Result<RevocationEvidence, EvidenceError> {
        let subject = link.certificate.identity();
        let timeout = self.config.service_timeout;

        let primary_failure = match sources
            .primary
            .request(link.certificate, link.issuer, timeout)
        {
            Ok(evidence) => match self.check_evidence(&evidence, link.certificate, false) {
                Ok(()) => return Ok(evidence),
                Err(detail) => detail,
            },
            Err(e) => e.to_string(),
        };

        let fallback = match sources.fallback {
            Some(fallback) if self.config.revocation.allow_fallback => fallback,
            _ => return Err(EvidenceError::revocation_unavailable(subject, primary_failure)),
        };

        warn!(
            subject = %subject,
            primary_failure = %primary_failure,
            source = ?fallback.source(),
            "primary revocation source failed, using fallback"
        );

        let evidence = fallback
            .request(link.certificate, link.issuer, timeout)
            .map_err(|e| {
                EvidenceError::revocation_unavailable(
                    subject.clone(),
                    format!("primary: {primary_failure}; fallback: {e}"),
                )
            })?;
        self.check_evidence(&evidence, link.certificate, true)
            .map_err(|detail| {
                EvidenceError::revocation_unavailable(
                    subject.clone(),
                    format!("primary: {primary_failure}; fallback: {detail}"),
                )
            })?;
        Ok(evidence)
    }

    fn check_evidence(
        &self,
        evidence: &RevocationEvidence,
        certificate: &Certificate,
        via_fallback: bool,
    ) -> Result<(), String> {
        if !certificate.has_identity(&evidence.subject) {
            return Err(format!(
                "evidence refers to {} instead of {}",
                evidence.subject,
                certificate.identity()
            ));
        }
        if evidence.next_update < evidence.this_update {
            return Err("evidence has an inverted validity window".to_string());
        }
        let max_window = self
            .config
            .revocation
            .max_fallback_window
            .filter(|_| via_fallback);
        if let Some(max) = max_window {
            if evidence.window() > max {
                return Err(format!(
                    "evidence window of {}s exceeds the {}s maximum",
                    evidence.window().num_seconds(),
                    max.num_seconds()
                ));
            }
        }
        Ok(())
    }
}
