//! YAML configuration.
//!
//! ```yaml
//! classification:
//!   fallback_table: /etc/ltsig/fallback.properties
//! services:
//!   timeout_ms: 10000
//!   digest_algorithm: sha256
//! revocation:
//!   allow_fallback: true
//!   max_fallback_window_secs: 604800
//! validation:
//!   timestamp_signature: tolerate
//! ```
//!
//! Every section and field is optional. Unknown fields are rejected.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::{
    Classifier, ClassifierError, FallbackTable, HandlerRegistry, PolicyRegistry,
};
use crate::crypto::DigestAlgorithm;
use crate::evidence::{BuilderConfig, RevocationPolicy, TimestampSignaturePolicy, ValidatorConfig};

/// Default collaborator timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Smallest accepted collaborator timeout in milliseconds.
pub const MIN_TIMEOUT_MS: u64 = 100;

/// Largest accepted collaborator timeout in milliseconds.
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Configuration errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML is invalid or does not match the schema.
    #[error("failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A value is out of range.
    #[error("invalid config: {message}")]
    ValidationError {
        /// What is wrong.
        message: String,
    },

    /// The fallback table could not be loaded.
    #[error("classifier config: {0}")]
    Classifier(#[from] ClassifierError),
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

/// Classification settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassificationSection {
    /// Path of the fallback table.
    #[serde(default)]
    pub fallback_table: Option<PathBuf>,
}

/// Collaborator service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServicesSection {
    /// Timeout per collaborator call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Digest algorithm for content and imprints.
    #[serde(default)]
    pub digest_algorithm: DigestAlgorithm,
}

const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for ServicesSection {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            digest_algorithm: DigestAlgorithm::default(),
        }
    }
}

/// Revocation collection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevocationSection {
    /// Allow the fallback revocation source.
    #[serde(default)]
    pub allow_fallback: bool,
    /// Longest acceptable fallback evidence window.
    #[serde(default)]
    pub max_fallback_window_secs: Option<u64>,
}

/// Validation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationSection {
    /// Handling of unverifiable timestamp signatures.
    #[serde(default)]
    pub timestamp_signature: TimestampSignaturePolicy,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LtsigConfig {
    /// Classification settings.
    #[serde(default)]
    pub classification: ClassificationSection,
    /// Collaborator service settings.
    #[serde(default)]
    pub services: ServicesSection,
    /// Revocation collection settings.
    #[serde(default)]
    pub revocation: RevocationSection,
    /// Validation settings.
    #[serde(default)]
    pub validation: ValidationSection,
}

impl LtsigConfig {
    /// Parses and validates a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] for invalid YAML or unknown
    /// fields and [`ConfigError::ValidationError`] for out-of-range values.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read,
    /// otherwise any error from [`from_yaml`](Self::from_yaml).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first
    /// problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.services.timeout_ms;
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&timeout) {
            return Err(ConfigError::validation(format!(
                "services.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}, got {timeout}"
            )));
        }
        if let Some(window) = self.revocation.max_fallback_window_secs {
            if window == 0 || fallback_window(window).is_none() {
                return Err(ConfigError::validation(format!(
                    "revocation.max_fallback_window_secs must be positive and representable, got {window}"
                )));
            }
            if !self.revocation.allow_fallback {
                return Err(ConfigError::validation(
                    "revocation.max_fallback_window_secs requires allow_fallback",
                ));
            }
        }
        Ok(())
    }

    /// Builder settings derived from this configuration.
    #[must_use]
    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig::default()
            .with_service_timeout(Duration::from_millis(self.services.timeout_ms))
            .with_digest_algorithm(self.services.digest_algorithm)
            .with_revocation_policy(RevocationPolicy {
                allow_fallback: self.revocation.allow_fallback,
                max_fallback_window: self
                    .revocation
                    .max_fallback_window_secs
                    .and_then(fallback_window),
            })
    }

    /// Validator settings derived from this configuration.
    #[must_use]
    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig::default().with_timestamp_signature(self.validation.timestamp_signature)
    }

    /// Builds the classifier, loading the fallback table if one is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Classifier`] if the table cannot be read or
    /// names an unknown handler.
    pub fn load_classifier(
        &self,
        registry: PolicyRegistry,
        handlers: &HandlerRegistry,
    ) -> Result<Classifier, ConfigError> {
        let fallback = self
            .classification
            .fallback_table
            .as_deref()
            .map(|path| FallbackTable::load(path, handlers))
            .transpose()?;
        Ok(Classifier::new(registry, fallback))
    }
}

/// Converts a window in seconds, or `None` if chrono cannot represent it.
fn fallback_window(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
}
