//! core::config
//!
//! Configuration schema for the pipeline.
//!
//! # Design
//!
//! The knobs here are policy, not algorithmic necessity: the historical
//! defaults (5 workers, 2 annotate attempts, 30 issues per recipient) are
//! preserved as defaults rather than constants.
//!
//! # Validation
//!
//! Config values are validated after parsing so that a zero worker count
//! or cap is rejected before the pipeline runs.
//!
//! # Example
//!
//! ```toml
//! project_name = "super-project"
//! resolver = "history"
//! worker_count = 5
//! annotate_attempts = 2
//! max_issues_per_user = 30
//! routing_policy = "anonymous"
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from configuration parsing and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or otherwise invalid.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Which resolution strategy to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    /// Copy the scanner's raw author hint into the resolved email.
    #[default]
    Direct,
    /// Attribute each issue line through revision history.
    History,
}

/// What to do with a group whose directory lookup failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingPolicy {
    /// Route the group's report to the anonymous recipient.
    #[default]
    Anonymous,
    /// Drop the report for that group entirely.
    Skip,
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Project name displayed in reports.
    pub project_name: String,

    /// Resolution strategy.
    pub resolver: ResolverKind,

    /// Number of concurrent per-issue resolutions.
    pub worker_count: usize,

    /// Attempts at annotating a file before accepting an empty history.
    pub annotate_attempts: usize,

    /// Maximum issues retained per recipient after ranking.
    pub max_issues_per_user: usize,

    /// Fallback when a group's directory lookup fails.
    pub routing_policy: RoutingPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            resolver: ResolverKind::Direct,
            worker_count: 5,
            annotate_attempts: 2,
            max_issues_per_user: 30,
            routing_policy: RoutingPolicy::Anonymous,
        }
    }
}

impl PipelineConfig {
    /// Parse a config from a TOML document and validate it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed TOML and
    /// `ConfigError::InvalidValue` if any value fails [`validate`].
    ///
    /// [`validate`]: PipelineConfig::validate
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::InvalidValue(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.annotate_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "annotate_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_issues_per_user == 0 {
            return Err(ConfigError::InvalidValue(
                "max_issues_per_user must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
