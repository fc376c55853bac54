//! Runtime configuration.
//!
//! Loaded from YAML (or JSON, which YAML accepts). Every section has
//! defaults, so an empty file is a valid configuration.
//!
//! ```yaml
//! fetch:
//!   timeout: 15s
//!   max_retries: 2
//! completion:
//!   model: claude-sonnet-4-5-20250514
//!   timeout: 20s
//! circuit_breaker:
//!   failure_threshold: 3
//!   recovery_timeout: 30s
//! fallback: deterministic
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::providers::CompletionConfig;
use crate::resilience::{CircuitBreakerConfig, FallbackStrategy};

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub fetch: FetchConfig,
    pub completion: CompletionConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub fallback: FallbackStrategy,
}

impl RuntimeConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "fetch.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.fetch.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "fetch.timeout must be greater than zero".to_string(),
            ));
        }
        if self.completion.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "completion.timeout must be greater than zero".to_string(),
            ));
        }
        if self.completion.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "completion.max_tokens must be greater than zero".to_string(),
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "circuit_breaker.failure_threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for fetching documents from URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-attempt request timeout
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,

    /// Retries after the first attempt, for transient failures only
    pub max_retries: usize,

    /// First backoff delay; later delays grow exponentially
    #[serde(with = "humantime_duration")]
    pub retry_min_delay: Duration,

    /// Response bodies are truncated beyond this size
    pub max_body_bytes: usize,

    pub max_redirects: usize,

    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_retries: 2,
            retry_min_delay: Duration::from_millis(250),
            max_body_bytes: 5 * 1024 * 1024,
            max_redirects: 5,
            user_agent: "Mozilla/5.0 (compatible; ClauseGuard/0.1; +https://github.com/clauseguard/clauseguard)"
                .to_string(),
        }
    }
}

/// Serde adapter for human-readable durations ("15s", "1m 30s").
pub(crate) mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
