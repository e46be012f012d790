//! Service configuration
//!
//! Loaded from TOML or built in code:
//!
//! ```toml
//! [service]
//! write_policy = "reject_stale"
//! label_max_len = 255
//! default_enabled = true
//!
//! [telemetry]
//! filter = "inquest=debug"
//! json = false
//! ```

use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML failed to parse or did not match the schema
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parsed but are out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// How a read-modify-write reacts to a concurrent writer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Unconditional save; the last writer wins
    #[default]
    LastWriteWins,
    /// Save only if the stored document still matches the one loaded
    RejectStale,
}

/// Document service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Concurrency policy for step mutations and overwrites
    pub write_policy: WritePolicy,
    /// Maximum label length in characters
    pub label_max_len: usize,
    /// Enabled flag for new entities without an explicit value
    pub default_enabled: bool,
}

impl ServiceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With write policy
    #[inline]
    #[must_use]
    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    /// With label limit
    #[inline]
    #[must_use]
    pub fn with_label_max_len(mut self, max: usize) -> Self {
        self.label_max_len = max;
        self
    }

    /// With default enabled flag
    #[inline]
    #[must_use]
    pub fn with_default_enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    /// Parse a bare service table
    ///
    /// # Errors
    /// Returns [`ConfigError`] on malformed TOML or out-of-range values
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if `label_max_len` is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.label_max_len == 0 {
            return Err(ConfigError::Invalid(
                "label_max_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            write_policy: WritePolicy::LastWriteWins,
            label_max_len: 255,
            default_enabled: true,
        }
    }
}

/// Tracing subscriber configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InquestConfig {
    /// Service settings
    pub service: ServiceConfig,
    /// Logging settings
    pub telemetry: TelemetryConfig,
}

impl InquestConfig {
    /// Parse and validate TOML
    ///
    /// Missing tables and keys take their defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on malformed TOML or out-of-range values
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.service.validate()?;
        Ok(config)
    }
}
