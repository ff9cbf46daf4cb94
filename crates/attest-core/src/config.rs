//! Engine configuration.
//!
//! Parsed from TOML. Every field has a default so an empty file (or no file
//! at all) yields a working configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default autosave debounce delay in milliseconds.
pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 5000;

/// Default maximum length for free-text comments.
pub const DEFAULT_MAX_COMMENT_LEN: usize = 4096;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the TOML content.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field value is outside its permitted range.
    #[error("invalid config: {field} {reason}")]
    OutOfRange {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Autosave debounce delay in milliseconds. A mutation restarts the
    /// delay; the draft save fires once the delay elapses with no further
    /// mutation.
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,

    /// Maximum accepted length for free-text comments.
    #[serde(default = "default_max_comment_len")]
    pub max_comment_len: usize,
}

fn default_autosave_delay_ms() -> u64 {
    DEFAULT_AUTOSAVE_DELAY_MS
}

fn default_max_comment_len() -> usize {
    DEFAULT_MAX_COMMENT_LEN
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            max_comment_len: DEFAULT_MAX_COMMENT_LEN,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a value is out of range.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for a zero autosave delay or a
    /// zero comment limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.autosave_delay_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "autosave_delay_ms",
                reason: "must be greater than zero",
            });
        }
        if self.max_comment_len == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_comment_len",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    /// The autosave delay as a [`chrono::Duration`].
    #[must_use]
    pub fn autosave_delay(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.autosave_delay_ms).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config.autosave_delay_ms, 5000);
        assert_eq!(config.max_comment_len, 4096);
    }

    #[test]
    fn fields_override_individually() {
        let config = EngineConfig::from_toml("autosave_delay_ms = 250").unwrap();
        assert_eq!(config.autosave_delay_ms, 250);
        assert_eq!(config.max_comment_len, DEFAULT_MAX_COMMENT_LEN);
        assert_eq!(config.autosave_delay(), Duration::milliseconds(250));
    }

    #[test]
    fn zero_delay_is_rejected() {
        let err = EngineConfig::from_toml("autosave_delay_ms = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "autosave_delay_ms",
                ..
            }
        ));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_toml("autosave_delay_ms = "),
            Err(ConfigError::Parse(_))
        ));
    }
}
