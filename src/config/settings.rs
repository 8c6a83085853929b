//! # Configuration Settings
//!
//! Defines the settings structure for the configuration model: how logging
//! is set up and how whole snapshots are checked.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Logging configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    /// Snapshot checking configuration
    #[validate(nested)]
    pub snapshot: SnapshotConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;

        self.validate_custom()?;

        Ok(())
    }

    /// Checks the validator derives cannot express
    fn validate_custom(&self) -> Result<()> {
        if LevelFilter::from_str(&self.observability.log_level).is_err() {
            return Err(Error::config(format!(
                "Log level '{}' must be one of off, error, warn, info, debug, trace",
                self.observability.log_level
            )));
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Service name attached to log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Default log level (trace, debug, info, warn, error); `RUST_LOG`
    /// overrides it
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "flowplane-model".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

/// How [`crate::snapshot::ConfigSnapshot`] validation behaves
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Accept entities whose key has not been assigned yet
    pub allow_unassigned_keys: bool,

    /// Report references to zones, domains, shared rules and clusters that
    /// are not part of the snapshot
    pub check_references: bool,

    /// Upper bound on the error cases logged per snapshot; the report itself
    /// is never truncated
    #[validate(range(min = 1, max = 10000, message = "Log limit must be between 1 and 10000"))]
    pub max_logged_errors: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            allow_unassigned_keys: false,
            check_references: true,
            max_logged_errors: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.snapshot.check_references);
        assert!(!config.snapshot.allow_unassigned_keys);
    }

    #[test]
    fn test_config_validation_errors() {
        let mut config = AppConfig::default();
        config.observability.service_name = String::new();
        let err = config.validate().unwrap_err();
        assert!(
            err.to_string().contains("observability.service_name: Service name cannot be empty"),
            "{}",
            err
        );

        let mut config = AppConfig::default();
        config.observability.log_level = "loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Log level 'loud'"), "{}", err);
    }

    #[test]
    fn test_config_validation_ranges() {
        let mut config = AppConfig::default();
        config.snapshot.max_logged_errors = 0;
        let err = config.validate().unwrap_err();
        assert!(
            err.to_string().contains("snapshot.max_logged_errors: Log limit must be between 1 and 10000"),
            "{}",
            err
        );

        config.snapshot.max_logged_errors = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_level_names_accepted() {
        for level in ["off", "error", "warn", "info", "debug", "trace", "DEBUG"] {
            let mut config = AppConfig::default();
            config.observability.log_level = level.to_string();
            assert!(config.validate().is_ok(), "{}", level);
        }
    }
}
