//! # Configuration Management
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional settings file (format chosen by extension), then environment
//! variables prefixed `FLOWPLANE_MODEL__` with `__` between nesting levels,
//! e.g. `FLOWPLANE_MODEL__OBSERVABILITY__LOG_LEVEL=debug`.

pub mod settings;

pub use settings::{AppConfig, ObservabilityConfig, SnapshotConfig};

use crate::errors::{Error, Result};
use std::path::Path;

/// Prefix of environment variables read by [`AppConfig::load`]
pub const ENV_PREFIX: &str = "FLOWPLANE_MODEL";

/// Separator between prefix and nesting levels in variable names
pub const ENV_SEPARATOR: &str = "__";

impl AppConfig {
    /// Load settings from defaults, `path` if given, and the process
    /// environment, then validate them.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`AppConfig::load`], reading variables from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(path: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let defaults = config::Config::try_from(&AppConfig::default())?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::config(format!("Settings file not found: {}", path.display())));
            }
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env),
        );

        let settings: AppConfig = builder.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = AppConfig::load_with_env(None, env(&[])).unwrap();
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.observability.service_name, "flowplane-model");
        assert_eq!(config.snapshot.max_logged_errors, 20);
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::load_with_env(
            None,
            env(&[
                ("FLOWPLANE_MODEL__OBSERVABILITY__LOG_LEVEL", "debug"),
                ("FLOWPLANE_MODEL__OBSERVABILITY__JSON_LOGGING", "true"),
                ("FLOWPLANE_MODEL__SNAPSHOT__CHECK_REFERENCES", "false"),
            ]),
        )
        .unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert!(config.observability.json_logging);
        assert!(!config.snapshot.check_references);
    }

    #[test]
    fn test_file_then_environment() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "observability:\n  log_level: warn\n  service_name: edge\nsnapshot:\n  max_logged_errors: 5").unwrap();

        let config = AppConfig::load_with_env(
            Some(file.path()),
            env(&[("FLOWPLANE_MODEL__OBSERVABILITY__LOG_LEVEL", "trace")]),
        )
        .unwrap();
        assert_eq!(config.observability.service_name, "edge");
        assert_eq!(config.observability.log_level, "trace");
        assert_eq!(config.snapshot.max_logged_errors, 5);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = AppConfig::load_with_env(None, env(&[("FLOWPLANE_MODEL__OBSERVABILITY__LOG_LEVEL", "chatty")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let missing = AppConfig::load_with_env(Some(Path::new("/nonexistent/settings.yaml")), env(&[]));
        assert!(missing.is_err());
    }
}
