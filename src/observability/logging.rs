//! # Structured Logging
//!
//! Subscriber setup for the tracing ecosystem. The library itself only
//! emits events; binaries and tests decide whether to install a subscriber.
//!
//! Events emitted by this crate:
//! - `debug` when a snapshot fails validation, with a bounded sample of the
//!   error cases, and for each snapshot diff summary
//! - `trace` for every entity checked inside a snapshot

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Error, Result};
use tracing::Subscriber;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter: `RUST_LOG` when set, otherwise the configured level.
pub fn env_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.log_level, e))),
    }
}

/// Build the `fmt` subscriber described by `config` without installing it.
pub fn build_subscriber(config: &ObservabilityConfig) -> Result<Box<dyn Subscriber + Send + Sync>> {
    let builder = fmt().with_env_filter(env_filter(config)?).with_target(true);

    if config.json_logging {
        Ok(Box::new(builder.json().finish()))
    } else {
        Ok(Box::new(builder.finish()))
    }
}

/// Install the subscriber from [`build_subscriber`] as the global default.
///
/// Returns `Ok(false)` when a global subscriber was already installed, e.g.
/// by a test harness; that is not treated as an error.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<bool> {
    let installed = tracing::subscriber::set_global_default(build_subscriber(config)?).is_ok();

    if installed {
        tracing::info!(
            service_name = %config.service_name,
            log_level = %config.log_level,
            json_logging = config.json_logging,
            "Logging initialized"
        );
    }

    Ok(installed)
}

/// Log the effective settings
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        service_name = %config.observability.service_name,
        log_level = %config.observability.log_level,
        allow_unassigned_keys = config.snapshot.allow_unassigned_keys,
        check_references = config.snapshot.check_references,
        "Configuration model settings"
    );
}
