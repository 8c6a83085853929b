//! # Observability Infrastructure
//!
//! Structured logging for the configuration model, built on `tracing` and
//! `tracing-subscriber`.

pub mod logging;

pub use logging::{build_subscriber, env_filter, init_tracing, log_config_info};
