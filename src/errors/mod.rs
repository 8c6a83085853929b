//! # Error Handling
//!
//! Error types for the configuration model, defined with `thiserror`.
//! Field-level validation failures are reported separately as
//! [`crate::validation::ValidationError`].

mod types;

pub use types::{Error, Result};
