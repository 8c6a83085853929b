//! # Error Types
//!
//! Crate-level error type using `thiserror`. Validation of the configuration
//! graph does not use this type directly: it produces a
//! [`ValidationError`] report, which converts into [`Error::Validation`]
//! when a caller wants to fail on it.

use crate::validation::ValidationError;

/// Custom result type for model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the configuration model
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The configuration graph failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// YAML serialization/deserialization errors
    #[error("YAML error: {context}")]
    Yaml {
        #[source]
        source: serde_yaml::Error,
        context: String,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// The validation report, if this is a validation failure
    pub fn validation_report(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(report) => Some(report),
            _ => None,
        }
    }

    /// Prepend context to errors that carry it
    pub fn context<S: Into<String>>(mut self, context: S) -> Self {
        let context = context.into();
        match &mut self {
            Error::Io { context: ctx, .. }
            | Error::Serialization { context: ctx, .. }
            | Error::Yaml { context: ctx, .. } => {
                *ctx = format!("{}: {}", context, ctx);
            }
            Error::Config { message, .. } | Error::Internal { message, .. } => {
                *message = format!("{}: {}", context, message);
            }
            Error::Validation(_) => {}
        }
        self
    }
}

// Error conversions for common external error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON serialization failed".to_string() }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Yaml { source: error, context: "YAML serialization failed".to_string() }
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_settings_errors(&errors, "", &mut fields);
        fields.sort();

        let message = fields
            .iter()
            .map(|(path, messages)| format!("{}: {}", path, messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");

        Self::config(format!("Invalid settings: {}", message))
    }
}

/// Flatten nested validator errors into `(dotted.path, messages)` pairs;
/// list items are addressed as `path[index]`.
fn collect_settings_errors(errors: &validator::ValidationErrors, prefix: &str, out: &mut Vec<(String, Vec<String>)>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or_else(|| format!("Invalid value ({})", e.code), |m| m.to_string()))
                    .collect();
                out.push((path, messages));
            }
            ValidationErrorsKind::Struct(nested) => collect_settings_errors(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_settings_errors(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}
