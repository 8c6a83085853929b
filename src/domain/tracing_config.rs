//! Listener tracing configuration.

use serde::{Deserialize, Serialize};

use crate::domain::comparison::same_set;
use crate::validation::{Validation, ValidationError, HEADER_NAME_PATTERN, HEADER_NAME_PATTERN_STR};

/// How a listener annotates the spans it generates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TracingConfig {
    /// True when the listener handles requests from downstream, false when
    /// requests are bound for an upstream
    #[serde(default)]
    pub ingress: bool,

    /// Request headers copied onto generated spans as tags
    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub request_headers_for_tags: Vec<String>,
}

impl TracingConfig {
    /// Header lists compare as sets.
    pub fn equals(&self, other: &TracingConfig) -> bool {
        self.ingress == other.ingress
            && same_set(&self.request_headers_for_tags, &other.request_headers_for_tags)
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();
        for header in &self.request_headers_for_tags {
            if !HEADER_NAME_PATTERN.is_match(header) {
                errs.add(
                    "request_headers_for_tags",
                    format!(
                        "header {} is not a valid HTTP header name. Must match {}",
                        header, HEADER_NAME_PATTERN_STR
                    ),
                );
            }
        }
        errs.or_nil()
    }
}

impl PartialEq for TracingConfig {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}
