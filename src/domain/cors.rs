//! Cross-origin resource sharing settings for a domain.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::comparison::same_set;
use crate::validation::{Validation, ValidationError};

lazy_static! {
    /// Methods a domain may allow for cross-origin requests.
    pub static ref CORS_METHODS: HashSet<&'static str> =
        ["GET", "HEAD", "PUT", "POST", "DELETE"].into_iter().collect();
}

const WILDCARD_ORIGIN: &str = "*";

/// Reported when more than one origin is listed.
pub const SINGLE_ORIGIN_ONLY: &str = "currently Allowed-Origins only supports wildcard or a single target";

/// How a domain answers preflight requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub allowed_origins: Vec<String>,

    #[serde(default)]
    pub allow_credentials: bool,

    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub exposed_headers: Vec<String>,

    /// Seconds a preflight response may be cached
    #[serde(default)]
    pub max_age: i32,

    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub allowed_methods: Vec<String>,

    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub allowed_headers: Vec<String>,
}

impl CorsConfig {
    /// A config allowing `origin` with the given methods.
    pub fn allow(origin: impl Into<String>, methods: &[&str]) -> Self {
        Self {
            allowed_origins: vec![origin.into()],
            allowed_methods: methods.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Header lists compare as sets.
    pub fn equals(&self, other: &CorsConfig) -> bool {
        self.max_age == other.max_age
            && self.allow_credentials == other.allow_credentials
            && same_set(&self.allowed_origins, &other.allowed_origins)
            && same_set(&self.exposed_headers, &other.exposed_headers)
            && same_set(&self.allowed_methods, &other.allowed_methods)
            && same_set(&self.allowed_headers, &other.allowed_headers)
    }

    /// Allowed methods, upper-cased, as an `Access-Control-Allow-Methods`
    /// value.
    pub fn method_string(&self) -> String {
        self.allowed_methods.iter().map(|m| m.to_uppercase()).collect::<Vec<_>>().join(", ")
    }

    pub fn exposed_headers_string(&self) -> String {
        self.exposed_headers.join(", ")
    }

    pub fn allow_headers_string(&self) -> String {
        self.allowed_headers.join(", ")
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        if self.allowed_origins.is_empty() {
            errs.add("allowed_origins", "must have at least one element");
        } else if self.allowed_origins.len() > 1 {
            errs.add("allowed_origins", SINGLE_ORIGIN_ONLY);
            if self.allowed_origins.iter().any(|o| o == WILDCARD_ORIGIN) {
                errs.add("allowed_origins", "may not mix wildcard (*) with specific origins");
            }
        }

        if self.allowed_methods.is_empty() {
            errs.add("allowed_methods", "must have at least one element");
        }

        for method in &self.allowed_methods {
            if !CORS_METHODS.contains(method.as_str()) {
                errs.add("allowed_methods", format!("{} is not a valid method", method));
            }
        }

        if self.max_age < 0 {
            errs.add("max_age", "must be greater than or equal to 0");
        }

        errs.or_nil()
    }
}

impl PartialEq for CorsConfig {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}
