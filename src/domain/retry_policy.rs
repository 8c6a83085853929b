//! Request retry limits.

use serde::{Deserialize, Serialize};

use crate::validation::{Validation, ValidationError};

/// How often a request is retried and how long attempts may take.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; 0 means no retries
    #[serde(default)]
    pub num_retries: i32,

    /// Time limit for a single attempt
    #[serde(default)]
    pub per_try_timeout_msec: i32,

    /// Time limit for all attempts together
    #[serde(default)]
    pub timeout_msec: i32,
}

impl RetryPolicy {
    pub fn new(num_retries: i32, per_try_timeout_msec: i32, timeout_msec: i32) -> Self {
        Self { num_retries, per_try_timeout_msec, timeout_msec }
    }

    pub fn equals(&self, other: &RetryPolicy) -> bool {
        self == other
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();
        for (attr, value) in [
            ("num_retries", self.num_retries),
            ("per_try_timeout_msec", self.per_try_timeout_msec),
            ("timeout_msec", self.timeout_msec),
        ] {
            if value < 0 {
                errs.add(attr, "must not be negative");
            }
        }
        errs.or_nil()
    }
}
