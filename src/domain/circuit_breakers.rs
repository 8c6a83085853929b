//! Circuit breaker limits for a cluster.

use serde::{Deserialize, Serialize};

use crate::validation::{check_non_negative, Validation, ValidationError};

/// Limits protecting a cluster against sudden surges in traffic. An unset
/// limit falls back to the proxy's default; zero is a real limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CircuitBreakers {
    /// Maximum connections to all instances of the cluster (proxy default 1024)
    #[serde(default)]
    pub max_connections: Option<i32>,

    /// Maximum requests queued waiting for a connection (proxy default 1024)
    #[serde(default)]
    pub max_pending_requests: Option<i32>,

    /// Maximum outstanding retries (proxy default 3)
    #[serde(default)]
    pub max_retries: Option<i32>,

    /// Maximum outstanding requests, HTTP/2 only (proxy default 1024)
    #[serde(default)]
    pub max_requests: Option<i32>,
}

impl CircuitBreakers {
    pub fn equals(&self, other: &CircuitBreakers) -> bool {
        self == other
    }

    /// Every limit that is set must be non-negative.
    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();
        check_non_negative(self.max_connections, &mut errs, "max_connections");
        check_non_negative(self.max_pending_requests, &mut errs, "max_pending_requests");
        check_non_negative(self.max_retries, &mut errs, "max_retries");
        check_non_negative(self.max_requests, &mut errs, "max_requests");
        errs.or_nil()
    }
}
