//! # Flowplane Model
//!
//! The validated configuration model of the Flowplane routing control plane:
//! the hierarchy of orgs, zones, proxies, domains, clusters, routes and
//! shared rules that the control plane distributes to its edge proxies.
//!
//! ## Architecture
//!
//! ```text
//! Org ─┬─ Zone ─┬─ Proxy / Listener ── Domain
//!      │        ├─ Cluster ── Instance
//!      │        └─ Route ── SharedRules ── Rule ── ClusterConstraint → Cluster
//!      └─ User ── AccessToken
//! ```
//!
//! Entities reference each other by key. Each one validates itself and
//! reports every problem it finds as an attribute path plus a message; whole
//! graphs are checked as a [`snapshot::ConfigSnapshot`].
//!
//! ## Example Usage
//!
//! ```rust
//! use flowplane_model::domain::{AllConstraints, ClusterConstraint, Route, Rule};
//!
//! let route = Route::new("r1", "z1", "d1", "/api", "sr1").with_rule(
//!     Rule::new("rk", AllConstraints::light(vec![ClusterConstraint::new("cc1", "ck1", 1)]))
//!         .with_method("GET"),
//! );
//! route.is_valid(false).expect("route is valid");
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod snapshot;
pub mod utils;
pub mod validation;

// Re-export commonly used types and traits
pub use config::{AppConfig, SnapshotConfig};
pub use domain::{KeyedEntity, ObjectType};
pub use errors::{Error, Result};
pub use observability::init_tracing;
pub use snapshot::{ClusterReferenceIndex, ConfigSnapshot, SnapshotDiff};
pub use validation::{ErrorCase, Validation, ValidationError};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "flowplane-model");
    }
}
