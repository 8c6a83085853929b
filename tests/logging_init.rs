//! Global subscriber installation
//!
//! Kept in its own test binary: installing a global subscriber would clash
//! with the per-test subscribers of `tracing-test` in the library's tests.

use flowplane_model::config::ObservabilityConfig;
use flowplane_model::init_tracing;

#[test]
fn test_init_tracing_is_idempotent() {
    let config = ObservabilityConfig::default();
    assert_eq!(init_tracing(&config).ok(), Some(true));
    assert_eq!(init_tracing(&config).ok(), Some(false));
}
