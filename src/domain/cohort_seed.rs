//! Sticky cohort assignment.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::{Validation, ValidationError};

/// Where the cohort seed is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CohortSeedType {
    #[default]
    Header,
    Cookie,
    Query,
}

impl fmt::Display for CohortSeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Cookie => f.write_str("cookie"),
            Self::Query => f.write_str("query"),
        }
    }
}

/// Names the request attribute that groups requests into a cohort. Members
/// of a cohort are sent to the same subset of instances every time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CohortSeed {
    #[serde(rename = "type", default)]
    pub seed_type: CohortSeedType,

    /// Header, cookie or query parameter holding the seed
    #[serde(default)]
    pub name: String,

    /// When set, requests without a seed value all share the cohort of the
    /// empty seed instead of being balanced randomly
    #[serde(default)]
    pub use_zero_value_seed: bool,
}

impl CohortSeed {
    pub fn new(seed_type: CohortSeedType, name: impl Into<String>) -> Self {
        Self { seed_type, name: name.into(), use_zero_value_seed: false }
    }

    pub fn equals(&self, other: &CohortSeed) -> bool {
        self == other
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();
        if self.name.trim().is_empty() {
            errs.add("name", "may not be empty");
        }
        errs.or_nil()
    }
}
