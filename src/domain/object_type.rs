//! Stable identifiers for the top-level entity types.
//!
//! Ids are persisted alongside change records and must never be renumbered;
//! new types get the next free id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Org,
    User,
    Zone,
    Proxy,
    Domain,
    Route,
    Cluster,
    SharedRules,
    AccessToken,
    Listener,
}

/// Returned when a name or id does not identify an object type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized object type: {0}")]
pub struct UnrecognizedObjectType(pub String);

const ALL: [ObjectType; 10] = [
    ObjectType::Org,
    ObjectType::User,
    ObjectType::Zone,
    ObjectType::Proxy,
    ObjectType::Domain,
    ObjectType::Route,
    ObjectType::Cluster,
    ObjectType::SharedRules,
    ObjectType::AccessToken,
    ObjectType::Listener,
];

impl ObjectType {
    /// Every object type, ordered by id.
    pub fn all() -> &'static [ObjectType] {
        &ALL
    }

    /// Names of every object type, ordered by id.
    pub fn all_names() -> Vec<&'static str> {
        ALL.iter().map(|ot| ot.name()).collect()
    }

    pub fn id(self) -> i64 {
        match self {
            Self::Org => 1,
            Self::User => 2,
            Self::Zone => 3,
            Self::Proxy => 4,
            Self::Domain => 5,
            Self::Route => 6,
            Self::Cluster => 7,
            Self::SharedRules => 8,
            Self::AccessToken => 9,
            Self::Listener => 10,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Org => "org",
            Self::User => "user",
            Self::Zone => "zone",
            Self::Proxy => "proxy",
            Self::Domain => "domain",
            Self::Route => "route",
            Self::Cluster => "cluster",
            Self::SharedRules => "shared_rules",
            Self::AccessToken => "access_token",
            Self::Listener => "listener",
        }
    }

    /// Look up a type by name, ignoring case.
    pub fn from_name(name: &str) -> Result<Self, UnrecognizedObjectType> {
        let lower = name.to_lowercase();
        ALL.iter()
            .copied()
            .find(|ot| ot.name() == lower)
            .ok_or_else(|| UnrecognizedObjectType(name.to_string()))
    }

    pub fn from_id(id: i64) -> Result<Self, UnrecognizedObjectType> {
        ALL.iter().copied().find(|ot| ot.id() == id).ok_or_else(|| UnrecognizedObjectType(id.to_string()))
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObjectType {
    type Err = UnrecognizedObjectType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
