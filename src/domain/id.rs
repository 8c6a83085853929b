//! Domain key types with the NewType pattern
//!
//! Every entity in the configuration graph refers to its owner and its
//! targets by key. Wrapping each kind of key in its own type keeps a
//! `ClusterKey` from being handed where a `DomainKey` is expected. Keys are
//! assigned by the persistence layer, so unlike generated IDs an empty key is
//! a legal (unassigned) value here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate NewType key wrappers with all required traits
macro_rules! entity_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a key from anything string-like
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert to inner string value
            pub fn into_string(self) -> String {
                self.0
            }

            /// True if no key has been assigned
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(key: $name) -> Self {
                key.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

entity_key!(
    /// Key of an organization, the root of tenancy
    OrgKey
);

entity_key!(
    /// Key of a zone
    ZoneKey
);

entity_key!(
    /// Key of a user
    UserKey
);

entity_key!(
    /// Credential a user presents to the API
    ApiAuthKey
);

entity_key!(
    /// Key of a personal access token
    AccessTokenKey
);

entity_key!(
    /// Key of a proxy
    ProxyKey
);

entity_key!(
    /// Key of a domain
    DomainKey
);

entity_key!(
    /// Key of a listener
    ListenerKey
);

entity_key!(
    /// Key of a cluster
    ClusterKey
);

entity_key!(
    /// Key of a route
    RouteKey
);

entity_key!(
    /// Key of a shared rules object
    SharedRulesKey
);

entity_key!(
    /// Key of a rule, unique within its rule list
    RuleKey
);

entity_key!(
    /// Key of a cluster constraint, unique within its constraint list
    ConstraintKey
);
