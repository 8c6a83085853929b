//! Domain layer
//!
//! The configuration graph of the routing control plane: every entity and
//! value object, its validation rules and its equality modes. Nothing here
//! performs I/O.
//!
//! ## Design Principles
//!
//! - **References by key**: a child holds the key of its parent or target,
//!   never the value, so the graph serializes as flat collections
//! - **Complete reports**: validation never stops at the first failure; each
//!   parent merges its children's reports under a dotted attribute path
//! - **Two equalities**: `equals` includes the checksum, `equivalent` ignores
//!   it so unchanged payloads can be recognized across writes
//!
//! ## Module Organization
//!
//! - `id`, `checksum`, `object_type`, `entity`: identifiers and the
//!   [`KeyedEntity`] abstraction over top-level entities
//! - `metadata`, `comparison`: building blocks shared by every entity
//! - `org`, `zone`, `user`, `access_token`: tenancy
//! - `proxy`, `listener`, `domains`: the serving side
//! - `cluster`, `instance` and the resilience settings: the upstream side
//! - `route`, `shared_rules`, `rule`, `matches`, `cluster_constraint`: routing
//! - `walk`: traversal of the constraint graph

pub mod access_token;
pub mod checksum;
pub mod circuit_breakers;
pub mod cluster;
pub mod cluster_constraint;
pub mod cohort_seed;
pub mod comparison;
pub mod cors;
pub mod domains;
pub mod entity;
pub mod health_check;
pub mod id;
pub mod instance;
pub mod listener;
pub mod matches;
pub mod metadata;
pub mod object_type;
pub mod org;
pub mod outlier_detection;
pub mod proxy;
pub mod redirect;
pub mod response_data;
pub mod retry_policy;
pub mod route;
pub mod rule;
pub mod shared_rules;
pub mod ssl;
pub mod tracing_config;
pub mod user;
pub mod walk;
pub mod zone;

// Re-export main types from each module
pub use access_token::AccessToken;
pub use checksum::Checksum;
pub use circuit_breakers::CircuitBreakers;
pub use cluster::{Cluster, Clusters};
pub use cluster_constraint::{AllConstraints, ClusterConstraint, ClusterConstraints, TrafficClass};
pub use cohort_seed::{CohortSeed, CohortSeedType};
pub use cors::CorsConfig;
pub use domains::{Domain, Domains};
pub use entity::KeyedEntity;
pub use health_check::{HealthCheck, HealthChecker, HealthChecks, HttpHealthCheck, TcpHealthCheck};
pub use id::{
    AccessTokenKey, ApiAuthKey, ClusterKey, ConstraintKey, DomainKey, ListenerKey, OrgKey, ProxyKey, RouteKey,
    RuleKey, SharedRulesKey, UserKey, ZoneKey,
};
pub use instance::{Instance, Instances};
pub use listener::{Listener, ListenerProtocol};
pub use matches::{Match, MatchKind, Matches};
pub use metadata::{Metadata, Metadatum};
pub use object_type::ObjectType;
pub use org::Org;
pub use outlier_detection::OutlierDetection;
pub use proxy::Proxy;
pub use redirect::{HeaderConstraint, HeaderConstraints, Redirect, RedirectType, Redirects};
pub use response_data::{CookieDatum, HeaderDatum, ResponseData, ResponseDatum, SameSite};
pub use retry_policy::RetryPolicy;
pub use route::{effective_cohort_seed, Route};
pub use rule::{Rule, Rules};
pub use shared_rules::SharedRules;
pub use ssl::{CertKeyPathPair, SslConfig};
pub use tracing_config::TracingConfig;
pub use user::User;
pub use zone::Zone;
