//! Listeners: ports a proxy accepts traffic on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::domain::checksum::Checksum;
use crate::domain::comparison::{option_eq_by, unordered_eq};
use crate::domain::entity::keyed_entity;
use crate::domain::id::{DomainKey, ListenerKey, OrgKey, ZoneKey};
use crate::domain::object_type::ObjectType;
use crate::domain::proxy::domain_keys_valid;
use crate::domain::tracing_config::TracingConfig;
use crate::domain::KeyedEntity;
use crate::validation::{check_entity_key, check_index, check_key, Validation, ValidationError};

/// Protocol spoken on a listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerProtocol {
    #[default]
    Http,
    Http2,
    HttpAuto,
    Tcp,
}

/// Returned when parsing an unknown protocol name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ListenerProtocol: {0}")]
pub struct UnknownListenerProtocol(pub String);

impl ListenerProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Http2 => "http2",
            Self::HttpAuto => "http_auto",
            Self::Tcp => "tcp",
        }
    }

    /// True for the protocols that carry HTTP requests and so route by
    /// domain.
    pub fn is_http(self) -> bool {
        !matches!(self, Self::Tcp)
    }
}

impl FromStr for ListenerProtocol {
    type Err = UnknownListenerProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "http2" => Ok(Self::Http2),
            "http_auto" => Ok(Self::HttpAuto),
            "tcp" => Ok(Self::Tcp),
            other => Err(UnknownListenerProtocol(other.to_string())),
        }
    }
}

impl fmt::Display for ListenerProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Listener {
    #[serde(default)]
    pub listener_key: ListenerKey,

    #[serde(default)]
    pub zone_key: ZoneKey,

    #[serde(default)]
    pub name: String,

    /// Address to bind
    #[serde(default)]
    pub ip: String,

    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub protocol: ListenerProtocol,

    /// Domains served on this listener; order is not significant
    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub domain_keys: Vec<DomainKey>,

    #[serde(default)]
    pub tracing_config: Option<TracingConfig>,

    #[serde(skip)]
    pub org_key: OrgKey,

    #[serde(default)]
    pub checksum: Checksum,
}

impl Listener {
    pub fn new(
        listener_key: impl Into<ListenerKey>,
        zone_key: impl Into<ZoneKey>,
        name: impl Into<String>,
        ip: impl Into<String>,
        port: u16,
        protocol: ListenerProtocol,
    ) -> Self {
        Self {
            listener_key: listener_key.into(),
            zone_key: zone_key.into(),
            name: name.into(),
            ip: ip.into(),
            port,
            protocol,
            ..Default::default()
        }
    }

    /// Serve an additional domain
    pub fn with_domain(mut self, domain_key: impl Into<DomainKey>) -> Self {
        self.domain_keys.push(domain_key.into());
        self
    }

    pub fn with_tracing(mut self, tracing_config: TracingConfig) -> Self {
        self.tracing_config = Some(tracing_config);
        self
    }

    pub fn equivalent(&self, other: &Listener) -> bool {
        self.listener_key == other.listener_key
            && self.zone_key == other.zone_key
            && self.name == other.name
            && self.ip == other.ip
            && self.port == other.port
            && self.protocol == other.protocol
            && self.org_key == other.org_key
            && unordered_eq(&self.domain_keys, &other.domain_keys)
            && option_eq_by(
                self.tracing_config.as_ref(),
                other.tracing_config.as_ref(),
                TracingConfig::equals,
            )
    }

    pub fn equals(&self, other: &Listener) -> bool {
        self.equivalent(other) && self.checksum == other.checksum
    }

    pub fn validate_fields(&self, precreation: bool) -> Validation {
        let mut errs = ValidationError::new();

        check_entity_key(self.listener_key.as_str(), precreation, &mut errs, "listener_key");
        check_key(self.zone_key.as_str(), &mut errs, "zone_key");
        check_index(&self.name, &mut errs, "name");
        check_key(self.org_key.as_str(), &mut errs, "org_key");
        errs.merge(domain_keys_valid(&self.domain_keys));

        if self.ip.is_empty() {
            errs.add("ip", "must be specified");
        } else if self.ip.parse::<IpAddr>().is_err() {
            errs.add("ip", format!("{} is not a valid ip", self.ip));
        }

        if self.port == 0 {
            errs.add("port", "must be positive");
        }

        if let Some(tc) = &self.tracing_config {
            errs.merge_prefixed(tc.is_valid(), "tracing_config");
        }

        errs.or_nil()
    }

    /// Checks scoped under `listener`.
    pub fn is_valid(&self, precreation: bool) -> Validation {
        KeyedEntity::is_valid(self, precreation)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

keyed_entity!(Listener, ObjectType::Listener, listener_key, zone: zone_key);
