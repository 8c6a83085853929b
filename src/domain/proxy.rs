//! Proxies: the data plane processes a zone's configuration is served to.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::checksum::Checksum;
use crate::domain::comparison::unordered_eq;
use crate::domain::entity::keyed_entity;
use crate::domain::id::{DomainKey, OrgKey, ProxyKey, ZoneKey};
use crate::domain::instance::Instance;
use crate::domain::metadata::Metadata;
use crate::domain::object_type::ObjectType;
use crate::domain::KeyedEntity;
use crate::validation::{check_entity_key, check_index, check_key, Validation, ValidationError};

/// A proxy serving a set of domains. The proxy's own address is an
/// [`Instance`] stored alongside its other fields on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Proxy {
    #[serde(default)]
    pub proxy_key: ProxyKey,

    #[serde(default)]
    pub zone_key: ZoneKey,

    #[serde(default)]
    pub name: String,

    /// Domains served by this proxy; order is not significant
    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub domain_keys: Vec<DomainKey>,

    /// Where the proxy runs
    #[serde(flatten)]
    pub instance: Instance,

    #[serde(skip)]
    pub org_key: OrgKey,

    #[serde(default)]
    pub checksum: Checksum,
}

impl Proxy {
    pub fn new(proxy_key: impl Into<ProxyKey>, zone_key: impl Into<ZoneKey>, name: impl Into<String>) -> Self {
        Self {
            proxy_key: proxy_key.into(),
            zone_key: zone_key.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Serve an additional domain
    pub fn with_domain(mut self, domain_key: impl Into<DomainKey>) -> Self {
        self.domain_keys.push(domain_key.into());
        self
    }

    /// Bind the proxy to an address
    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.instance = instance;
        self
    }

    pub fn host(&self) -> &str {
        &self.instance.host
    }

    pub fn port(&self) -> u16 {
        self.instance.port
    }

    pub fn metadata(&self) -> &Metadata {
        &self.instance.metadata
    }

    /// Domain keys compare as an unordered collection.
    pub fn equivalent(&self, other: &Proxy) -> bool {
        self.proxy_key == other.proxy_key
            && self.zone_key == other.zone_key
            && self.name == other.name
            && self.org_key == other.org_key
            && self.instance.equals(&other.instance)
            && unordered_eq(&self.domain_keys, &other.domain_keys)
    }

    pub fn equals(&self, other: &Proxy) -> bool {
        self.equivalent(other) && self.checksum == other.checksum
    }

    /// A proxy not yet bound to an address skips the instance checks.
    pub fn validate_fields(&self, precreation: bool) -> Validation {
        let mut errs = ValidationError::new();

        check_entity_key(self.proxy_key.as_str(), precreation, &mut errs, "proxy_key");
        check_key(self.zone_key.as_str(), &mut errs, "zone_key");
        check_index(&self.name, &mut errs, "name");
        errs.merge(domain_keys_valid(&self.domain_keys));

        if !self.instance.is_nil() {
            errs.merge(self.instance.is_valid());
        }

        errs.or_nil()
    }

    /// Checks scoped under `proxy`.
    pub fn is_valid(&self, precreation: bool) -> Validation {
        KeyedEntity::is_valid(self, precreation)
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

keyed_entity!(Proxy, ObjectType::Proxy, proxy_key, zone: zone_key);

/// Domain key lists on proxies and listeners: every key well formed, none
/// repeated.
pub(crate) fn domain_keys_valid(domain_keys: &[DomainKey]) -> Validation {
    let mut errs = ValidationError::new();
    let mut seen = HashSet::new();

    for dk in domain_keys {
        if !seen.insert(dk.as_str()) {
            errs.add("domain_keys", format!("duplicate domain key '{}'", dk));
        }
        check_key(dk.as_str(), &mut errs, &format!("domain_keys[{}]", dk));
    }

    errs.or_nil()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ErrorCase;

    fn proxy() -> Proxy {
        Proxy::new("p1", "z1", "edge").with_domain("d1").with_domain("d2")
    }

    #[test]
    fn valid_without_address() {
        assert!(proxy().is_valid(false).is_ok());
    }

    #[test]
    fn address_checked_when_set() {
        let p = proxy().with_instance(Instance::new("10.0.0.1", 0));
        let err = p.is_valid(false).unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("proxy.port", "must be non-zero")]);
    }

    #[test]
    fn duplicate_domains() {
        let p = proxy().with_domain("d1");
        let err = p.is_valid(false).unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("proxy.domain_keys", "duplicate domain key 'd1'")]);
    }

    #[test]
    fn domain_order_is_ignored() {
        let a = Proxy::new("p1", "z1", "edge").with_domain("d1").with_domain("d2");
        let b = Proxy::new("p1", "z1", "edge").with_domain("d2").with_domain("d1");
        assert!(a.equals(&b));
        assert!(b.equals(&a));
    }

    #[test]
    fn instance_is_flattened() {
        let p = proxy().with_instance(Instance::new("edge.local", 8080));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["host"], "edge.local");
        assert_eq!(json["port"], 8080);

        let back: Proxy = serde_json::from_value(json).unwrap();
        assert_eq!(back.host(), "edge.local");
        assert_eq!(back.port(), 8080);
        assert!(back.metadata().is_empty());
    }

    #[test]
    fn null_domain_keys_equal_empty() {
        let from_null: Proxy =
            serde_json::from_str(r#"{"proxy_key":"p1","zone_key":"z1","name":"edge","domain_keys":null}"#)
                .unwrap();
        assert!(from_null.equals(&Proxy::new("p1", "z1", "edge")));
    }
}
