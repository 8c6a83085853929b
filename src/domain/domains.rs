//! Domains: the host names under which routes are served.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::checksum::Checksum;
use crate::domain::comparison::{option_eq_by, unordered_eq, unordered_eq_by};
use crate::domain::cors::CorsConfig;
use crate::domain::entity::keyed_entity;
use crate::domain::id::{DomainKey, OrgKey, ZoneKey};
use crate::domain::object_type::ObjectType;
use crate::domain::redirect::Redirects;
use crate::domain::ssl::SslConfig;
use crate::domain::KeyedEntity;
use crate::validation::{
    check_entity_key, check_index, check_key, check_pattern, Validation, ValidationError,
    DOMAIN_ALIAS_PATTERN,
};

/// A host name and port served by the proxies of a zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Domain {
    #[serde(default)]
    pub domain_key: DomainKey,

    #[serde(default)]
    pub zone_key: ZoneKey,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub ssl_config: Option<SslConfig>,

    /// URL rewrites, applied in order
    #[serde(default)]
    pub redirects: Redirects,

    #[serde(default)]
    pub gzip_enabled: bool,

    #[serde(default)]
    pub cors_config: Option<CorsConfig>,

    /// Additional names answered by this domain: exact, `*.`-prefixed or
    /// `.*`-suffixed
    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub aliases: Vec<String>,

    #[serde(skip)]
    pub org_key: OrgKey,

    #[serde(default)]
    pub checksum: Checksum,
}

impl Domain {
    pub fn new(
        domain_key: impl Into<DomainKey>,
        zone_key: impl Into<ZoneKey>,
        name: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            domain_key: domain_key.into(),
            zone_key: zone_key.into(),
            name: name.into(),
            port,
            ..Default::default()
        }
    }

    /// Terminate TLS with the given settings
    pub fn with_ssl(mut self, ssl_config: SslConfig) -> Self {
        self.ssl_config = Some(ssl_config);
        self
    }

    /// Answer cross-origin preflight requests
    pub fn with_cors(mut self, cors_config: CorsConfig) -> Self {
        self.cors_config = Some(cors_config);
        self
    }

    /// Answer an additional name
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Same payload, ignoring both the domain key and the checksum. Aliases
    /// compare as an unordered collection; redirects in order.
    pub fn equivalent(&self, other: &Domain) -> bool {
        self.zone_key == other.zone_key
            && self.name == other.name
            && self.port == other.port
            && self.org_key == other.org_key
            && self.gzip_enabled == other.gzip_enabled
            && self.redirects.equals(&other.redirects)
            && option_eq_by(self.ssl_config.as_ref(), other.ssl_config.as_ref(), SslConfig::equals)
            && option_eq_by(self.cors_config.as_ref(), other.cors_config.as_ref(), CorsConfig::equals)
            && unordered_eq(&self.aliases, &other.aliases)
    }

    pub fn equals(&self, other: &Domain) -> bool {
        self.domain_key == other.domain_key
            && self.checksum == other.checksum
            && self.equivalent(other)
    }

    pub fn validate_fields(&self, precreation: bool) -> Validation {
        let mut errs = ValidationError::new();

        check_entity_key(self.domain_key.as_str(), precreation, &mut errs, "domain_key");
        check_key(self.zone_key.as_str(), &mut errs, "zone_key");
        check_index(&self.name, &mut errs, "name");

        if self.port == 0 {
            errs.add("port", "must be non-zero");
        }

        errs.merge(self.redirects.is_valid());

        if let Some(ssl) = &self.ssl_config {
            errs.merge_prefixed(ssl.is_valid(), "ssl_config");
        }

        if let Some(cors) = &self.cors_config {
            errs.merge_prefixed(cors.is_valid(), "cors_config");
        }

        errs.merge(aliases_valid(&self.aliases));

        errs.or_nil()
    }

    /// Checks scoped under `domain`.
    pub fn is_valid(&self, precreation: bool) -> Validation {
        KeyedEntity::is_valid(self, precreation)
    }
}

impl PartialEq for Domain {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

keyed_entity!(Domain, ObjectType::Domain, domain_key, zone: zone_key);

fn aliases_valid(aliases: &[String]) -> Validation {
    let mut errs = ValidationError::new();
    let mut seen = HashSet::new();

    for alias in aliases {
        let scope = format!("aliases[{}]", alias);

        if !seen.insert(alias.as_str()) {
            errs.add("aliases", format!("duplicate alias '{}'", alias));
        }

        check_pattern(false, alias, &mut errs, &DOMAIN_ALIAS_PATTERN, &scope);

        if alias.starts_with("*.") && alias.ends_with(".*") {
            errs.add(scope, "may not have both a prefix and a suffix wildcard");
        }
    }

    errs.or_nil()
}

/// A list of domains, unique by key.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Domains(Vec<Domain>);

impl<'de> Deserialize<'de> for Domains {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(crate::utils::null_as_default(deserializer)?))
    }
}

impl Domains {
    pub fn new(items: Vec<Domain>) -> Self {
        Self(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Domain> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Domain> {
        self.0.iter_mut()
    }

    /// Equal when every domain has an exactly equal counterpart, in any
    /// order.
    pub fn equals(&self, other: &Domains) -> bool {
        unordered_eq_by(&self.0, &other.0, Domain::equals)
    }

    /// Reports repeated keys under `domain_key` and each domain's failures
    /// under `domains[key]`.
    pub fn is_valid(&self, precreation: bool) -> Validation {
        let mut errs = ValidationError::new();
        let mut seen = HashSet::new();

        for d in &self.0 {
            if !seen.insert(d.domain_key.as_str()) {
                errs.add("domain_key", format!("multiple instances of key {}", d.domain_key));
            }
            errs.merge_prefixed(d.validate_fields(precreation), &format!("domains[{}]", d.domain_key));
        }

        errs.or_nil()
    }
}

impl From<Vec<Domain>> for Domains {
    fn from(items: Vec<Domain>) -> Self {
        Self(items)
    }
}

impl FromIterator<Domain> for Domains {
    fn from_iter<I: IntoIterator<Item = Domain>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Domains {
    type Item = &'a Domain;
    type IntoIter = std::slice::Iter<'a, Domain>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
