//! Whole-graph snapshots
//!
//! A [`ConfigSnapshot`] holds the complete configuration of one org as flat
//! collections, the way a distribution pipeline ships it. Beyond the
//! per-entity rules it checks what only the whole graph can show: duplicate
//! keys within a collection and references to entities that are missing.

pub mod diff;
pub mod index;

pub use diff::{EntityDiff, SnapshotDiff};
pub use index::{ClusterReference, ClusterReferenceIndex, ReferenceSource};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::config::SnapshotConfig;
use crate::domain::walk::{walk_constraints_from_route, walk_constraints_from_shared_rules};
use crate::domain::{
    AccessToken, ClusterConstraint, Clusters, Domains, KeyedEntity, Listener, ObjectType, Org, OrgKey, Proxy,
    Route, Rule, SharedRules, TrafficClass, User, Zone,
};
use crate::errors::{Error, Result};
use crate::utils::truncate_for_log;
use crate::validation::{join_path, Validation, ValidationError};

/// Longest rendering of a report included in a single log event.
const LOGGED_MESSAGE_CHARS: usize = 512;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub org: Org,

    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub zones: Vec<Zone>,

    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub users: Vec<User>,

    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub access_tokens: Vec<AccessToken>,

    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub proxies: Vec<Proxy>,

    #[serde(default)]
    pub domains: Domains,

    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub listeners: Vec<Listener>,

    #[serde(default)]
    pub clusters: Clusters,

    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub routes: Vec<Route>,

    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub shared_rules: Vec<SharedRules>,
}

impl ConfigSnapshot {
    pub fn new(org: Org) -> Self {
        Self { org, ..Default::default() }
    }

    /// Parse a JSON snapshot and stamp the org key onto every entity.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let mut snapshot: ConfigSnapshot =
            serde_json::from_str(s).map_err(|e| Error::from(e).context("parsing JSON snapshot"))?;
        snapshot.stamp_org_key();
        Ok(snapshot)
    }

    /// Parse a YAML snapshot and stamp the org key onto every entity.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let mut snapshot: ConfigSnapshot =
            serde_yaml::from_str(s).map_err(|e| Error::from(e).context("parsing YAML snapshot"))?;
        snapshot.stamp_org_key();
        Ok(snapshot)
    }

    /// Read a snapshot file; the format follows the extension (`.json`,
    /// `.yaml` or `.yml`).
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::from(e).context(format!("reading {}", path.display())))?;

        let snapshot = match extension.as_deref() {
            Some("json") => Self::from_json_str(&contents),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            _ => {
                return Err(Error::config(format!(
                    "Unsupported snapshot format for {}: expected .json, .yaml or .yml",
                    path.display()
                )))
            }
        }?;

        tracing::debug!(
            path = %path.display(),
            org = %snapshot.org.org_key,
            entities = snapshot.entity_count(),
            "Loaded configuration snapshot"
        );

        Ok(snapshot)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Org keys are not part of the wire form of most entities; give every
    /// entity the key of the snapshot's org. Users carry their own org key
    /// and keep it when set.
    pub fn stamp_org_key(&mut self) {
        let org_key = self.org.org_key.clone();
        self.zones.iter_mut().for_each(|e| e.org_key = org_key.clone());
        self.users
            .iter_mut()
            .filter(|e| e.org_key.is_empty())
            .for_each(|e| e.org_key = org_key.clone());
        self.access_tokens.iter_mut().for_each(|e| e.org_key = org_key.clone());
        self.proxies.iter_mut().for_each(|e| e.org_key = org_key.clone());
        self.listeners.iter_mut().for_each(|e| e.org_key = org_key.clone());
        self.routes.iter_mut().for_each(|e| e.org_key = org_key.clone());
        self.shared_rules.iter_mut().for_each(|e| e.org_key = org_key.clone());
        self.domains.iter_mut().for_each(|e| e.org_key = org_key.clone());
        self.clusters.iter_mut().for_each(|e| e.org_key = org_key.clone());
    }

    /// Number of entities, the org included.
    pub fn entity_count(&self) -> usize {
        1 + self.zones.len()
            + self.users.len()
            + self.access_tokens.len()
            + self.proxies.len()
            + self.domains.len()
            + self.listeners.len()
            + self.clusters.len()
            + self.routes.len()
            + self.shared_rules.len()
    }

    pub fn zone(&self, key: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.zone_key == key)
    }

    pub fn route(&self, key: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.route_key == key)
    }

    pub fn shared_rules_for(&self, route: &Route) -> Option<&SharedRules> {
        self.shared_rules.iter().find(|sr| sr.shared_rules_key == route.shared_rules_key)
    }

    /// Validate with the default [`SnapshotConfig`].
    pub fn is_valid(&self) -> Validation {
        self.is_valid_with(&SnapshotConfig::default())
    }

    /// Validate every entity under `<collection>[<key>]`, report duplicate
    /// keys per collection and, if configured, dangling references.
    pub fn is_valid_with(&self, config: &SnapshotConfig) -> Validation {
        let precreation = config.allow_unassigned_keys;
        let mut errs = ValidationError::new();

        errs.merge_prefixed(self.org.validate_fields(precreation), "org");

        let org_key = &self.org.org_key;
        errs.merge(collection_valid("zones", &self.zones, org_key, precreation));
        errs.merge(collection_valid("users", &self.users, org_key, precreation));
        errs.merge(collection_valid("access_tokens", &self.access_tokens, org_key, precreation));
        errs.merge(collection_valid("proxies", &self.proxies, org_key, precreation));
        errs.merge(collection_valid("domains", &self.domains, org_key, precreation));
        errs.merge(collection_valid("listeners", &self.listeners, org_key, precreation));
        errs.merge(collection_valid("clusters", &self.clusters, org_key, precreation));
        errs.merge(collection_valid("routes", &self.routes, org_key, precreation));
        errs.merge(collection_valid("shared_rules", &self.shared_rules, org_key, precreation));

        if config.check_references {
            errs.merge(self.references_valid());
        }

        let result = errs.or_nil();
        if let Err(report) = &result {
            tracing::debug!(
                org = %self.org.org_key,
                errors = report.len(),
                report = %truncate_for_log(&report.message(), LOGGED_MESSAGE_CHARS),
                "Configuration snapshot failed validation"
            );
            for case in report.iter().take(config.max_logged_errors) {
                tracing::debug!(attribute = %case.attribute, msg = %case.msg, "Snapshot validation error");
            }
        }
        result
    }

    /// Report keys that name entities missing from the snapshot.
    pub fn references_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        let zones: HashSet<&str> = self.zones.iter().map(|z| z.zone_key.as_str()).collect();
        let users: HashSet<&str> = self.users.iter().map(|u| u.user_key.as_str()).collect();
        let domains: HashSet<&str> = self.domains.iter().map(|d| d.domain_key.as_str()).collect();
        let clusters: HashSet<&str> = self.clusters.iter().map(|c| c.cluster_key.as_str()).collect();
        let shared_rules: HashSet<&str> =
            self.shared_rules.iter().map(|sr| sr.shared_rules_key.as_str()).collect();

        zone_refs_valid("proxies", &self.proxies, &zones, &mut errs);
        zone_refs_valid("domains", &self.domains, &zones, &mut errs);
        zone_refs_valid("listeners", &self.listeners, &zones, &mut errs);
        zone_refs_valid("clusters", &self.clusters, &zones, &mut errs);
        zone_refs_valid("routes", &self.routes, &zones, &mut errs);
        zone_refs_valid("shared_rules", &self.shared_rules, &zones, &mut errs);

        for token in &self.access_tokens {
            if !users.contains(token.user_key.as_str()) {
                errs.add(
                    format!("access_tokens[{}].user_key", token.access_token_key),
                    format!("unknown user '{}'", token.user_key),
                );
            }
        }

        for proxy in &self.proxies {
            domain_refs_valid(&format!("proxies[{}]", proxy.proxy_key), &proxy.domain_keys, &domains, &mut errs);
        }
        for listener in &self.listeners {
            domain_refs_valid(
                &format!("listeners[{}]", listener.listener_key),
                &listener.domain_keys,
                &domains,
                &mut errs,
            );
        }

        for route in &self.routes {
            let scope = format!("routes[{}]", route.route_key);
            if !domains.contains(route.domain_key.as_str()) {
                errs.add(join_path(&scope, "domain_key"), format!("unknown domain '{}'", route.domain_key));
            }
            if !shared_rules.contains(route.shared_rules_key.as_str()) {
                errs.add(
                    join_path(&scope, "shared_rules_key"),
                    format!("unknown shared rules '{}'", route.shared_rules_key),
                );
            }
            walk_constraints_from_route(route, |cc, rule, class| {
                cluster_ref_valid(&scope, cc, rule, class, &clusters, &mut errs)
            });
        }

        for sr in &self.shared_rules {
            let scope = format!("shared_rules[{}]", sr.shared_rules_key);
            walk_constraints_from_shared_rules(sr, |cc, rule, class| {
                cluster_ref_valid(&scope, cc, rule, class, &clusters, &mut errs)
            });
        }

        errs.or_nil()
    }

    /// Keys of every entity of the given type, in collection order.
    pub fn keys(&self, object_type: ObjectType) -> Vec<&str> {
        fn keys_of<'a, T: KeyedEntity + 'a>(items: impl IntoIterator<Item = &'a T>) -> Vec<&'a str> {
            items.into_iter().map(|e| e.key()).collect()
        }

        match object_type {
            ObjectType::Org => vec![self.org.org_key.as_str()],
            ObjectType::Zone => keys_of(&self.zones),
            ObjectType::User => keys_of(&self.users),
            ObjectType::AccessToken => keys_of(&self.access_tokens),
            ObjectType::Proxy => keys_of(&self.proxies),
            ObjectType::Domain => keys_of(&self.domains),
            ObjectType::Listener => keys_of(&self.listeners),
            ObjectType::Cluster => keys_of(&self.clusters),
            ObjectType::Route => keys_of(&self.routes),
            ObjectType::SharedRules => keys_of(&self.shared_rules),
        }
    }
}

/// Validate each entity of a collection under `name[key]` and report keys
/// that repeat within it, plus entities belonging to another org.
fn collection_valid<'a, T, I>(name: &str, items: I, org_key: &OrgKey, precreation: bool) -> Validation
where
    T: KeyedEntity + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut errs = ValidationError::new();
    let mut seen = HashSet::new();

    for item in items {
        let key = item.key();
        if !key.is_empty() && !seen.insert(key) {
            errs.add(name, format!("multiple instances of key {}", key));
        }

        let scope = format!("{}[{}]", name, key);
        let result = item.validate_fields(precreation);
        tracing::trace!(
            object_type = T::OBJECT_TYPE.name(),
            key = key,
            valid = result.is_ok(),
            "Checked snapshot entity"
        );
        errs.merge_prefixed(result, &scope);

        let owner = item.org_key();
        if !owner.is_empty() && owner != org_key {
            errs.add(
                join_path(&scope, "org_key"),
                format!("belongs to org '{}', not '{}'", owner, org_key),
            );
        }
    }

    errs.or_nil()
}

fn zone_refs_valid<'a, T, I>(name: &str, items: I, zones: &HashSet<&str>, errs: &mut ValidationError)
where
    T: KeyedEntity + 'a,
    I: IntoIterator<Item = &'a T>,
{
    for item in items {
        if let Some(zone_key) = item.zone_key() {
            if !zones.contains(zone_key.as_str()) {
                errs.add(format!("{}[{}].zone_key", name, item.key()), format!("unknown zone '{}'", zone_key));
            }
        }
    }
}

fn domain_refs_valid(
    scope: &str,
    domain_keys: &[crate::domain::DomainKey],
    domains: &HashSet<&str>,
    errs: &mut ValidationError,
) {
    for key in domain_keys {
        if !domains.contains(key.as_str()) {
            errs.add(format!("{}.domain_keys[{}]", scope, key), format!("unknown domain '{}'", key));
        }
    }
}

fn cluster_ref_valid(
    scope: &str,
    cc: &ClusterConstraint,
    rule: Option<&Rule>,
    class: TrafficClass,
    clusters: &HashSet<&str>,
    errs: &mut ValidationError,
) {
    if clusters.contains(cc.cluster_key.as_str()) {
        return;
    }
    let container = match rule {
        Some(rule) => format!("{}.rules[{}].constraints", scope, rule.rule_key),
        None => format!("{}.default", scope),
    };
    errs.add(
        format!("{}.{}[{}].cluster_key", container, class, cc.constraint_key),
        format!("unknown cluster '{}'", cc.cluster_key),
    );
}
