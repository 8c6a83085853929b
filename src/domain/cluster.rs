//! Cluster domain types
//!
//! A [`Cluster`] is a named pool of [`Instance`]s within a zone, together
//! with the resilience settings the proxy applies when talking to it.
//! Cluster constraints refer to clusters by key.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::domain::checksum::Checksum;
use crate::domain::circuit_breakers::CircuitBreakers;
use crate::domain::comparison::option_eq_by;
use crate::domain::entity::keyed_entity;
use crate::domain::health_check::HealthChecks;
use crate::domain::id::{ClusterKey, OrgKey, ZoneKey};
use crate::domain::instance::{Instance, Instances};
use crate::domain::object_type::ObjectType;
use crate::domain::outlier_detection::OutlierDetection;
use crate::domain::KeyedEntity;
use crate::validation::{check_entity_key, check_index, check_key, Validation, ValidationError};

/// Upstream service definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster key (assigned on create)
    #[serde(default)]
    pub cluster_key: ClusterKey,

    #[serde(default)]
    pub zone_key: ZoneKey,

    #[serde(default)]
    pub name: String,

    /// Connect to instances over TLS
    #[serde(default)]
    pub require_tls: bool,

    /// Instances providing this service; order is not significant
    #[serde(default)]
    pub instances: Instances,

    #[serde(default)]
    pub circuit_breakers: Option<CircuitBreakers>,

    #[serde(default)]
    pub outlier_detection: Option<OutlierDetection>,

    #[serde(default)]
    pub health_checks: HealthChecks,

    #[serde(skip)]
    pub org_key: OrgKey,

    #[serde(default)]
    pub checksum: Checksum,
}

impl Cluster {
    /// Create a cluster with no instances
    pub fn new(cluster_key: impl Into<ClusterKey>, zone_key: impl Into<ZoneKey>, name: impl Into<String>) -> Self {
        Self {
            cluster_key: cluster_key.into(),
            zone_key: zone_key.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an instance
    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.instances.push(instance);
        self
    }

    /// Set circuit breakers
    pub fn with_circuit_breakers(mut self, circuit_breakers: CircuitBreakers) -> Self {
        self.circuit_breakers = Some(circuit_breakers);
        self
    }

    /// Set outlier detection
    pub fn with_outlier_detection(mut self, outlier_detection: OutlierDetection) -> Self {
        self.outlier_detection = Some(outlier_detection);
        self
    }

    /// Set health checks
    pub fn with_health_checks(mut self, health_checks: HealthChecks) -> Self {
        self.health_checks = health_checks;
        self
    }

    pub fn equivalent(&self, other: &Cluster) -> bool {
        self.cluster_key == other.cluster_key
            && self.zone_key == other.zone_key
            && self.name == other.name
            && self.org_key == other.org_key
            && self.require_tls == other.require_tls
            && self.instances.equals(&other.instances)
            && option_eq_by(
                self.circuit_breakers.as_ref(),
                other.circuit_breakers.as_ref(),
                CircuitBreakers::equals,
            )
            && option_eq_by(
                self.outlier_detection.as_ref(),
                other.outlier_detection.as_ref(),
                OutlierDetection::equals,
            )
            && self.health_checks.equals(&other.health_checks)
    }

    pub fn equals(&self, other: &Cluster) -> bool {
        self.equivalent(other) && self.checksum == other.checksum
    }

    pub fn validate_fields(&self, precreation: bool) -> Validation {
        let mut errs = ValidationError::new();

        check_entity_key(self.cluster_key.as_str(), precreation, &mut errs, "cluster_key");
        check_key(self.zone_key.as_str(), &mut errs, "zone_key");
        check_index(&self.name, &mut errs, "name");

        errs.merge(self.instances.is_valid());

        if let Some(cb) = &self.circuit_breakers {
            errs.merge_prefixed(cb.is_valid(), "circuit_breakers");
        }

        if let Some(od) = &self.outlier_detection {
            errs.merge_prefixed(od.is_valid(), "outlier_detection");
        }

        errs.merge(self.health_checks.is_valid());

        errs.or_nil()
    }

    /// Checks scoped under `cluster`.
    pub fn is_valid(&self, precreation: bool) -> Validation {
        KeyedEntity::is_valid(self, precreation)
    }
}

impl PartialEq for Cluster {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

keyed_entity!(Cluster, ObjectType::Cluster, cluster_key, zone: zone_key);

/// A list of clusters.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Clusters(Vec<Cluster>);

impl<'de> Deserialize<'de> for Clusters {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(crate::utils::null_as_default(deserializer)?))
    }
}

impl Clusters {
    pub fn new(items: Vec<Cluster>) -> Self {
        Self(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cluster> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Cluster> {
        self.0.iter_mut()
    }

    pub fn get(&self, key: &ClusterKey) -> Option<&Cluster> {
        self.0.iter().find(|c| &c.cluster_key == key)
    }

    /// Partition the clusters by the value `f` computes for each, keeping
    /// list order within each group.
    pub fn group_by<K, F>(&self, f: F) -> BTreeMap<K, Clusters>
    where
        K: Ord,
        F: Fn(&Cluster) -> K,
    {
        let mut groups: BTreeMap<K, Clusters> = BTreeMap::new();
        for cluster in &self.0 {
            groups.entry(f(cluster)).or_default().0.push(cluster.clone());
        }
        groups
    }

    pub fn sort_by_key(&mut self) {
        self.0.sort_by(|a, b| a.cluster_key.cmp(&b.cluster_key));
    }

    pub fn sort_by_name(&mut self) {
        self.0.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Reports repeated keys under `cluster_key` and each cluster's failures
    /// under `clusters[key]`.
    pub fn is_valid(&self, precreation: bool) -> Validation {
        let mut errs = ValidationError::new();
        let mut seen = HashSet::new();

        for c in &self.0 {
            if !seen.insert(c.cluster_key.as_str()) {
                errs.add("cluster_key", format!("multiple instances of key {}", c.cluster_key));
            }
            errs.merge_prefixed(c.validate_fields(precreation), &format!("clusters[{}]", c.cluster_key));
        }

        errs.or_nil()
    }
}

impl From<Vec<Cluster>> for Clusters {
    fn from(items: Vec<Cluster>) -> Self {
        Self(items)
    }
}

impl FromIterator<Cluster> for Clusters {
    fn from_iter<I: IntoIterator<Item = Cluster>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Clusters {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
