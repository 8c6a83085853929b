//! Weighted cluster targets
//!
//! A [`ClusterConstraint`] selects the instances of one cluster whose
//! metadata is a superset of the constraint's metadata. Its weight biases
//! selection among the constraints of a list. [`AllConstraints`] groups the
//! three traffic classes:
//!
//! - `light` receives the live request and answers the caller; never empty
//! - `dark` receives a fire-and-forget copy
//! - `tap` receives a copy whose response is compared with the live one

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::domain::comparison::unordered_eq_by;
use crate::domain::id::{ClusterKey, ConstraintKey};
use crate::domain::metadata::{check_non_empty_keys, check_non_empty_values, metadata_valid, Metadata};
use crate::domain::response_data::ResponseData;
use crate::validation::{check_key, join_path, Validation, ValidationError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConstraint {
    #[serde(default)]
    pub constraint_key: ConstraintKey,

    /// Cluster whose instances this constraint selects from
    #[serde(default)]
    pub cluster_key: ClusterKey,

    /// Instance-selection filter; every pair must be present on an instance
    #[serde(default)]
    pub metadata: Metadata,

    /// Opaque tags passed along with the selected instance
    #[serde(default)]
    pub properties: Metadata,

    #[serde(default)]
    pub response_data: ResponseData,

    /// Relative selection weight; must be positive
    #[serde(default)]
    pub weight: u32,
}

impl ClusterConstraint {
    pub fn new(constraint_key: impl Into<ConstraintKey>, cluster_key: impl Into<ClusterKey>, weight: u32) -> Self {
        Self {
            constraint_key: constraint_key.into(),
            cluster_key: cluster_key.into(),
            weight,
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_properties(mut self, properties: Metadata) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_response_data(mut self, response_data: ResponseData) -> Self {
        self.response_data = response_data;
        self
    }

    pub fn equals(&self, other: &ClusterConstraint) -> bool {
        self.constraint_key == other.constraint_key
            && self.cluster_key == other.cluster_key
            && self.weight == other.weight
            && self.metadata.equals(&other.metadata)
            && self.properties.equals(&other.properties)
            && self.response_data.equals(&other.response_data)
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        check_key(self.constraint_key.as_str(), &mut errs, "constraint_key");
        check_key(self.cluster_key.as_str(), &mut errs, "cluster_key");

        if self.weight == 0 {
            errs.add("weight", "must be greater than 0");
        }

        errs.merge(constraint_metadata_valid(&self.metadata));
        errs.merge(constraint_properties_valid(&self.properties));
        errs.merge_prefixed(self.response_data.is_valid(), "response_data");

        errs.or_nil()
    }
}

impl PartialEq for ClusterConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// Constraint metadata needs both a key and a value on every pair.
pub fn constraint_metadata_valid(md: &Metadata) -> Validation {
    metadata_valid("metadata", md, &[&check_non_empty_keys, &check_non_empty_values])
}

/// Properties only need keys.
pub fn constraint_properties_valid(md: &Metadata) -> Validation {
    metadata_valid("properties", md, &[&check_non_empty_keys])
}

/// A weighted list of constraints. Order is not significant.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ClusterConstraints(Vec<ClusterConstraint>);

impl<'de> Deserialize<'de> for ClusterConstraints {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(crate::utils::null_as_default(deserializer)?))
    }
}

impl ClusterConstraints {
    pub fn new(items: Vec<ClusterConstraint>) -> Self {
        Self(items)
    }

    pub fn push(&mut self, cc: ClusterConstraint) {
        self.0.push(cc);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClusterConstraint> {
        self.0.iter()
    }

    /// Sum of the weights in the list.
    pub fn total_weight(&self) -> u64 {
        self.0.iter().map(|cc| u64::from(cc.weight)).sum()
    }

    pub fn as_map(&self) -> HashMap<ConstraintKey, ClusterConstraint> {
        self.0.iter().map(|cc| (cc.constraint_key.clone(), cc.clone())).collect()
    }

    pub fn equals(&self, other: &ClusterConstraints) -> bool {
        unordered_eq_by(&self.0, &other.0, ClusterConstraint::equals)
    }

    /// Reports repeated keys under `container.constraint_key` and each
    /// constraint's failures under `container[key]`.
    pub fn is_valid(&self, container: &str) -> Validation {
        let mut errs = ValidationError::new();
        let mut seen = HashSet::new();

        for cc in &self.0 {
            if !seen.insert(cc.constraint_key.as_str()) {
                errs.add(
                    join_path(container, "constraint_key"),
                    format!("multiple instances of key {}", cc.constraint_key),
                );
            }
            errs.merge_prefixed(cc.is_valid(), &format!("{}[{}]", container, cc.constraint_key));
        }

        errs.or_nil()
    }
}

impl PartialEq for ClusterConstraints {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<Vec<ClusterConstraint>> for ClusterConstraints {
    fn from(items: Vec<ClusterConstraint>) -> Self {
        Self(items)
    }
}

impl FromIterator<ClusterConstraint> for ClusterConstraints {
    fn from_iter<I: IntoIterator<Item = ClusterConstraint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ClusterConstraints {
    type Item = &'a ClusterConstraint;
    type IntoIter = std::slice::Iter<'a, ClusterConstraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Traffic class of a constraint list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficClass {
    Light,
    Dark,
    Tap,
}

impl TrafficClass {
    /// Visiting order used by the graph walkers.
    pub const ALL: [TrafficClass; 3] = [TrafficClass::Light, TrafficClass::Dark, TrafficClass::Tap];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Tap => "tap",
        }
    }
}

impl fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllConstraints {
    #[serde(default)]
    pub light: ClusterConstraints,

    #[serde(default)]
    pub dark: ClusterConstraints,

    #[serde(default)]
    pub tap: ClusterConstraints,
}

impl AllConstraints {
    /// Only live traffic, no shadow copies
    pub fn light(constraints: impl Into<ClusterConstraints>) -> Self {
        Self { light: constraints.into(), ..Default::default() }
    }

    pub fn with_dark(mut self, constraints: impl Into<ClusterConstraints>) -> Self {
        self.dark = constraints.into();
        self
    }

    pub fn with_tap(mut self, constraints: impl Into<ClusterConstraints>) -> Self {
        self.tap = constraints.into();
        self
    }

    pub fn get(&self, class: TrafficClass) -> &ClusterConstraints {
        match class {
            TrafficClass::Light => &self.light,
            TrafficClass::Dark => &self.dark,
            TrafficClass::Tap => &self.tap,
        }
    }

    pub fn equals(&self, other: &AllConstraints) -> bool {
        self.light.equals(&other.light) && self.dark.equals(&other.dark) && self.tap.equals(&other.tap)
    }

    /// Reports an empty light list under `container` and each list's
    /// failures under `container.light`, `container.dark` and `container.tap`.
    pub fn is_valid(&self, container: &str) -> Validation {
        let mut errs = ValidationError::new();

        if self.light.is_empty() {
            errs.add(container, "must have at least one light constraint");
        }

        for class in TrafficClass::ALL {
            errs.merge(self.get(class).is_valid(&join_path(container, class.as_str())));
        }

        errs.or_nil()
    }
}

impl PartialEq for AllConstraints {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{ErrorCase, MUST_NOT_BE_EMPTY};

    fn cc(key: &str, cluster: &str) -> ClusterConstraint {
        ClusterConstraint::new(key, cluster, 100)
            .with_metadata(Metadata::from_pairs([("stage", "prod")]))
    }

    #[test]
    fn valid_constraint() {
        assert!(cc("cc1", "ck1").is_valid().is_ok());
    }

    #[test]
    fn weight_must_be_positive() {
        let mut c = cc("cc1", "ck1");
        c.weight = 0;
        let err = c.is_valid().unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("weight", "must be greater than 0")]);
    }

    #[test]
    fn metadata_needs_values_properties_do_not() {
        let c = ClusterConstraint::new("cc1", "ck1", 1)
            .with_metadata(Metadata::from_pairs([("stage", "")]))
            .with_properties(Metadata::from_pairs([("flag", ""), ("", "x")]));
        let err = c.is_valid().unwrap_err();
        assert_eq!(
            err.errors,
            vec![
                ErrorCase::new("metadata[stage].value", MUST_NOT_BE_EMPTY),
                ErrorCase::new("properties[].key", MUST_NOT_BE_EMPTY),
            ]
        );
    }

    #[test]
    fn duplicate_constraint_keys() {
        let list = ClusterConstraints::from(vec![cc("cckey1", "ck1"), cc("cckey1", "ck2")]);
        let err = list.is_valid("").unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("constraint_key", "multiple instances of key cckey1")]);

        let err = list.is_valid("light").unwrap_err();
        assert_eq!(err.errors[0].attribute, "light.constraint_key");
    }

    #[test]
    fn light_required() {
        let all = AllConstraints::default().with_dark(vec![cc("cc1", "ck1")]);
        let err = all.is_valid("constraints").unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("constraints", "must have at least one light constraint")]);
    }

    #[test]
    fn zero_weight_fails_in_any_class() {
        let mut bad = cc("bad", "ck1");
        bad.weight = 0;
        let ok = vec![cc("cc1", "ck1")];

        for all in [
            AllConstraints::light(vec![bad.clone()]),
            AllConstraints::light(ok.clone()).with_dark(vec![bad.clone()]),
            AllConstraints::light(ok.clone()).with_tap(vec![bad.clone()]),
        ] {
            let err = all.is_valid("default").unwrap_err();
            assert_eq!(err.len(), 1);
            assert!(err.errors[0].attribute.ends_with("[bad].weight"), "{}", err);
        }
    }

    #[test]
    fn list_equality_ignores_order() {
        let a = ClusterConstraints::from(vec![cc("a", "ck1"), cc("b", "ck2")]);
        let b = ClusterConstraints::from(vec![cc("b", "ck2"), cc("a", "ck1")]);
        assert!(a.equals(&b));
        assert!(b.equals(&a));
        assert!(!a.equals(&ClusterConstraints::from(vec![cc("a", "ck1")])));
    }

    #[test]
    fn equality_covers_metadata_and_response_data() {
        let a = cc("a", "ck1");
        let b = cc("a", "ck1").with_metadata(Metadata::from_pairs([("stage", "dev")]));
        assert!(!a.equals(&b));

        let c = cc("a", "ck1").with_response_data(ResponseData::default().with_header(
            crate::domain::response_data::HeaderDatum::new("X-Stage", "stage"),
        ));
        assert!(!a.equals(&c));
    }

    #[test]
    fn nil_lists_deserialize_empty() {
        let all: AllConstraints = serde_json::from_str(r#"{"light":null,"dark":[]}"#).unwrap();
        assert!(all.equals(&AllConstraints::default()));
    }

    #[test]
    fn weights_and_map() {
        let list = ClusterConstraints::from(vec![cc("a", "ck1"), ClusterConstraint::new("b", "ck2", 5)]);
        assert_eq!(list.total_weight(), 105);
        assert_eq!(list.as_map()[&ConstraintKey::new("b")].cluster_key, ClusterKey::new("ck2"));
    }
}
