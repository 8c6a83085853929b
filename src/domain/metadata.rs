//! Key/value metadata
//!
//! [`Metadata`] is the generic tag list used across the graph: instance tags,
//! the instance-selection filter on a cluster constraint, opaque constraint
//! and shared-rules properties, and headers a health check adds to its
//! requests. Keys and values compare case-sensitively.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::comparison::{same_set, unordered_eq};
use crate::validation::{Validation, ValidationError, MUST_NOT_BE_EMPTY};
use regex::Regex;

/// A single key/value pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Metadatum {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl Metadatum {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    /// A datum carrying only a key.
    pub fn key_only(key: impl Into<String>) -> Self {
        Self { key: key.into(), value: String::new() }
    }

    pub fn equals(&self, other: &Metadatum) -> bool {
        self == other
    }
}

/// An unordered list of [`Metadatum`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Metadata(Vec<Metadatum>);

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(Option::<Vec<Metadatum>>::deserialize(deserializer)?.unwrap_or_default()))
    }
}

impl Metadata {
    pub fn new(items: Vec<Metadatum>) -> Self {
        Self(items)
    }

    /// Build metadata from key/value pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        pairs.into_iter().map(|(k, v)| Metadatum::new(k, v)).collect()
    }

    /// Build metadata from a map, in key order.
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self::from_pairs(map.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    /// Produce a key/value map. When a key repeats, the last value wins.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.0.iter().map(|m| (m.key.clone(), m.value.clone())).collect()
    }

    /// Value of the first datum with the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|m| m.key == key).map(|m| m.value.as_str())
    }

    pub fn push(&mut self, datum: Metadatum) {
        self.0.push(datum);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Metadatum> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Metadatum] {
        &self.0
    }

    /// Exact equality: the same data with the same multiplicity, in any order.
    pub fn equals(&self, other: &Metadata) -> bool {
        unordered_eq(&self.0, &other.0)
    }

    /// Semantic equality: the same set of key/value pairs, ignoring order and
    /// repeated entries.
    pub fn equivalent(&self, other: &Metadata) -> bool {
        same_set(&self.0, &other.0)
    }

    /// Total order over metadata: shorter lists sort first, then pairs are
    /// compared by key and value after sorting. Neither input is reordered.
    pub fn compare(&self, other: &Metadata) -> Ordering {
        self.len().cmp(&other.len()).then_with(|| self.sorted().cmp(&other.sorted()))
    }

    /// A copy sorted by key, then value.
    pub fn sorted(&self) -> Vec<Metadatum> {
        let mut items = self.0.clone();
        items.sort();
        items
    }
}

impl PartialEq for Metadata {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for Metadata {}

impl From<Vec<Metadatum>> for Metadata {
    fn from(items: Vec<Metadatum>) -> Self {
        Self(items)
    }
}

impl FromIterator<Metadatum> for Metadata {
    fn from_iter<I: IntoIterator<Item = Metadatum>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = &'a Metadatum;
    type IntoIter = std::slice::Iter<'a, Metadatum>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A check applied to each datum by [`metadata_valid`]. Attributes in the
/// returned report are relative to the datum (`key`, `value`).
pub type MetadataCheck<'a> = &'a dyn Fn(&Metadatum) -> Validation;

/// Validate every datum in `md` against `checks`, reporting duplicate keys
/// under `container` and per-datum failures under `container[key]`.
pub fn metadata_valid(container: &str, md: &Metadata, checks: &[MetadataCheck<'_>]) -> Validation {
    let mut errs = ValidationError::new();
    let mut seen = std::collections::HashSet::new();

    for datum in md {
        if !seen.insert(datum.key.as_str()) {
            errs.add(container, format!("duplicate {} key '{}'", container, datum.key));
        }

        let scope = format!("{}[{}]", container, datum.key);
        for check in checks {
            errs.merge_prefixed(check(datum), &scope);
        }
    }

    errs.or_nil()
}

/// Fails when the datum has an empty key.
pub fn check_non_empty_keys(datum: &Metadatum) -> Validation {
    if datum.key.is_empty() {
        return Err(ValidationError::single("key", MUST_NOT_BE_EMPTY));
    }
    Ok(())
}

/// Fails when the datum has an empty value.
pub fn check_non_empty_values(datum: &Metadatum) -> Validation {
    if datum.value.is_empty() {
        return Err(ValidationError::single("value", MUST_NOT_BE_EMPTY));
    }
    Ok(())
}

/// Build a check that fails with `msg` when the key does not match `pattern`.
pub fn check_keys_match_pattern<'a>(
    pattern: &'a Regex,
    msg: &'a str,
) -> impl Fn(&Metadatum) -> Validation + 'a {
    move |datum| {
        if pattern.is_match(&datum.key) {
            Ok(())
        } else {
            Err(ValidationError::single("key", msg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{ErrorCase, KEY_PATTERN};

    fn md(pairs: &[(&str, &str)]) -> Metadata {
        Metadata::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn equals_ignores_order() {
        let a = md(&[("a", "1"), ("b", "2")]);
        let b = md(&[("b", "2"), ("a", "1")]);
        assert!(a.equals(&b));
        assert!(b.equals(&a));
        assert_eq!(a, b);
    }

    #[test]
    fn map_conversion() {
        let m = md(&[("b", "2"), ("a", "1")]);
        let back = Metadata::from_map(&m.to_map());
        assert_eq!(back.as_slice()[0], Metadatum::new("a", "1"));
        assert!(back.equals(&m));
    }

    #[test]
    fn equals_is_case_sensitive() {
        assert!(!md(&[("Key", "v")]).equals(&md(&[("key", "v")])));
        assert!(!md(&[("key", "V")]).equals(&md(&[("key", "v")])));
    }

    #[test]
    fn equals_counts_duplicates() {
        let a = md(&[("a", "1"), ("a", "1")]);
        let b = md(&[("a", "1"), ("b", "2")]);
        assert!(!a.equals(&b));
        assert!(!b.equals(&a));
    }

    #[test]
    fn equivalent_ignores_repeats() {
        let a = md(&[("a", "1"), ("a", "1"), ("b", "2")]);
        let b = md(&[("b", "2"), ("a", "1")]);
        assert!(!a.equals(&b));
        assert!(a.equivalent(&b));
        assert!(b.equivalent(&a));
    }

    #[test]
    fn null_and_empty_are_equal() {
        let from_null: Metadata = serde_json::from_str("null").unwrap();
        assert!(from_null.equals(&Metadata::default()));
    }

    #[test]
    fn compare_does_not_reorder_inputs() {
        let a = md(&[("b", "1"), ("a", "1")]);
        let b = md(&[("a", "1"), ("b", "2")]);
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&a), Ordering::Greater);
        assert_eq!(a.as_slice()[0].key, "b");
        assert_eq!(md(&[("x", "1")]).compare(&a), Ordering::Less);
        assert_eq!(a.compare(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn map_round_trip() {
        let m = md(&[("a", "1"), ("b", "2")]);
        let map = m.to_map();
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
        assert_eq!(Metadata::from_pairs(map).len(), 2);
        assert_eq!(m.get("b"), Some("2"));
        assert_eq!(m.get("c"), None);
    }

    #[test]
    fn valid_reports_duplicates_and_checks() {
        let m = md(&[("key", "value"), ("key", "value"), ("", "v"), ("k2", "")]);
        let err = metadata_valid(
            "metadata",
            &m,
            &[&check_non_empty_keys, &check_non_empty_values],
        )
        .unwrap_err();

        assert_eq!(
            err.errors,
            vec![
                ErrorCase::new("metadata", "duplicate metadata key 'key'"),
                ErrorCase::new("metadata[].key", MUST_NOT_BE_EMPTY),
                ErrorCase::new("metadata[k2].value", MUST_NOT_BE_EMPTY),
            ]
        );
    }

    #[test]
    fn valid_passes_clean_metadata() {
        let m = md(&[("a", "1"), ("b", "2")]);
        assert!(metadata_valid("metadata", &m, &[&check_non_empty_keys]).is_ok());
        assert!(metadata_valid("metadata", &Metadata::default(), &[]).is_ok());
    }

    #[test]
    fn pattern_check() {
        let check = check_keys_match_pattern(&KEY_PATTERN, "bad key");
        let m = md(&[("ok-key", "1"), ("not ok", "2")]);
        let err = metadata_valid("tags", &m, &[&check]).unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("tags[not ok].key", "bad key")]);
    }
}
