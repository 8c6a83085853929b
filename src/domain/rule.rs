//! Routing rules
//!
//! A [`Rule`] applies to a request when the request method is one of the
//! rule's methods and every match applies. The constraints inferred from
//! the matches are merged into each of the rule's cluster constraints to
//! find a live instance.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::domain::cluster_constraint::AllConstraints;
use crate::domain::cohort_seed::CohortSeed;
use crate::domain::comparison::{option_eq_by, ordered_eq_by, unordered_eq};
use crate::domain::id::RuleKey;
use crate::domain::matches::{Match, Matches};
use crate::validation::{check_key, Validation, ValidationError};

lazy_static! {
    /// HTTP methods a rule may select on.
    pub static ref RULE_METHODS: HashSet<&'static str> =
        ["GET", "PUT", "POST", "DELETE"].into_iter().collect();
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub rule_key: RuleKey,

    /// Methods the rule applies to; order is not significant
    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub methods: Vec<String>,

    #[serde(default)]
    pub matches: Matches,

    #[serde(default)]
    pub constraints: AllConstraints,

    /// Overrides the cohort seed of the enclosing route or shared rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_seed: Option<CohortSeed>,
}

impl Rule {
    pub fn new(rule_key: impl Into<RuleKey>, constraints: AllConstraints) -> Self {
        Self { rule_key: rule_key.into(), constraints, ..Default::default() }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.methods.push(method.into());
        self
    }

    pub fn with_match(mut self, m: Match) -> Self {
        self.matches.push(m);
        self
    }

    pub fn with_cohort_seed(mut self, seed: CohortSeed) -> Self {
        self.cohort_seed = Some(seed);
        self
    }

    pub fn equals(&self, other: &Rule) -> bool {
        self.rule_key == other.rule_key
            && unordered_eq(&self.methods, &other.methods)
            && self.constraints.equals(&other.constraints)
            && self.matches.equals(&other.matches)
            && option_eq_by(self.cohort_seed.as_ref(), other.cohort_seed.as_ref(), CohortSeed::equals)
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        check_key(self.rule_key.as_str(), &mut errs, "rule_key");

        for method in &self.methods {
            if !RULE_METHODS.contains(method.as_str()) {
                errs.add("methods", format!("{} is not a valid method", method));
            }
        }

        if self.methods.is_empty() && self.matches.is_empty() {
            errs.add("", "at least one method or match must be present");
        }

        errs.merge(self.matches.is_valid());
        errs.merge(self.constraints.is_valid("constraints"));

        if let Some(seed) = &self.cohort_seed {
            errs.merge_prefixed(seed.is_valid(), "cohort_seed");
        }

        errs.or_nil()
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// Rules in evaluation order; the first applicable rule wins, so order is
/// significant.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Rules(Vec<Rule>);

impl<'de> Deserialize<'de> for Rules {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(crate::utils::null_as_default(deserializer)?))
    }
}

impl Rules {
    pub fn new(items: Vec<Rule>) -> Self {
        Self(items)
    }

    pub fn push(&mut self, rule: Rule) {
        self.0.push(rule);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }

    pub fn get(&self, key: &RuleKey) -> Option<&Rule> {
        self.0.iter().find(|r| &r.rule_key == key)
    }

    pub fn as_map(&self) -> HashMap<RuleKey, Rule> {
        self.0.iter().map(|r| (r.rule_key.clone(), r.clone())).collect()
    }

    /// Positional equality.
    pub fn equals(&self, other: &Rules) -> bool {
        ordered_eq_by(&self.0, &other.0, Rule::equals)
    }

    /// Reports repeated keys under `rules` and each rule's failures under
    /// `rules[key]`.
    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();
        let mut seen = HashSet::new();

        for rule in &self.0 {
            if !seen.insert(rule.rule_key.as_str()) {
                errs.add("rules", format!("multiple instances of key {}", rule.rule_key));
            }
            errs.merge_prefixed(rule.is_valid(), &format!("rules[{}]", rule.rule_key));
        }

        errs.or_nil()
    }
}

impl PartialEq for Rules {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<Vec<Rule>> for Rules {
    fn from(items: Vec<Rule>) -> Self {
        Self(items)
    }
}

impl FromIterator<Rule> for Rules {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Rules {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cluster_constraint::ClusterConstraint;
    use crate::domain::cohort_seed::CohortSeedType;
    use crate::domain::metadata::Metadatum;
    use crate::validation::ErrorCase;

    fn constraints() -> AllConstraints {
        AllConstraints::light(vec![ClusterConstraint::new("cc1", "ck1", 1)])
    }

    fn rule(key: &str) -> Rule {
        Rule::new(key, constraints()).with_method("GET").with_method("POST")
    }

    #[test]
    fn valid_rule() {
        assert!(rule("rk0").is_valid().is_ok());
        let match_only = Rule::new("rk1", constraints())
            .with_match(Match::header(Metadatum::key_only("X-Foo"), Metadatum::default()));
        assert!(match_only.is_valid().is_ok());
    }

    #[test]
    fn method_or_match_required() {
        let err = Rule::new("rk0", constraints()).is_valid().unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("", "at least one method or match must be present")]);
    }

    #[test]
    fn unknown_methods() {
        let err = rule("rk0").with_method("PATCH").is_valid().unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("methods", "PATCH is not a valid method")]);
    }

    #[test]
    fn nested_errors() {
        let r = Rule::new("rk0", AllConstraints::default())
            .with_match(Match::header(Metadatum::default(), Metadatum::default()))
            .with_cohort_seed(CohortSeed::new(CohortSeedType::Header, ""));
        let err = r.is_valid().unwrap_err();
        let attrs: Vec<_> = err.iter().map(|e| e.attribute.as_str()).collect();
        assert_eq!(attrs, vec!["matches[header:].from.key", "constraints", "cohort_seed.name"]);
    }

    #[test]
    fn methods_compare_as_set() {
        let a = rule("rk0");
        let b = Rule::new("rk0", constraints()).with_method("POST").with_method("GET");
        assert!(a.equals(&b));
        assert!(!a.equals(&rule("rk1")));
    }

    #[test]
    fn rules_compare_positionally() {
        let a = Rules::from(vec![rule("a"), rule("b")]);
        let b = Rules::from(vec![rule("b"), rule("a")]);
        assert!(!a.equals(&b));
        assert!(a.equals(&a.clone()));
        let nil: Rules = serde_json::from_str("null").unwrap();
        assert!(nil.equals(&Rules::default()));
    }

    #[test]
    fn duplicate_rule_keys() {
        let rules = Rules::from(vec![rule("rk0"), rule("rk0")]);
        let err = rules.is_valid().unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("rules", "multiple instances of key rk0")]);

        let rules = Rules::from(vec![Rule::new("rk1", constraints())]);
        let err = rules.is_valid().unwrap_err();
        assert_eq!(err.errors[0].attribute, "rules[rk1]");
    }

    #[test]
    fn lookup() {
        let rules = Rules::from(vec![rule("a"), rule("b")]);
        assert!(rules.get(&RuleKey::new("b")).is_some());
        assert_eq!(rules.as_map().len(), 2);
    }
}
