//! Route domain types
//!
//! A [`Route`] maps requests for a path on a domain to instances. It
//! inherits its default constraints and a first set of rules from the
//! [`SharedRules`] it names; its own rules are tried before the shared ones.
//! When no rule applies, the shared default constraints are used.
//!
//! A cohort seed may be set on shared rules, a route or a rule. Only one
//! applies to a given request, the most specific one: see
//! [`effective_cohort_seed`].

use serde::{Deserialize, Serialize};

use crate::domain::checksum::Checksum;
use crate::domain::cohort_seed::CohortSeed;
use crate::domain::comparison::option_eq_by;
use crate::domain::entity::keyed_entity;
use crate::domain::id::{DomainKey, OrgKey, RouteKey, SharedRulesKey, ZoneKey};
use crate::domain::object_type::ObjectType;
use crate::domain::response_data::ResponseData;
use crate::domain::retry_policy::RetryPolicy;
use crate::domain::rule::{Rule, Rules};
use crate::domain::shared_rules::SharedRules;
use crate::domain::KeyedEntity;
use crate::validation::{check_entity_key, check_key, check_not_empty, Validation, ValidationError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Route {
    /// Route key (assigned on create)
    #[serde(default)]
    pub route_key: RouteKey,

    #[serde(default)]
    pub domain_key: DomainKey,

    #[serde(default)]
    pub zone_key: ZoneKey,

    /// Request path prefix served by this route
    #[serde(default)]
    pub path: String,

    /// Shared rules supplying the default constraints
    #[serde(default)]
    pub shared_rules_key: SharedRulesKey,

    /// Route-specific rules, tried in order before the shared rules
    #[serde(default)]
    pub rules: Rules,

    #[serde(default)]
    pub response_data: ResponseData,

    #[serde(default)]
    pub cohort_seed: Option<CohortSeed>,

    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,

    #[serde(skip)]
    pub org_key: OrgKey,

    #[serde(default)]
    pub checksum: Checksum,
}

impl Route {
    pub fn new(
        route_key: impl Into<RouteKey>,
        zone_key: impl Into<ZoneKey>,
        domain_key: impl Into<DomainKey>,
        path: impl Into<String>,
        shared_rules_key: impl Into<SharedRulesKey>,
    ) -> Self {
        Self {
            route_key: route_key.into(),
            zone_key: zone_key.into(),
            domain_key: domain_key.into(),
            path: path.into(),
            shared_rules_key: shared_rules_key.into(),
            ..Default::default()
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_response_data(mut self, response_data: ResponseData) -> Self {
        self.response_data = response_data;
        self
    }

    pub fn with_cohort_seed(mut self, seed: CohortSeed) -> Self {
        self.cohort_seed = Some(seed);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// True when every field holds its default value.
    pub fn is_nil(&self) -> bool {
        self.equals(&Route::default())
    }

    pub fn equivalent(&self, other: &Route) -> bool {
        self.route_key == other.route_key
            && self.domain_key == other.domain_key
            && self.zone_key == other.zone_key
            && self.path == other.path
            && self.org_key == other.org_key
            && self.shared_rules_key == other.shared_rules_key
            && self.response_data.equals(&other.response_data)
            && option_eq_by(self.cohort_seed.as_ref(), other.cohort_seed.as_ref(), CohortSeed::equals)
            && option_eq_by(self.retry_policy.as_ref(), other.retry_policy.as_ref(), RetryPolicy::equals)
            && self.rules.equals(&other.rules)
    }

    pub fn equals(&self, other: &Route) -> bool {
        self.equivalent(other) && self.checksum == other.checksum
    }

    pub fn validate_fields(&self, precreation: bool) -> Validation {
        let mut errs = ValidationError::new();

        check_entity_key(self.route_key.as_str(), precreation, &mut errs, "route_key");
        check_key(self.shared_rules_key.as_str(), &mut errs, "shared_rules_key");
        check_key(self.domain_key.as_str(), &mut errs, "domain_key");
        check_key(self.zone_key.as_str(), &mut errs, "zone_key");
        check_not_empty(&self.path, &mut errs, "path");

        errs.merge(self.rules.is_valid());
        errs.merge_prefixed(self.response_data.is_valid(), "response_data");

        if let Some(seed) = &self.cohort_seed {
            errs.merge_prefixed(seed.is_valid(), "cohort_seed");
        }
        if let Some(policy) = &self.retry_policy {
            errs.merge_prefixed(policy.is_valid(), "retry_policy");
        }

        errs.or_nil()
    }

    /// Checks scoped under `route`.
    pub fn is_valid(&self, precreation: bool) -> Validation {
        KeyedEntity::is_valid(self, precreation)
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

keyed_entity!(Route, ObjectType::Route, route_key, zone: zone_key);

/// The cohort seed applying to a request routed through `route` and,
/// if one applied, `rule`. A rule's seed wins wherever the rule came from,
/// then the route's, then the seed of the route's shared rules.
pub fn effective_cohort_seed<'a>(
    rule: Option<&'a Rule>,
    route: &'a Route,
    shared_rules: Option<&'a SharedRules>,
) -> Option<&'a CohortSeed> {
    rule.and_then(|r| r.cohort_seed.as_ref())
        .or(route.cohort_seed.as_ref())
        .or_else(|| shared_rules.and_then(|sr| sr.cohort_seed.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cluster_constraint::{AllConstraints, ClusterConstraint};
    use crate::domain::cohort_seed::CohortSeedType;
    use crate::domain::response_data::HeaderDatum;
    use crate::validation::{ErrorCase, MUST_NOT_BE_EMPTY};

    fn route() -> Route {
        Route::new("r1", "z1", "d1", "/api", "sr1")
    }

    fn rule(key: &str) -> Rule {
        Rule::new(key, AllConstraints::light(vec![ClusterConstraint::new("cc1", "ck1", 1)])).with_method("GET")
    }

    #[test]
    fn minimal_route_is_valid() {
        assert!(route().is_valid(false).is_ok());
    }

    #[test]
    fn precreation_allows_missing_key() {
        let r = Route::new("", "z1", "d1", "/api", "sr1");
        assert!(r.is_valid(true).is_ok());
        let err = r.is_valid(false).unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("route.route_key", MUST_NOT_BE_EMPTY)]);
    }

    #[test]
    fn every_violation_reported() {
        let r = Route::new("r1", "", "", "", "")
            .with_retry_policy(RetryPolicy::new(-1, 0, 0))
            .with_cohort_seed(CohortSeed::new(CohortSeedType::Header, ""));
        let err = r.is_valid(false).unwrap_err();
        let attrs: Vec<_> = err.iter().map(|e| e.attribute.as_str()).collect();
        assert_eq!(
            attrs,
            vec![
                "route.shared_rules_key",
                "route.domain_key",
                "route.zone_key",
                "route.path",
                "route.cohort_seed.name",
                "route.retry_policy.num_retries",
            ]
        );
    }

    #[test]
    fn rule_errors_are_scoped() {
        let mut bad = rule("rk0");
        bad.constraints.light = vec![ClusterConstraint::new("cc1", "ck1", 0)].into();
        let r = route().with_rule(bad).with_response_data(
            ResponseData::default().with_header(HeaderDatum::new("X-A", "")),
        );
        let err = r.is_valid(false).unwrap_err();
        assert_eq!(
            err.errors,
            vec![
                ErrorCase::new("route.rules[rk0].constraints.light[cc1].weight", "must be greater than 0"),
                ErrorCase::new("route.response_data.headers[X-A].value", "may not be empty"),
            ]
        );
    }

    #[test]
    fn rule_order_matters() {
        let a = route().with_rule(rule("a")).with_rule(rule("b"));
        let b = route().with_rule(rule("b")).with_rule(rule("a"));
        assert!(!a.equals(&b));
        assert!(!b.equals(&a));
    }

    #[test]
    fn optional_settings_affect_equality() {
        let a = route();
        let b = route().with_retry_policy(RetryPolicy::default());
        assert!(!a.equals(&b));
        let c = route().with_cohort_seed(CohortSeed::new(CohortSeedType::Cookie, "c"));
        assert!(!a.equals(&c));
        assert!(Route::default().is_nil());
        assert!(!a.is_nil());
    }

    #[test]
    fn null_rules_equal_missing() {
        let a: Route = serde_json::from_str(
            r#"{"route_key":"r1","zone_key":"z1","domain_key":"d1","path":"/api","shared_rules_key":"sr1","rules":null}"#,
        )
        .unwrap();
        assert!(a.equals(&route()));
    }

    #[test]
    fn cohort_seed_precedence() {
        let shared = SharedRules::new("sr1", "z1", "shared", AllConstraints::default())
            .with_cohort_seed(CohortSeed::new(CohortSeedType::Header, "shared"));
        let plain = route();
        let seeded = route().with_cohort_seed(CohortSeed::new(CohortSeedType::Header, "route"));
        let seeded_rule = rule("rk").with_cohort_seed(CohortSeed::new(CohortSeedType::Header, "rule"));
        let name = |s: Option<&CohortSeed>| s.map(|s| s.name.clone());

        assert_eq!(name(effective_cohort_seed(None, &plain, None)), None);
        assert_eq!(name(effective_cohort_seed(None, &plain, Some(&shared))), Some("shared".into()));
        assert_eq!(name(effective_cohort_seed(None, &seeded, Some(&shared))), Some("route".into()));
        assert_eq!(
            name(effective_cohort_seed(Some(&seeded_rule), &seeded, Some(&shared))),
            Some("rule".into())
        );
        assert_eq!(
            name(effective_cohort_seed(Some(&rule("rk")), &seeded, Some(&shared))),
            Some("route".into())
        );
    }
}
