//! Read-only traversal of the constraint graph
//!
//! Visit order is part of the contract: default constraints before rules,
//! rules in list order, and within each [`AllConstraints`] light, then dark,
//! then tap. Index builders rely on first-seen order.

use crate::domain::cluster_constraint::{AllConstraints, ClusterConstraint, ClusterConstraints, TrafficClass};
use crate::domain::id::ClusterKey;
use crate::domain::route::Route;
use crate::domain::rule::{Rule, Rules};
use crate::domain::shared_rules::SharedRules;

/// Visit every constraint reachable from `sr`. The rule is `None` for the
/// default constraints.
pub fn walk_constraints_from_shared_rules<'a, F>(sr: &'a SharedRules, mut visit: F)
where
    F: FnMut(&'a ClusterConstraint, Option<&'a Rule>, TrafficClass),
{
    walk_constraints_from_all_constraints(&sr.default, None, &mut visit);
    walk_constraints_from_rules(&sr.rules, &mut visit);
}

/// Visit every constraint of the route's own rules.
pub fn walk_constraints_from_route<'a, F>(route: &'a Route, visit: F)
where
    F: FnMut(&'a ClusterConstraint, Option<&'a Rule>, TrafficClass),
{
    walk_constraints_from_rules(&route.rules, visit);
}

pub fn walk_constraints_from_rules<'a, F>(rules: &'a Rules, mut visit: F)
where
    F: FnMut(&'a ClusterConstraint, Option<&'a Rule>, TrafficClass),
{
    for rule in rules {
        walk_constraints_from_all_constraints(&rule.constraints, Some(rule), &mut visit);
    }
}

pub fn walk_constraints_from_all_constraints<'a, F>(ac: &'a AllConstraints, rule: Option<&'a Rule>, mut visit: F)
where
    F: FnMut(&'a ClusterConstraint, Option<&'a Rule>, TrafficClass),
{
    for class in TrafficClass::ALL {
        walk_constraints(ac.get(class), rule, class, &mut visit);
    }
}

pub fn walk_constraints<'a, F>(ccs: &'a ClusterConstraints, rule: Option<&'a Rule>, class: TrafficClass, mut visit: F)
where
    F: FnMut(&'a ClusterConstraint, Option<&'a Rule>, TrafficClass),
{
    for cc in ccs {
        visit(cc, rule, class);
    }
}

pub fn walk_cluster_keys_from_all_constraints<'a, F>(ac: &'a AllConstraints, mut visit: F)
where
    F: FnMut(&'a ClusterKey),
{
    for class in TrafficClass::ALL {
        walk_cluster_keys_from_constraints(ac.get(class), &mut visit);
    }
}

pub fn walk_cluster_keys_from_constraints<'a, F>(ccs: &'a ClusterConstraints, mut visit: F)
where
    F: FnMut(&'a ClusterKey),
{
    for cc in ccs {
        visit(&cc.cluster_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cc(key: &str, cluster: &str) -> ClusterConstraint {
        ClusterConstraint::new(key, cluster, 1)
    }

    fn all(prefix: &str) -> AllConstraints {
        AllConstraints::light(vec![cc(&format!("{prefix}-l"), "c1")])
            .with_dark(vec![cc(&format!("{prefix}-d"), "c2")])
            .with_tap(vec![cc(&format!("{prefix}-t"), "c3")])
    }

    #[test]
    fn shared_rules_order() {
        let sr = SharedRules::new("sr", "z", "sr", all("def"))
            .with_rule(Rule::new("r1", all("r1")).with_method("GET"))
            .with_rule(Rule::new("r2", all("r2")).with_method("GET"));

        let mut seen = Vec::new();
        walk_constraints_from_shared_rules(&sr, |cc, rule, class| {
            seen.push((cc.constraint_key.to_string(), rule.map(|r| r.rule_key.to_string()), class));
        });

        let keys: Vec<_> = seen.iter().map(|(k, _, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["def-l", "def-d", "def-t", "r1-l", "r1-d", "r1-t", "r2-l", "r2-d", "r2-t"]
        );
        assert_eq!(seen[0].1, None);
        assert_eq!(seen[3].1.as_deref(), Some("r1"));
        assert_eq!(seen[4].2, TrafficClass::Dark);
    }

    #[test]
    fn route_visits_only_its_rules() {
        let route = Route::new("r", "z", "d", "/", "sr").with_rule(Rule::new("rk", all("x")).with_method("GET"));
        let mut count = 0;
        walk_constraints_from_route(&route, |_, rule, _| {
            assert!(rule.is_some());
            count += 1;
        });
        assert_eq!(count, 3);
    }

    #[test]
    fn cluster_keys_in_class_order() {
        let ac = all("a");
        let mut keys = Vec::new();
        walk_cluster_keys_from_all_constraints(&ac, |k| keys.push(k.as_str()));
        assert_eq!(keys, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn empty_graph_visits_nothing() {
        let mut count = 0;
        walk_constraints_from_rules(&Rules::default(), |_, _, _| count += 1);
        walk_cluster_keys_from_constraints(&ClusterConstraints::default(), |_| count += 1);
        assert_eq!(count, 0);
    }
}
