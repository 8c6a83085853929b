//! Reverse index from clusters to the routing entities that target them

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::walk::{walk_constraints_from_route, walk_constraints_from_shared_rules};
use crate::domain::{
    ClusterConstraint, ClusterKey, Clusters, ConstraintKey, Route, RouteKey, Rule, RuleKey, SharedRules,
    SharedRulesKey, TrafficClass,
};
use crate::snapshot::ConfigSnapshot;

/// Entity holding a cluster constraint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "type", content = "key", rename_all = "snake_case")]
pub enum ReferenceSource {
    SharedRules(SharedRulesKey),
    Route(RouteKey),
}

/// One constraint targeting a cluster. `rule_key` is `None` for the default
/// constraints of shared rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterReference {
    pub source: ReferenceSource,
    pub rule_key: Option<RuleKey>,
    pub constraint_key: ConstraintKey,
    pub class: TrafficClass,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterReferenceIndex {
    references: BTreeMap<ClusterKey, Vec<ClusterReference>>,

    /// Shared rules used by each route, to answer which routes reach a
    /// cluster only through their shared rules.
    #[serde(skip)]
    route_shared_rules: BTreeMap<RouteKey, SharedRulesKey>,
}

impl ClusterReferenceIndex {
    /// Index shared rules first, then routes. References to one cluster keep
    /// the order in which they were walked.
    pub fn build(shared_rules: &[SharedRules], routes: &[Route]) -> Self {
        let mut index = Self::default();

        for sr in shared_rules {
            let source = ReferenceSource::SharedRules(sr.shared_rules_key.clone());
            walk_constraints_from_shared_rules(sr, |cc, rule, class| index.insert(&source, cc, rule, class));
        }

        for route in routes {
            let source = ReferenceSource::Route(route.route_key.clone());
            walk_constraints_from_route(route, |cc, rule, class| index.insert(&source, cc, rule, class));
            index
                .route_shared_rules
                .insert(route.route_key.clone(), route.shared_rules_key.clone());
        }

        tracing::trace!(
            clusters = index.references.len(),
            routes = routes.len(),
            shared_rules = shared_rules.len(),
            "Built cluster reference index"
        );

        index
    }

    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Self {
        Self::build(&snapshot.shared_rules, &snapshot.routes)
    }

    fn insert(&mut self, source: &ReferenceSource, cc: &ClusterConstraint, rule: Option<&Rule>, class: TrafficClass) {
        self.references.entry(cc.cluster_key.clone()).or_default().push(ClusterReference {
            source: source.clone(),
            rule_key: rule.map(|r| r.rule_key.clone()),
            constraint_key: cc.constraint_key.clone(),
            class,
        });
    }

    pub fn references(&self, cluster_key: &ClusterKey) -> &[ClusterReference] {
        self.references.get(cluster_key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Referenced cluster keys in key order.
    pub fn cluster_keys(&self) -> impl Iterator<Item = &ClusterKey> {
        self.references.keys()
    }

    pub fn is_referenced(&self, cluster_key: &ClusterKey) -> bool {
        self.references.contains_key(cluster_key)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Clusters no constraint targets, in collection order.
    pub fn unreferenced<'a>(&self, clusters: &'a Clusters) -> Vec<&'a ClusterKey> {
        clusters
            .iter()
            .map(|c| &c.cluster_key)
            .filter(|k| !self.is_referenced(k))
            .collect()
    }

    /// Routes that can send traffic to the cluster, directly through their
    /// own rules or through the shared rules they use.
    pub fn routes_using(&self, cluster_key: &ClusterKey) -> BTreeSet<RouteKey> {
        let mut routes = BTreeSet::new();
        let mut via_shared = BTreeSet::new();

        for reference in self.references(cluster_key) {
            match &reference.source {
                ReferenceSource::Route(key) => {
                    routes.insert(key.clone());
                }
                ReferenceSource::SharedRules(key) => {
                    via_shared.insert(key);
                }
            }
        }

        routes.extend(
            self.route_shared_rules
                .iter()
                .filter(|(_, sr)| via_shared.contains(sr))
                .map(|(route, _)| route.clone()),
        );

        routes
    }
}
