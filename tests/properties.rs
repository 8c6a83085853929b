use flowplane_model::domain::{
    AllConstraints, Cluster, ClusterConstraint, ClusterConstraints, Domain, Instance, Metadata, Redirect,
    RedirectType, Redirects,
};
use flowplane_model::validation::ValidationError;
use proptest::prelude::*;

fn instances() -> impl Strategy<Value = Vec<Instance>> {
    prop::collection::btree_set(("[a-z]{1,8}\\.internal", 1u16..=65535), 0..6)
        .prop_map(|set| set.into_iter().map(|(host, port)| Instance::new(host, port)).collect())
}

fn cluster_with(instances: Vec<Instance>) -> Cluster {
    instances.into_iter().fold(Cluster::new("ck", "z1", "backend"), Cluster::with_instance)
}

proptest! {
    #[test]
    fn instance_order_does_not_affect_equality(
        (original, shuffled) in instances().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let a = cluster_with(original);
        let b = cluster_with(shuffled);
        prop_assert!(a.equals(&b));
        prop_assert!(b.equals(&a));
    }

    #[test]
    fn constraint_order_does_not_affect_equality(
        (original, shuffled) in prop::collection::btree_set(1u32..1000, 1..6)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let build = |weights: &[u32]| -> ClusterConstraints {
            weights.iter().map(|w| ClusterConstraint::new(format!("cc{}", w), "ck1", *w)).collect()
        };
        let a = AllConstraints::light(build(&original));
        let b = AllConstraints::light(build(&shuffled));
        prop_assert!(a.equals(&b));
        prop_assert!(b.equals(&a));
        prop_assert_eq!(a.light.total_weight(), b.light.total_weight());
    }

    #[test]
    fn redirect_order_is_significant(names in prop::collection::btree_set("[a-z]{1,6}", 2..5)) {
        let redirects: Vec<Redirect> = names
            .iter()
            .map(|n| Redirect::new(n.clone(), format!("^/{}", n), "/new", RedirectType::Permanent))
            .collect();
        let mut reversed = redirects.clone();
        reversed.reverse();

        let mut a = Domain::new("d1", "z1", "example.com", 80);
        let mut b = a.clone();
        a.redirects = Redirects::from(redirects);
        b.redirects = Redirects::from(reversed);
        prop_assert!(!a.equals(&b));
        prop_assert!(!b.equals(&a));
    }

    #[test]
    fn metadata_equality_is_symmetric(
        left in prop::collection::btree_map("[a-c]", "[a-c]", 0..3),
        right in prop::collection::btree_map("[a-c]", "[a-c]", 0..3),
    ) {
        let a = Metadata::from_map(&left);
        let b = Metadata::from_map(&right);
        prop_assert_eq!(a.equals(&b), b.equals(&a));
        prop_assert_eq!(a.equals(&b), left == right);
    }

    #[test]
    fn aggregation_reports_every_case(n in 0usize..20) {
        let mut errs = ValidationError::new();
        for i in 0..n {
            errs.add(format!("field{}", i), "bad");
        }
        match errs.or_nil() {
            Ok(()) => prop_assert_eq!(n, 0),
            Err(report) => prop_assert_eq!(report.len(), n),
        }
    }
}

#[test]
fn nil_and_empty_collections_are_equal() {
    let from_null: Cluster = serde_json::from_str(r#"{"cluster_key": "ck", "instances": null, "health_checks": null}"#).unwrap();
    let from_empty: Cluster = serde_json::from_str(r#"{"cluster_key": "ck", "instances": [], "health_checks": []}"#).unwrap();
    let absent: Cluster = serde_json::from_str(r#"{"cluster_key": "ck"}"#).unwrap();
    assert!(from_null.equals(&from_empty));
    assert!(from_empty.equals(&absent));
}
