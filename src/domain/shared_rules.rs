//! Rules shared by many routes
//!
//! [`SharedRules`] carry the default constraints used when no rule applies,
//! plus rules tried after those of the referencing route.

use serde::{Deserialize, Serialize};

use crate::domain::checksum::Checksum;
use crate::domain::cluster_constraint::AllConstraints;
use crate::domain::cohort_seed::CohortSeed;
use crate::domain::comparison::option_eq_by;
use crate::domain::entity::keyed_entity;
use crate::domain::id::{OrgKey, SharedRulesKey, ZoneKey};
use crate::domain::metadata::{check_non_empty_keys, metadata_valid, Metadata};
use crate::domain::object_type::ObjectType;
use crate::domain::response_data::ResponseData;
use crate::domain::retry_policy::RetryPolicy;
use crate::domain::rule::{Rule, Rules};
use crate::domain::KeyedEntity;
use crate::validation::{check_entity_key, check_index, check_key, Validation, ValidationError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedRules {
    /// Shared rules key (assigned on create)
    #[serde(default)]
    pub shared_rules_key: SharedRulesKey,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub zone_key: ZoneKey,

    /// Constraints used when no rule applies
    #[serde(default)]
    pub default: AllConstraints,

    #[serde(default)]
    pub rules: Rules,

    #[serde(default)]
    pub response_data: ResponseData,

    #[serde(default)]
    pub cohort_seed: Option<CohortSeed>,

    /// Opaque tags for consumers of the routing table
    #[serde(default)]
    pub properties: Metadata,

    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,

    #[serde(skip)]
    pub org_key: OrgKey,

    #[serde(default)]
    pub checksum: Checksum,
}

impl SharedRules {
    pub fn new(
        shared_rules_key: impl Into<SharedRulesKey>,
        zone_key: impl Into<ZoneKey>,
        name: impl Into<String>,
        default: AllConstraints,
    ) -> Self {
        Self {
            shared_rules_key: shared_rules_key.into(),
            zone_key: zone_key.into(),
            name: name.into(),
            default,
            ..Default::default()
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_cohort_seed(mut self, seed: CohortSeed) -> Self {
        self.cohort_seed = Some(seed);
        self
    }

    pub fn with_properties(mut self, properties: Metadata) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn is_nil(&self) -> bool {
        self.equals(&SharedRules::default())
    }

    pub fn equivalent(&self, other: &SharedRules) -> bool {
        self.shared_rules_key == other.shared_rules_key
            && self.name == other.name
            && self.zone_key == other.zone_key
            && self.org_key == other.org_key
            && self.response_data.equals(&other.response_data)
            && option_eq_by(self.cohort_seed.as_ref(), other.cohort_seed.as_ref(), CohortSeed::equals)
            && self.properties.equals(&other.properties)
            && option_eq_by(self.retry_policy.as_ref(), other.retry_policy.as_ref(), RetryPolicy::equals)
            && self.rules.equals(&other.rules)
            && self.default.equals(&other.default)
    }

    pub fn equals(&self, other: &SharedRules) -> bool {
        self.equivalent(other) && self.checksum == other.checksum
    }

    pub fn validate_fields(&self, precreation: bool) -> Validation {
        let mut errs = ValidationError::new();

        check_entity_key(self.shared_rules_key.as_str(), precreation, &mut errs, "shared_rules_key");
        check_index(&self.name, &mut errs, "name");
        check_key(self.zone_key.as_str(), &mut errs, "zone_key");

        errs.merge(self.default.is_valid("default"));
        errs.merge(self.rules.is_valid());
        errs.merge_prefixed(self.response_data.is_valid(), "response_data");

        if let Some(seed) = &self.cohort_seed {
            errs.merge_prefixed(seed.is_valid(), "cohort_seed");
        }

        errs.merge(shared_rules_properties_valid(&self.properties));

        if let Some(policy) = &self.retry_policy {
            errs.merge_prefixed(policy.is_valid(), "retry_policy");
        }

        errs.or_nil()
    }

    /// Checks scoped under `shared_rules`.
    pub fn is_valid(&self, precreation: bool) -> Validation {
        KeyedEntity::is_valid(self, precreation)
    }
}

impl PartialEq for SharedRules {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

keyed_entity!(SharedRules, ObjectType::SharedRules, shared_rules_key, zone: zone_key);

/// Properties need unique, non-empty keys.
pub fn shared_rules_properties_valid(md: &Metadata) -> Validation {
    metadata_valid("properties", md, &[&check_non_empty_keys])
}
