//! Zones: logical regions within an organization.

use serde::{Deserialize, Serialize};

use crate::domain::checksum::Checksum;
use crate::domain::entity::keyed_entity;
use crate::domain::id::{OrgKey, ZoneKey};
use crate::domain::object_type::ObjectType;
use crate::domain::KeyedEntity;
use crate::validation::{check_entity_key, check_key, check_not_empty, Validation, ValidationError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub zone_key: ZoneKey,

    #[serde(default)]
    pub name: String,

    #[serde(skip)]
    pub org_key: OrgKey,

    #[serde(default)]
    pub checksum: Checksum,
}

impl Zone {
    pub fn new(zone_key: impl Into<ZoneKey>, name: impl Into<String>, org_key: impl Into<OrgKey>) -> Self {
        Self {
            zone_key: zone_key.into(),
            name: name.into(),
            org_key: org_key.into(),
            checksum: Checksum::default(),
        }
    }

    pub fn equivalent(&self, other: &Zone) -> bool {
        self.zone_key == other.zone_key && self.name == other.name && self.org_key == other.org_key
    }

    pub fn equals(&self, other: &Zone) -> bool {
        self.equivalent(other) && self.checksum == other.checksum
    }

    pub fn validate_fields(&self, precreation: bool) -> Validation {
        let mut errs = ValidationError::new();
        check_entity_key(self.zone_key.as_str(), precreation, &mut errs, "zone_key");
        check_key(self.org_key.as_str(), &mut errs, "org_key");
        check_not_empty(&self.name, &mut errs, "name");
        errs.or_nil()
    }

    /// Checks scoped under `zone`.
    pub fn is_valid(&self, precreation: bool) -> Validation {
        KeyedEntity::is_valid(self, precreation)
    }
}

impl PartialEq for Zone {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

keyed_entity!(Zone, ObjectType::Zone, zone_key);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{ErrorCase, MUST_NOT_BE_EMPTY};

    #[test]
    fn valid_zone() {
        assert!(Zone::new("us-east", "US East", "acme").is_valid(false).is_ok());
    }

    #[test]
    fn requires_org() {
        let err = Zone::new("us-east", "US East", "").is_valid(false).unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("zone.org_key", MUST_NOT_BE_EMPTY)]);
    }

    #[test]
    fn org_key_is_not_serialized() {
        let json = serde_json::to_value(Zone::new("z", "Z", "acme")).unwrap();
        assert!(json.get("org_key").is_none());
        assert_eq!(json["zone_key"], "z");
    }
}
