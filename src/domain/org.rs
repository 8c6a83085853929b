//! Organizations, the root of tenancy.

use serde::{Deserialize, Serialize};

use crate::domain::checksum::Checksum;
use crate::domain::entity::keyed_entity;
use crate::domain::id::OrgKey;
use crate::domain::object_type::ObjectType;
use crate::domain::KeyedEntity;
use crate::validation::{check_entity_key, check_not_empty, Validation, ValidationError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Org {
    #[serde(default)]
    pub org_key: OrgKey,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub contact_email: String,

    #[serde(default)]
    pub checksum: Checksum,
}

impl Org {
    pub fn new(org_key: impl Into<OrgKey>, name: impl Into<String>, contact_email: impl Into<String>) -> Self {
        Self {
            org_key: org_key.into(),
            name: name.into(),
            contact_email: contact_email.into(),
            checksum: Checksum::default(),
        }
    }

    pub fn equivalent(&self, other: &Org) -> bool {
        self.org_key == other.org_key
            && self.name == other.name
            && self.contact_email == other.contact_email
    }

    pub fn equals(&self, other: &Org) -> bool {
        self.equivalent(other) && self.checksum == other.checksum
    }

    pub fn validate_fields(&self, precreation: bool) -> Validation {
        let mut errs = ValidationError::new();
        check_entity_key(self.org_key.as_str(), precreation, &mut errs, "org_key");
        check_not_empty(&self.name, &mut errs, "name");
        check_not_empty(&self.contact_email, &mut errs, "contact_email");
        errs.or_nil()
    }

    /// Checks scoped under `org`.
    pub fn is_valid(&self, precreation: bool) -> Validation {
        KeyedEntity::is_valid(self, precreation)
    }
}

impl PartialEq for Org {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

keyed_entity!(Org, ObjectType::Org, org_key);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{ErrorCase, MUST_NOT_BE_EMPTY};

    #[test]
    fn valid_org() {
        let org = Org::new("acme", "Acme", "ops@acme.example");
        assert!(org.is_valid(false).is_ok());
    }

    #[test]
    fn precreation_allows_missing_key() {
        let org = Org::new("", "Acme", "ops@acme.example");
        assert!(org.is_valid(true).is_ok());
        assert_eq!(
            org.is_valid(false).unwrap_err().errors,
            vec![ErrorCase::new("org.org_key", MUST_NOT_BE_EMPTY)]
        );
    }

    #[test]
    fn every_field_reported() {
        let err = Org::default().is_valid(false).unwrap_err();
        let attrs: Vec<_> = err.iter().map(|e| e.attribute.as_str()).collect();
        assert_eq!(attrs, vec!["org.org_key", "org.name", "org.contact_email"]);
    }

    #[test]
    fn checksum_only_affects_equals() {
        let a = Org::new("acme", "Acme", "ops@acme.example");
        let mut b = a.clone();
        b.checksum = Checksum::new("v2");
        assert!(a.equivalent(&b));
        assert!(!a.equals(&b));
    }
}
