//! Personal access tokens issued to users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::checksum::Checksum;
use crate::domain::entity::keyed_entity;
use crate::domain::id::{AccessTokenKey, OrgKey, UserKey};
use crate::domain::object_type::ObjectType;
use crate::domain::KeyedEntity;
use crate::validation::{check_entity_key, check_key, Validation, ValidationError};

/// Maximum description length in characters.
pub const DESCRIPTION_LEN: usize = 255;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(default)]
    pub access_token_key: AccessTokenKey,

    /// What the token is for, chosen by its owner
    #[serde(default)]
    pub description: String,

    /// The token itself; issued and verified by the authentication layer
    #[serde(default)]
    pub signed_token: String,

    #[serde(default)]
    pub user_key: UserKey,

    #[serde(skip)]
    pub org_key: OrgKey,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub checksum: Checksum,
}

impl AccessToken {
    pub fn new(description: impl Into<String>, user_key: impl Into<UserKey>, org_key: impl Into<OrgKey>) -> Self {
        Self {
            description: description.into(),
            user_key: user_key.into(),
            org_key: org_key.into(),
            ..Default::default()
        }
    }

    pub fn equivalent(&self, other: &AccessToken) -> bool {
        self.access_token_key == other.access_token_key
            && self.description == other.description
            && self.signed_token == other.signed_token
            && self.user_key == other.user_key
            && self.org_key == other.org_key
            && self.created_at == other.created_at
    }

    pub fn equals(&self, other: &AccessToken) -> bool {
        self.equivalent(other) && self.checksum == other.checksum
    }

    pub fn validate_fields(&self, precreation: bool) -> Validation {
        let mut errs = ValidationError::new();

        check_entity_key(self.access_token_key.as_str(), precreation, &mut errs, "access_token_key");
        check_key(self.user_key.as_str(), &mut errs, "user_key");
        check_key(self.org_key.as_str(), &mut errs, "org_key");

        if self.description.trim().is_empty() {
            errs.add("description", "must have a description");
        }
        if self.description.chars().count() > DESCRIPTION_LEN {
            errs.add("description", format!("must be less than {} characters", DESCRIPTION_LEN));
        }

        errs.or_nil()
    }

    /// Checks scoped under `access_token`.
    pub fn is_valid(&self, precreation: bool) -> Validation {
        KeyedEntity::is_valid(self, precreation)
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

keyed_entity!(AccessToken, ObjectType::AccessToken, access_token_key);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ErrorCase;

    #[test]
    fn precreation_token() {
        let token = AccessToken::new("ci deploys", "u1", "acme");
        assert!(token.is_valid(true).is_ok());
        assert!(token.is_valid(false).is_err());
    }

    #[test]
    fn description_bounds() {
        let blank = AccessToken::new("  ", "u1", "acme");
        assert_eq!(
            blank.is_valid(true).unwrap_err().errors,
            vec![ErrorCase::new("access_token.description", "must have a description")]
        );

        let long = AccessToken::new("x".repeat(DESCRIPTION_LEN + 1), "u1", "acme");
        assert_eq!(
            long.is_valid(true).unwrap_err().errors,
            vec![ErrorCase::new("access_token.description", "must be less than 255 characters")]
        );

        let exact = AccessToken::new("x".repeat(DESCRIPTION_LEN), "u1", "acme");
        assert!(exact.is_valid(true).is_ok());
    }

    #[test]
    fn keys_must_match_pattern() {
        let token = AccessToken::new("d", "bad user!", "acme");
        let err = token.is_valid(true).unwrap_err();
        assert_eq!(err.errors[0].attribute, "access_token.user_key");
    }
}
