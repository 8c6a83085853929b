//! API users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::checksum::Checksum;
use crate::domain::entity::keyed_entity;
use crate::domain::id::{ApiAuthKey, OrgKey, UserKey};
use crate::domain::object_type::ObjectType;
use crate::domain::KeyedEntity;
use crate::validation::{check_entity_key, check_key, check_not_empty, Validation, ValidationError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub user_key: UserKey,

    #[serde(default)]
    pub login_email: String,

    /// Credential the user presents to the API
    #[serde(default)]
    pub api_auth_key: ApiAuthKey,

    /// Unlike other entities the owning org is part of a user's payload
    #[serde(default)]
    pub org_key: OrgKey,

    /// Set when the user has been soft-deleted
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub checksum: Checksum,
}

impl User {
    pub fn new(
        user_key: impl Into<UserKey>,
        login_email: impl Into<String>,
        api_auth_key: impl Into<ApiAuthKey>,
        org_key: impl Into<OrgKey>,
    ) -> Self {
        Self {
            user_key: user_key.into(),
            login_email: login_email.into(),
            api_auth_key: api_auth_key.into(),
            org_key: org_key.into(),
            deleted_at: None,
            checksum: Checksum::default(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn equivalent(&self, other: &User) -> bool {
        self.user_key == other.user_key
            && self.login_email == other.login_email
            && self.api_auth_key == other.api_auth_key
            && self.org_key == other.org_key
            && self.deleted_at == other.deleted_at
    }

    pub fn equals(&self, other: &User) -> bool {
        self.equivalent(other) && self.checksum == other.checksum
    }

    pub fn validate_fields(&self, precreation: bool) -> Validation {
        let mut errs = ValidationError::new();
        check_entity_key(self.user_key.as_str(), precreation, &mut errs, "user_key");
        check_not_empty(&self.login_email, &mut errs, "login_email");
        check_not_empty(self.api_auth_key.as_str(), &mut errs, "api_auth_key");
        check_key(self.org_key.as_str(), &mut errs, "org_key");
        errs.or_nil()
    }

    /// Checks scoped under `user`.
    pub fn is_valid(&self, precreation: bool) -> Validation {
        KeyedEntity::is_valid(self, precreation)
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

keyed_entity!(User, ObjectType::User, user_key);
