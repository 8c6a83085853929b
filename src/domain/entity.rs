//! Common behaviour of top-level entities
//!
//! Every top-level entity has a key unique within its collection, an owning
//! org, a checksum and the two equality modes. [`KeyedEntity`] exposes them
//! uniformly so snapshots can check uniqueness and diff collections without
//! knowing the concrete type.

use crate::domain::checksum::Checksum;
use crate::domain::id::{OrgKey, ZoneKey};
use crate::domain::object_type::ObjectType;
use crate::validation::Validation;

pub trait KeyedEntity {
    const OBJECT_TYPE: ObjectType;

    /// Key of the entity within its collection
    fn key(&self) -> &str;

    /// Owning organization. Not serialized for most entities, so it is empty
    /// on anything loaded from an external payload.
    fn org_key(&self) -> &OrgKey;

    fn checksum(&self) -> &Checksum;

    /// Zone the entity belongs to, for zone-scoped entities.
    fn zone_key(&self) -> Option<&ZoneKey> {
        None
    }

    /// Exact equality, including key and checksum.
    fn equals(&self, other: &Self) -> bool;

    /// Payload equality ignoring the checksum.
    fn equivalent(&self, other: &Self) -> bool;

    /// Field checks with attributes relative to the entity.
    fn validate_fields(&self, precreation: bool) -> Validation;

    /// Field checks scoped under the entity's type name, e.g. `route.path`.
    fn is_valid(&self, precreation: bool) -> Validation {
        self.validate_fields(precreation).map_err(|e| e.prefixed(Self::OBJECT_TYPE.name()))
    }
}

/// Implement [`KeyedEntity`] by delegating to the type's inherent
/// `equals`, `equivalent` and `validate_fields`.
macro_rules! keyed_entity {
    ($ty:ty, $object_type:expr, $key:ident) => {
        keyed_entity!(@impl $ty, $object_type, $key, {});
    };
    ($ty:ty, $object_type:expr, $key:ident, zone: $zone:ident) => {
        keyed_entity!(@impl $ty, $object_type, $key, {
            fn zone_key(&self) -> Option<&$crate::domain::id::ZoneKey> {
                Some(&self.$zone)
            }
        });
    };
    (@impl $ty:ty, $object_type:expr, $key:ident, { $($extra:tt)* }) => {
        impl $crate::domain::entity::KeyedEntity for $ty {
            const OBJECT_TYPE: $crate::domain::object_type::ObjectType = $object_type;

            fn key(&self) -> &str {
                self.$key.as_str()
            }

            fn org_key(&self) -> &$crate::domain::id::OrgKey {
                &self.org_key
            }

            fn checksum(&self) -> &$crate::domain::checksum::Checksum {
                &self.checksum
            }

            $($extra)*

            fn equals(&self, other: &Self) -> bool {
                <$ty>::equals(self, other)
            }

            fn equivalent(&self, other: &Self) -> bool {
                <$ty>::equivalent(self, other)
            }

            fn validate_fields(&self, precreation: bool) -> $crate::validation::Validation {
                <$ty>::validate_fields(self, precreation)
            }
        }
    };
}

pub(crate) use keyed_entity;
