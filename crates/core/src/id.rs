//! Strongly-typed identifiers used across the domain.
//!
//! The backend issues identifiers as opaque strings (`"1"`, `"emp-42"`, UUIDs),
//! so these are string newtypes rather than parsed UUIDs.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a user (the logged-in employee).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

/// Identifier of a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

/// Identifier of a permission (display metadata only; permissions compare by name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(String);

/// Namespace for identifiers derived from permission names.
const PERMISSION_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a3e_8d4b_4f7a_9b0e_5c1d_2e3f_4a5b);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                Ok(Self(trimmed.to_owned()))
            }
        }
    };
}

impl_string_newtype!(UserId, "UserId");
impl_string_newtype!(RoleId, "RoleId");
impl_string_newtype!(PermissionId, "PermissionId");

impl PermissionId {
    /// Derive a stable identifier from a permission name.
    ///
    /// Used when the backend (or a persisted record) supplies a permission without
    /// an id; the same name always yields the same id across reloads.
    pub fn derived_from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&PERMISSION_NAMESPACE, name.as_bytes()).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_permission_id_is_stable() {
        let a = PermissionId::derived_from_name("view_employees");
        let b = PermissionId::derived_from_name("view_employees");
        let c = PermissionId::derived_from_name("manage_roles");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(Uuid::from_str(a.as_str()).is_ok());
    }

    #[test]
    fn parse_rejects_blank_ids() {
        assert!(UserId::from_str("   ").is_err());
        assert_eq!(UserId::from_str(" 42 ").unwrap().as_str(), "42");
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = RoleId::new("admin");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"admin\"");
    }
}
