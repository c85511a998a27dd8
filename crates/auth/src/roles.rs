use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use staffdesk_core::{DomainError, DomainResult, RoleId};

use crate::permissions::{Permission, PermissionRecord};
use crate::user::RawId;

/// A named bundle of permissions attached to exactly one user at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl Role {
    /// Build a role, collapsing permissions that share a name (first one wins).
    pub fn new(id: RoleId, name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        let mut seen = HashSet::new();
        let permissions = permissions
            .into_iter()
            .filter(|p| seen.insert(p.name.clone()))
            .collect();

        Self {
            id,
            name: name.into(),
            permissions,
        }
    }

    pub fn permission_names(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(|p| p.as_str())
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Role as it appears on the wire or in a persisted record.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleRecord {
    #[serde(default)]
    pub id: Option<RawId>,
    pub name: String,
    #[serde(default)]
    pub permissions: Option<Vec<PermissionRecord>>,
}

impl TryFrom<RoleRecord> for Role {
    type Error = DomainError;

    fn try_from(record: RoleRecord) -> DomainResult<Self> {
        let permissions = record
            .permissions
            .ok_or_else(|| DomainError::validation("role has no permission list"))?;

        let id = match record.id {
            Some(raw) => RoleId::new(raw.into_string()),
            None => RoleId::new(record.name.clone()),
        };

        Ok(Role::new(
            id,
            record.name,
            permissions.into_iter().map(PermissionRecord::normalize).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_permission_names_collapse() {
        let role = Role::new(
            RoleId::new("1"),
            "Developer",
            vec![
                Permission::named("view_employees"),
                Permission::named("view_employees"),
                Permission::named("edit_employees"),
            ],
        );

        let names: Vec<&str> = role.permission_names().collect();
        assert_eq!(names, vec!["view_employees", "edit_employees"]);
    }

    #[test]
    fn record_without_permission_list_is_rejected() {
        let record: RoleRecord = serde_json::from_str(r#"{"id":"1","name":"Developer"}"#).unwrap();
        let err = Role::try_from(record).unwrap_err();
        assert!(err.to_string().contains("permission list"));
    }

    #[test]
    fn record_accepts_mixed_permission_shapes() {
        let record: RoleRecord = serde_json::from_str(
            r#"{"id":2,"name":"HR","permissions":["view_employees",{"id":"9","name":"edit_employees","description":"Edit"}]}"#,
        )
        .unwrap();

        let role = Role::try_from(record).unwrap();
        assert_eq!(role.id.as_str(), "2");
        assert_eq!(role.permissions.len(), 2);
        assert_eq!(role.permissions[1].id.as_str(), "9");
    }
}
