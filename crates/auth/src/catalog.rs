//! Catalog of available roles and permissions (for display and administration).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::evaluate::PermissionQuery;
use crate::permissions::Permission;
use crate::roles::Role;

/// Display row for a permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionDefinition {
    pub name: String,
    pub description: String,
    /// Leading verb of a `verb_resource` name (`"view"`, `"manage"`).
    pub action: Option<String>,
    /// Roles in the catalog that grant this permission, sorted.
    pub granted_by: Vec<String>,
}

/// Available roles, and the permissions they grant deduplicated by name.
#[derive(Debug, Clone, Default)]
pub struct RoleCatalog {
    roles: BTreeMap<String, Role>,
    permissions: BTreeMap<String, Permission>,
}

impl RoleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog. A later role with the same name replaces an earlier one;
    /// the first description seen for a permission name is kept.
    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut catalog = Self::new();
        for role in roles {
            catalog.insert(role);
        }
        catalog
    }

    pub fn insert(&mut self, role: Role) {
        for permission in &role.permissions {
            self.permissions
                .entry(permission.name.clone())
                .or_insert_with(|| permission.clone());
        }
        self.roles.insert(role.name.clone(), role);
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn permissions(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.values()
    }

    /// Roles granting `permission`, in name order.
    pub fn roles_granting(&self, permission: &str) -> Vec<&Role> {
        self.roles
            .values()
            .filter(|r| r.has_permission(permission))
            .collect()
    }

    pub fn role_has_permission(&self, role: &str, permission: &str) -> bool {
        self.role(role).is_some_and(|r| r.has_permission(permission))
    }

    pub fn definitions(&self) -> Vec<PermissionDefinition> {
        self.permissions
            .values()
            .map(|p| PermissionDefinition {
                name: p.name.clone(),
                description: p.description.clone(),
                action: permission_action(&p.name),
                granted_by: self
                    .roles_granting(&p.name)
                    .into_iter()
                    .map(|r| r.name.clone())
                    .collect(),
            })
            .collect()
    }
}

fn permission_action(name: &str) -> Option<String> {
    name.split_once('_')
        .map(|(verb, _)| verb)
        .filter(|verb| !verb.is_empty())
        .map(str::to_string)
}
