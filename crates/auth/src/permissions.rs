use serde::{Deserialize, Serialize};

use staffdesk_core::PermissionId;

/// A named capability (e.g. `"manage_roles"`) granted through a user's role.
///
/// Permissions are compared by `name` for every authorization decision;
/// `id` and `description` are display metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub description: String,
}

impl Permission {
    /// Build a permission from its name alone, deriving id and description.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: PermissionId::derived_from_name(&name),
            description: describe_permission(&name),
            name,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Permission as it appears on the wire or in a persisted record.
///
/// Older records (and some backend responses) carry bare names; newer ones carry
/// the structured form. The union never leaves the decoding boundary: call
/// [`PermissionRecord::normalize`] immediately.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PermissionRecord {
    Name(String),
    Detailed {
        #[serde(default)]
        id: Option<String>,
        name: String,
        #[serde(default)]
        description: Option<String>,
    },
}

impl PermissionRecord {
    pub fn normalize(self) -> Permission {
        match self {
            PermissionRecord::Name(name) => Permission::named(name),
            PermissionRecord::Detailed {
                id,
                name,
                description,
            } => {
                let id = id
                    .filter(|id| !id.trim().is_empty())
                    .map(PermissionId::new)
                    .unwrap_or_else(|| PermissionId::derived_from_name(&name));
                let description = description.unwrap_or_else(|| describe_permission(&name));
                Permission {
                    id,
                    name,
                    description,
                }
            }
        }
    }
}

/// Human-readable fallback description for a `verb_resource` permission name.
///
/// `"view_employees"` becomes `"View employees"`; names without an underscore are
/// returned capitalized.
pub fn describe_permission(name: &str) -> String {
    let words: Vec<&str> = name.split('_').filter(|w| !w.is_empty()).collect();
    let Some((first, rest)) = words.split_first() else {
        return String::new();
    };

    let mut out = String::with_capacity(name.len());
    let mut chars = first.chars();
    if let Some(c) = chars.next() {
        out.extend(c.to_uppercase());
        out.push_str(chars.as_str());
    }
    for word in rest {
        out.push(' ');
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_normalizes_with_stable_id() {
        let a: PermissionRecord = serde_json::from_str("\"view_employees\"").unwrap();
        let b: PermissionRecord = serde_json::from_str("\"view_employees\"").unwrap();

        let a = a.normalize();
        let b = b.normalize();

        assert_eq!(a.name, "view_employees");
        assert_eq!(a.id, b.id);
        assert_eq!(a.description, "View employees");
    }

    #[test]
    fn detailed_record_keeps_supplied_metadata() {
        let record: PermissionRecord = serde_json::from_str(
            r#"{"id":"7","name":"manage_roles","description":"Can manage roles"}"#,
        )
        .unwrap();

        let p = record.normalize();
        assert_eq!(p.id.as_str(), "7");
        assert_eq!(p.description, "Can manage roles");
    }

    #[test]
    fn detailed_record_without_id_derives_one_from_name() {
        let record: PermissionRecord =
            serde_json::from_str(r#"{"name":"manage_roles"}"#).unwrap();

        let p = record.normalize();
        assert_eq!(p.id, PermissionId::derived_from_name("manage_roles"));
        assert_eq!(p.description, "Manage roles");
    }

    #[test]
    fn describe_handles_odd_names() {
        assert_eq!(describe_permission("export"), "Export");
        assert_eq!(describe_permission("__"), "");
        assert_eq!(describe_permission("approve__leave_requests"), "Approve leave requests");
    }
}
