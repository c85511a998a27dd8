//! Permission evaluation (pure, no IO).
//!
//! Every query is answered against a set of permission *names*; ordering and
//! duplicates in the underlying role are irrelevant.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::permissions::Permission;
use crate::roles::Role;

/// Single / any / all permission queries.
///
/// Implementors only answer `has_permission`; the combinators are derived:
/// - `has_any_permission(&[])` is `false` (nothing to match).
/// - `has_all_permissions(&[])` is `true` (vacuously satisfied), whatever the
///   implementor's state, including an anonymous session.
pub trait PermissionQuery {
    fn has_permission(&self, name: &str) -> bool;

    fn has_any_permission<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().any(|n| self.has_permission(n.as_ref()))
    }

    fn has_all_permissions<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().all(|n| self.has_permission(n.as_ref()))
    }
}

/// Set of granted permission names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<&Role> for PermissionSet {
    fn from(role: &Role) -> Self {
        role.permission_names().collect()
    }
}

impl From<&[Permission]> for PermissionSet {
    fn from(permissions: &[Permission]) -> Self {
        permissions.iter().map(|p| p.as_str()).collect()
    }
}

impl PermissionQuery for PermissionSet {
    fn has_permission(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

impl PermissionQuery for Role {
    fn has_permission(&self, name: &str) -> bool {
        self.permissions.iter().any(|p| p.name == name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Access explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Why an all-of permission requirement was met or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessExplanation {
    pub required: Vec<String>,
    pub granted: bool,
    /// Required names the subject lacks, in requirement order.
    pub missing: Vec<String>,
    pub reason: String,
}

/// Explain an all-of requirement against any permission source.
pub fn explain_access<Q, S>(subject: &Q, required: &[S]) -> AccessExplanation
where
    Q: PermissionQuery + ?Sized,
    S: AsRef<str>,
{
    let required: Vec<String> = required.iter().map(|s| s.as_ref().to_string()).collect();
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !subject.has_permission(name))
        .cloned()
        .collect();

    let granted = missing.is_empty();
    let reason = if required.is_empty() {
        "no permissions required".to_string()
    } else if granted {
        format!("all required permissions held: {}", required.join(", "))
    } else {
        format!("missing required permissions: {}", missing.join(", "))
    };

    AccessExplanation {
        required,
        granted,
        missing,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> PermissionSet {
        names.iter().copied().collect()
    }

    #[test]
    fn single_permission_lookup() {
        let perms = set(&["view_employees"]);
        assert!(perms.has_permission("view_employees"));
        assert!(!perms.has_permission("manage_roles"));
    }

    #[test]
    fn empty_requirements() {
        let perms = PermissionSet::empty();
        let none: [&str; 0] = [];

        assert!(perms.has_all_permissions(&none));
        assert!(!perms.has_any_permission(&none));
    }

    #[test]
    fn duplicates_collapse() {
        let perms = set(&["a", "a", "b"]);
        assert_eq!(perms.len(), 2);
    }

    #[test]
    fn explanation_lists_missing_permissions_in_order() {
        let perms = set(&["view_employees"]);
        let e = explain_access(&perms, &["manage_roles", "view_employees", "edit_employees"]);

        assert!(!e.granted);
        assert_eq!(e.missing, vec!["manage_roles", "edit_employees"]);
        assert!(e.reason.contains("manage_roles"));
    }

    #[test]
    fn explanation_for_empty_requirement_is_granted() {
        let e = explain_access(&PermissionSet::empty(), &[] as &[&str]);
        assert!(e.granted);
        assert!(e.missing.is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn names() -> impl Strategy<Value = Vec<String>> {
            prop::collection::vec("[a-c]_[x-z]", 0..6)
        }

        proptest! {
            /// Property: any-of holds iff the granted set intersects the request.
            #[test]
            fn any_iff_intersection(granted in names(), requested in names()) {
                let perms: PermissionSet = granted.iter().cloned().collect();
                let intersects = requested.iter().any(|r| granted.contains(r));
                prop_assert_eq!(perms.has_any_permission(&requested), intersects);
            }

            /// Property: all-of holds iff the request is a subset of the granted set.
            #[test]
            fn all_iff_subset(granted in names(), requested in names()) {
                let perms: PermissionSet = granted.iter().cloned().collect();
                let subset = requested.iter().all(|r| granted.contains(r));
                prop_assert_eq!(perms.has_all_permissions(&requested), subset);
            }

            /// Property: explanation agrees with all-of evaluation.
            #[test]
            fn explanation_matches_all_of(granted in names(), requested in names()) {
                let perms: PermissionSet = granted.iter().cloned().collect();
                let e = explain_access(&perms, &requested);
                prop_assert_eq!(e.granted, perms.has_all_permissions(&requested));
            }
        }
    }
}
