//! Route guards: synchronous permit/deny decisions over a session snapshot.
//!
//! Each navigation attempt is evaluated independently:
//! `Evaluating → {Permitted, Denied-Redirect-Login, Denied-Redirect-Unauthorized}`.
//! Denial is a normal outcome, never an error.

use crate::evaluate::{explain_access, PermissionQuery};
use crate::navigation::{AuthPaths, NavigationRequest};
use crate::session::{Session, SessionStore};

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Permit,
    /// Not authenticated; `return_url` is the originally requested URL.
    RedirectToLogin { return_url: String },
    /// Authenticated but lacking a required permission.
    RedirectToUnauthorized { missing: Vec<String> },
}

impl GuardDecision {
    pub fn is_permitted(&self) -> bool {
        matches!(self, GuardDecision::Permit)
    }

    /// Navigation the router should perform for a denial.
    pub fn redirect(&self, paths: &AuthPaths) -> Option<NavigationRequest> {
        match self {
            GuardDecision::Permit => None,
            GuardDecision::RedirectToLogin { return_url } => {
                Some(paths.login_returning_to(return_url))
            }
            GuardDecision::RedirectToUnauthorized { .. } => Some(paths.unauthorized()),
        }
    }
}

/// Guard annotation attached to a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteGuard {
    /// Requires an authenticated session.
    Authenticated,
    /// Requires every listed permission (empty list permits unconditionally).
    Permissions(Vec<String>),
}

impl RouteGuard {
    pub fn permissions<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        RouteGuard::Permissions(names.into_iter().map(Into::into).collect())
    }

    pub fn evaluate(&self, session: &Session, requested_url: &str) -> GuardDecision {
        match self {
            RouteGuard::Authenticated => check_authenticated(session, requested_url),
            RouteGuard::Permissions(required) => {
                check_permissions(session, requested_url, required)
            }
        }
    }
}

/// Permit iff the session is authenticated.
pub fn check_authenticated(session: &Session, requested_url: &str) -> GuardDecision {
    if session.is_authenticated() {
        GuardDecision::Permit
    } else {
        GuardDecision::RedirectToLogin {
            return_url: requested_url.to_string(),
        }
    }
}

/// Permit iff every required permission is held.
///
/// An empty requirement permits without looking at the session.
pub fn check_permissions<S: AsRef<str>>(
    session: &Session,
    requested_url: &str,
    required: &[S],
) -> GuardDecision {
    if required.is_empty() {
        return GuardDecision::Permit;
    }

    if !session.is_authenticated() {
        return GuardDecision::RedirectToLogin {
            return_url: requested_url.to_string(),
        };
    }

    if session.has_all_permissions(required) {
        GuardDecision::Permit
    } else {
        let explanation = explain_access(session, required);
        GuardDecision::RedirectToUnauthorized {
            missing: explanation.missing,
        }
    }
}

/// Guards bound to a session store: evaluate, then issue the redirect.
#[derive(Debug, Clone)]
pub struct RouteGuards {
    store: SessionStore,
}

impl RouteGuards {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Run `guard` for a navigation to `requested_url`; `false` blocks it.
    pub fn can_activate(&self, guard: &RouteGuard, requested_url: &str) -> bool {
        let decision = guard.evaluate(&self.store.session(), requested_url);
        self.enforce(&decision, requested_url)
    }

    pub fn can_activate_authenticated(&self, requested_url: &str) -> bool {
        self.can_activate(&RouteGuard::Authenticated, requested_url)
    }

    pub fn can_activate_with_permissions<S: AsRef<str>>(
        &self,
        requested_url: &str,
        required: &[S],
    ) -> bool {
        let decision = check_permissions(&self.store.session(), requested_url, required);
        self.enforce(&decision, requested_url)
    }

    fn enforce(&self, decision: &GuardDecision, requested_url: &str) -> bool {
        match decision {
            GuardDecision::Permit => return true,
            GuardDecision::RedirectToLogin { .. } => {
                tracing::info!(path = %requested_url, "navigation denied: not authenticated");
            }
            GuardDecision::RedirectToUnauthorized { missing } => {
                tracing::info!(
                    path = %requested_url,
                    missing = ?missing,
                    "navigation denied: missing permissions"
                );
            }
        }

        if let Some(redirect) = decision.redirect(self.store.paths()) {
            self.store.navigator().navigate(redirect);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use staffdesk_core::{RoleId, UserId};

    use super::*;
    use crate::backend::AuthToken;
    use crate::permissions::Permission;
    use crate::roles::Role;
    use crate::user::{User, UserStatus};

    fn session_with(permissions: &[&str]) -> Session {
        let role = Role::new(
            RoleId::new("1"),
            "Tester",
            permissions.iter().map(|p| Permission::named(*p)).collect(),
        );
        let user = User {
            id: UserId::new("1"),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            department: "Engineering".to_string(),
            role,
            start_date: Utc::now(),
            status: UserStatus::Active,
        };
        Session::authenticated(AuthToken::new("t"), user)
    }

    #[test]
    fn authentication_guard() {
        assert!(check_authenticated(&session_with(&[]), "/dashboard").is_permitted());
        assert_eq!(
            check_authenticated(&Session::anonymous(), "/dashboard"),
            GuardDecision::RedirectToLogin {
                return_url: "/dashboard".to_string()
            }
        );
    }

    #[test]
    fn empty_requirement_permits_even_anonymous() {
        let none: [&str; 0] = [];
        assert!(check_permissions(&Session::anonymous(), "/x", &none).is_permitted());
    }

    #[test]
    fn permission_guard_sends_anonymous_users_to_login() {
        let decision = check_permissions(&Session::anonymous(), "/roles", &["manage_roles"]);
        assert!(matches!(decision, GuardDecision::RedirectToLogin { .. }));
    }

    #[test]
    fn permission_guard_denies_missing_permission() {
        let decision = check_permissions(&session_with(&["view_employees"]), "/roles", &["manage_roles"]);

        assert_eq!(
            decision,
            GuardDecision::RedirectToUnauthorized {
                missing: vec!["manage_roles".to_string()]
            }
        );
        assert_eq!(
            decision.redirect(&AuthPaths::default()).unwrap().path,
            "/unauthorized"
        );
    }

    #[test]
    fn permission_guard_requires_all() {
        let session = session_with(&["view_employees", "manage_roles"]);
        assert!(check_permissions(&session, "/roles", &["manage_roles"]).is_permitted());
        assert!(!check_permissions(&session, "/x", &["manage_roles", "delete_employees"]).is_permitted());
    }

    #[test]
    fn login_redirect_carries_requested_url() {
        let decision = RouteGuard::Authenticated.evaluate(&Session::anonymous(), "/employees?page=2");
        let redirect = decision.redirect(&AuthPaths::default()).unwrap();

        assert_eq!(redirect.path, "/auth/login");
        assert_eq!(redirect.query_value("returnUrl"), Some("/employees?page=2"));
    }
}
