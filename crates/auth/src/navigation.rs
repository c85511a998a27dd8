//! Navigation capability consumed by the session store and guards.
//!
//! The router itself lives in the UI host; this crate only issues
//! `navigate(path, query)` requests through the [`Navigator`] trait.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A request to move the UI to `path` with optional query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationRequest {
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
}

impl NavigationRequest {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: BTreeMap::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

/// Abstract router capability.
pub trait Navigator {
    fn navigate(&self, request: NavigationRequest);
}

/// Navigator that records every request (tests, headless hosts).
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: RefCell<Vec<NavigationRequest>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<NavigationRequest> {
        self.history.borrow().clone()
    }

    pub fn last(&self) -> Option<NavigationRequest> {
        self.history.borrow().last().cloned()
    }

    /// Number of requests issued to `path`.
    pub fn count_to(&self, path: &str) -> usize {
        self.history
            .borrow()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    pub fn clear(&self) {
        self.history.borrow_mut().clear();
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, request: NavigationRequest) {
        tracing::debug!(path = %request.path, "navigate");
        self.history.borrow_mut().push(request);
    }
}

/// Well-known paths used by the session store and the guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPaths {
    pub login: String,
    pub unauthorized: String,
    /// Query key carrying the originally requested URL on login redirects.
    pub return_key: String,
}

impl Default for AuthPaths {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            unauthorized: "/unauthorized".to_string(),
            return_key: "returnUrl".to_string(),
        }
    }
}

impl AuthPaths {
    pub fn login(&self) -> NavigationRequest {
        NavigationRequest::to(self.login.clone())
    }

    pub fn login_returning_to(&self, requested_url: &str) -> NavigationRequest {
        self.login().with_query(self.return_key.clone(), requested_url)
    }

    pub fn unauthorized(&self) -> NavigationRequest {
        NavigationRequest::to(self.unauthorized.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_redirect_carries_return_target() {
        let paths = AuthPaths::default();
        let req = paths.login_returning_to("/roles?tab=2");

        assert_eq!(req.path, "/auth/login");
        assert_eq!(req.query_value("returnUrl"), Some("/roles?tab=2"));
    }

    #[test]
    fn history_navigator_counts_by_path() {
        let nav = HistoryNavigator::new();
        nav.navigate(NavigationRequest::to("/a"));
        nav.navigate(NavigationRequest::to("/b"));
        nav.navigate(NavigationRequest::to("/a"));

        assert_eq!(nav.count_to("/a"), 2);
        assert_eq!(nav.last().unwrap().path, "/a");
    }
}
