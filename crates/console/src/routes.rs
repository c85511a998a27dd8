//! Application route table and guard-aware resolution.

use serde::Serialize;

use staffdesk_auth::{NavigationRequest, RouteGuard, RouteGuards};

use crate::config::ConsoleConfig;

pub const VIEW_EMPLOYEES: &str = "view_employees";
pub const MANAGE_ROLES: &str = "manage_roles";

/// Screens the console can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Login,
    Dashboard,
    Employees,
    Roles,
    Unauthorized,
}

impl Page {
    pub fn title(self) -> &'static str {
        match self {
            Page::Login => "Sign in",
            Page::Dashboard => "Dashboard",
            Page::Employees => "Employees",
            Page::Roles => "Roles & Permissions",
            Page::Unauthorized => "Access denied",
        }
    }
}

/// Sidebar entry; `permission` gates its visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub page: Page,
    pub path: String,
    pub label: &'static str,
    pub permission: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    Page(Page),
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRoute {
    pub path: String,
    pub target: RouteTarget,
    /// Evaluated in order; the first denial wins.
    pub guards: Vec<RouteGuard>,
}

impl AppRoute {
    fn page(path: impl Into<String>, page: Page, guards: Vec<RouteGuard>) -> Self {
        Self {
            path: path.into(),
            target: RouteTarget::Page(page),
            guards,
        }
    }

    /// Exact match, or a child path (`/employees/new` under `/employees`).
    pub(crate) fn matches(&self, path: &str) -> bool {
        if self.path == "/" {
            return path == "/";
        }
        path == self.path
            || path
                .strip_prefix(self.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Ordered list of routes plus the fallback for unknown paths.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<AppRoute>,
    fallback: String,
}

impl RouteTable {
    pub fn standard(config: &ConsoleConfig) -> Self {
        let authenticated = || vec![RouteGuard::Authenticated];
        let gated = |permission: &str| {
            vec![
                RouteGuard::Authenticated,
                RouteGuard::permissions([permission]),
            ]
        };

        let routes = vec![
            AppRoute {
                path: "/".to_string(),
                target: RouteTarget::Redirect(config.home_path.clone()),
                guards: Vec::new(),
            },
            AppRoute::page(config.login_path.clone(), Page::Login, Vec::new()),
            AppRoute::page(config.unauthorized_path.clone(), Page::Unauthorized, Vec::new()),
            AppRoute::page(normalize_path(&config.home_path), Page::Dashboard, authenticated()),
            AppRoute::page("/employees", Page::Employees, gated(VIEW_EMPLOYEES)),
            AppRoute::page("/roles", Page::Roles, gated(MANAGE_ROLES)),
        ];

        Self {
            routes,
            fallback: config.home_path.clone(),
        }
    }

    pub fn routes(&self) -> &[AppRoute] {
        &self.routes
    }

    pub fn find(&self, path: &str) -> Option<&AppRoute> {
        self.routes.iter().find(|r| r.matches(path))
    }

    pub fn nav_items(&self) -> Vec<NavItem> {
        [
            (Page::Dashboard, "Dashboard", None),
            (Page::Employees, "Employees", Some(VIEW_EMPLOYEES)),
            (Page::Roles, "Roles", Some(MANAGE_ROLES)),
        ]
        .into_iter()
        .filter_map(|(page, label, permission)| {
            let route = self
                .routes
                .iter()
                .find(|r| r.target == RouteTarget::Page(page))?;
            Some(NavItem {
                page,
                path: route.path.clone(),
                label,
                permission,
            })
        })
        .collect()
    }
}

/// What the host should do with a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(Page),
    /// Static redirect from the route table (the router performs it).
    Redirect(NavigationRequest),
    /// A guard denied the navigation and already issued its own redirect.
    Blocked,
}

/// Resolves URLs against the route table, running each route's guards.
#[derive(Debug, Clone)]
pub struct Router {
    table: RouteTable,
    guards: RouteGuards,
}

impl Router {
    pub fn new(table: RouteTable, guards: RouteGuards) -> Self {
        Self { table, guards }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn guards(&self) -> &RouteGuards {
        &self.guards
    }

    pub fn resolve(&self, url: &str) -> Resolution {
        let path = normalize_path(url);

        let Some(route) = self.table.find(&path) else {
            tracing::debug!(%path, "unknown route; redirecting to fallback");
            return Resolution::Redirect(NavigationRequest::to(self.table.fallback.clone()));
        };

        for guard in &route.guards {
            if !self.guards.can_activate(guard, url) {
                return Resolution::Blocked;
            }
        }

        match &route.target {
            RouteTarget::Page(page) => Resolution::Render(*page),
            RouteTarget::Redirect(to) => Resolution::Redirect(NavigationRequest::to(to.clone())),
        }
    }
}

/// Drop query/fragment and trailing slashes; empty becomes `/`.
pub(crate) fn normalize_path(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_normalization() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/roles/?tab=1"), "/roles");
        assert_eq!(normalize_path("employees#top"), "/employees");
    }

    #[test]
    fn child_paths_match_parent_route() {
        let table = RouteTable::standard(&ConsoleConfig::default());

        assert_eq!(
            table.find("/employees/new").unwrap().target,
            RouteTarget::Page(Page::Employees)
        );
        assert!(table.find("/employeesx").is_none());
        assert!(table.find("/nowhere").is_none());
    }

    #[test]
    fn dashboard_lives_at_the_configured_home_path() {
        let config = ConsoleConfig {
            home_path: "/home/".to_string(),
            ..ConsoleConfig::default()
        };
        let table = RouteTable::standard(&config);

        assert_eq!(table.find("/home").unwrap().target, RouteTarget::Page(Page::Dashboard));
        assert_eq!(
            table.find("/").unwrap().target,
            RouteTarget::Redirect("/home/".to_string())
        );
        assert!(table.find("/dashboard").is_none());
        assert_eq!(table.nav_items()[0].path, "/home");
    }

    #[test]
    fn nav_items_carry_permissions() {
        let items = RouteTable::standard(&ConsoleConfig::default()).nav_items();

        let gated: Vec<(&str, Option<&str>)> =
            items.iter().map(|i| (i.path.as_str(), i.permission)).collect();
        assert_eq!(
            gated,
            vec![
                ("/dashboard", None),
                ("/employees", Some(VIEW_EMPLOYEES)),
                ("/roles", Some(MANAGE_ROLES)),
            ]
        );
    }
}
