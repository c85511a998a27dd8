//! Console configuration.

use staffdesk_auth::AuthPaths;

use crate::routes::{normalize_path, Page, RouteTable, RouteTarget};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Where the API lives and which paths the console routes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub login_path: String,
    pub unauthorized_path: String,
    /// Landing page after login and target of unknown paths.
    pub home_path: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let paths = AuthPaths::default();
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            login_path: paths.login,
            unauthorized_path: paths.unauthorized,
            home_path: "/dashboard".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Defaults overridden by `STAFFDESK_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns; blank values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("STAFFDESK_API_URL") {
            config.api_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("STAFFDESK_LOGIN_PATH") {
            config.login_path = v;
        }
        if let Some(v) = get("STAFFDESK_UNAUTHORIZED_PATH") {
            config.unauthorized_path = v;
        }
        if let Some(v) = get("STAFFDESK_HOME_PATH") {
            config.home_path = v;
        }

        tracing::debug!(api_url = %config.api_url, "console configuration loaded");
        config
    }

    pub fn auth_paths(&self) -> AuthPaths {
        AuthPaths {
            login: self.login_path.clone(),
            unauthorized: self.unauthorized_path.clone(),
            ..AuthPaths::default()
        }
    }

    /// Reject configurations the console cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            anyhow::bail!("api_url must be an http(s) URL, got '{}'", self.api_url);
        }
        for (name, path) in [
            ("login_path", &self.login_path),
            ("unauthorized_path", &self.unauthorized_path),
            ("home_path", &self.home_path),
        ] {
            if !path.starts_with('/') {
                anyhow::bail!("{name} must start with '/', got '{path}'");
            }
        }
        if self.home_path == self.login_path {
            anyhow::bail!("home_path and login_path must differ");
        }

        // The dashboard must be the only route at home, or `/` and unknown
        // paths would redirect somewhere else (or back to themselves).
        let home = normalize_path(&self.home_path);
        let table = RouteTable::standard(self);
        let matching: Vec<&RouteTarget> = table
            .routes()
            .iter()
            .filter(|r| r.matches(&home))
            .map(|r| &r.target)
            .collect();
        if matching.as_slice() != [&RouteTarget::Page(Page::Dashboard)] {
            anyhow::bail!(
                "home_path '{}' does not resolve to the dashboard alone",
                self.home_path
            );
        }
        Ok(())
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_auth_paths() {
        let config = ConsoleConfig::default();
        assert_eq!(config.auth_paths(), AuthPaths::default());
        assert_eq!(config.home_path, "/dashboard");
    }

    #[test]
    fn lookup_overrides_and_ignores_blanks() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("STAFFDESK_API_URL", "https://hr.example.com/api/"),
            ("STAFFDESK_LOGIN_PATH", "   "),
            ("STAFFDESK_HOME_PATH", "/employees"),
        ]);

        let config = ConsoleConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_url, "https://hr.example.com/api");
        assert_eq!(config.login_path, "/auth/login");
        assert_eq!(config.home_path, "/employees");
        assert_eq!(config.endpoint("/auth/login"), "https://hr.example.com/api/auth/login");
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert!(ConsoleConfig::default().validate().is_ok());

        let bad_url = ConsoleConfig {
            api_url: "localhost:3000".to_string(),
            ..ConsoleConfig::default()
        };
        assert!(bad_url.validate().is_err());

        let relative = ConsoleConfig {
            home_path: "dashboard".to_string(),
            ..ConsoleConfig::default()
        };
        let err = relative.validate().unwrap_err().to_string();
        assert!(err.contains("home_path"));
    }

    #[test]
    fn home_path_must_reach_the_dashboard() {
        let custom = ConsoleConfig {
            home_path: "/home".to_string(),
            ..ConsoleConfig::default()
        };
        assert!(custom.validate().is_ok());

        for shadowed in ["/", "/unauthorized", "/roles", "/employees/new"] {
            let config = ConsoleConfig {
                home_path: shadowed.to_string(),
                ..ConsoleConfig::default()
            };
            let err = config.validate().unwrap_err().to_string();
            assert!(err.contains("dashboard"), "{shadowed}: {err}");
        }
    }
}
