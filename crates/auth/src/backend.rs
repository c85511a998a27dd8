//! Authentication backend contract (transport-agnostic).
//!
//! The session store calls `login`/`refresh` and never sees transport details.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code used for failures that never reached the server.
pub const CLIENT_ERROR: &str = "CLIENT_ERROR";

/// Error reported by the backend (or the transport in front of it).
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// HTTP status as a string (`"401"`) or [`CLIENT_ERROR`].
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn client(message: impl Into<String>) -> Self {
        Self::new(CLIENT_ERROR, message)
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::new(status.to_string(), message)
    }

    pub fn with_details(mut self, details: BTreeMap<String, Vec<String>>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is_status(&self, status: u16) -> bool {
        self.code == status.to_string()
    }
}

/// Login form input.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login/refresh payload.
///
/// `user` stays raw JSON: the session store decodes it, so a badly shaped user
/// clears the session instead of surfacing as a transport failure.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: serde_json::Value,
}

/// Opaque bearer token issued by the backend.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// External authentication collaborator.
///
/// Futures are not required to be `Send`: the console runs on a single-threaded
/// event loop (browser or `current_thread` runtime).
#[async_trait(?Send)]
pub trait AuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError>;

    async fn refresh(&self, token: &AuthToken) -> Result<AuthResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let creds = Credentials::new("john@example.com", "hunter2");
        let token = AuthToken::new("secret-token");

        assert!(!format!("{creds:?}").contains("hunter2"));
        assert!(!format!("{token:?}").contains("secret-token"));
    }

    #[test]
    fn api_error_display_and_status() {
        let err = ApiError::status(401, "expired");
        assert_eq!(err.to_string(), "401: expired");
        assert!(err.is_status(401));
        assert!(!ApiError::client("offline").is_status(401));
    }
}
