//! HTTP transport for the authentication backend.

use staffdesk_auth::AuthToken;

/// Headers attached to every API request.
pub fn request_headers(token: Option<&AuthToken>) -> Vec<(&'static str, String)> {
    let mut headers = vec![("Content-Type", "application/json".to_string())];
    if let Some(token) = token {
        headers.push(("Authorization", format!("Bearer {}", token.as_str())));
    }
    headers
}

#[cfg(feature = "http")]
pub use client::HttpAuthBackend;

#[cfg(feature = "http")]
mod client {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use serde::Deserialize;

    use staffdesk_auth::{ApiError, AuthBackend, AuthResponse, AuthToken, Credentials};

    use crate::config::ConsoleConfig;

    /// Error body shape returned by the API.
    #[derive(Debug, Default, Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        details: Option<BTreeMap<String, Vec<String>>>,
    }

    /// `reqwest`-backed [`AuthBackend`] talking to `{api_url}/auth/*`.
    #[derive(Debug, Clone)]
    pub struct HttpAuthBackend {
        client: reqwest::Client,
        config: ConsoleConfig,
    }

    impl HttpAuthBackend {
        pub fn new(config: ConsoleConfig) -> Self {
            Self {
                client: reqwest::Client::new(),
                config,
            }
        }

        async fn post(
            &self,
            path: &str,
            token: Option<&AuthToken>,
            body: serde_json::Value,
        ) -> Result<AuthResponse, ApiError> {
            let mut req = self.client.post(self.config.endpoint(path)).json(&body);
            for (name, value) in super::request_headers(token) {
                req = req.header(name, value);
            }

            let resp = req.send().await.map_err(|e| ApiError::client(e.to_string()))?;
            let status = resp.status();

            if !status.is_success() {
                let body: ErrorBody = resp.json().await.unwrap_or_default();
                let mut error = ApiError::status(
                    status.as_u16(),
                    body.message
                        .unwrap_or_else(|| "An unexpected error occurred".to_string()),
                );
                if let Some(details) = body.details {
                    error = error.with_details(details);
                }
                return Err(error);
            }

            resp.json::<AuthResponse>()
                .await
                .map_err(|e| ApiError::client(format!("invalid auth response: {e}")))
        }
    }

    #[async_trait(?Send)]
    impl AuthBackend for HttpAuthBackend {
        async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
            let body = serde_json::to_value(credentials)
                .map_err(|e| ApiError::client(e.to_string()))?;
            self.post("/auth/login", None, body).await
        }

        async fn refresh(&self, token: &AuthToken) -> Result<AuthResponse, ApiError> {
            self.post("/auth/refresh", Some(token), serde_json::json!({}))
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_only_with_token() {
        assert_eq!(request_headers(None).len(), 1);

        let token = AuthToken::new("abc");
        let headers = request_headers(Some(&token));
        assert!(headers.contains(&("Authorization", "Bearer abc".to_string())));
        assert!(headers.contains(&("Content-Type", "application/json".to_string())));
    }
}
