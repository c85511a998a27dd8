//! API error presentation and the session side effects of API failures.

use std::cell::RefCell;

use staffdesk_auth::{ApiError, SessionStore, CLIENT_ERROR};

/// User-facing message for an API error.
pub fn user_message(error: &ApiError) -> String {
    let fixed = match error.code.as_str() {
        "401" => "Please log in to continue",
        "403" => "You do not have permission to perform this action",
        "404" => "The requested resource was not found",
        "422" => "The provided data is invalid",
        CLIENT_ERROR => "A network error occurred. Please check your connection",
        _ if error.message.trim().is_empty() => "An unexpected error occurred",
        _ => return error.message.clone(),
    };
    fixed.to_string()
}

/// Receives API errors from views, remembers the last one and reacts to
/// authentication failures.
#[derive(Debug)]
pub struct ErrorHandler {
    store: SessionStore,
    last: RefCell<Option<ApiError>>,
}

impl ErrorHandler {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            last: RefCell::new(None),
        }
    }

    /// Record `error` and return the message to show.
    ///
    /// A 401 means the token is no longer accepted: the session is cleared and
    /// the user is sent to the login screen.
    pub fn handle(&self, error: ApiError) -> String {
        let message = user_message(&error);

        if error.is_status(401) {
            tracing::warn!("API rejected the session token; logging out");
            self.store.logout();
        } else if error.is_status(500) {
            tracing::error!(message = %error.message, details = ?error.details, "critical server error");
        } else {
            tracing::debug!(code = %error.code, "API error");
        }

        *self.last.borrow_mut() = Some(error);
        message
    }

    pub fn last_error(&self) -> Option<ApiError> {
        self.last.borrow().clone()
    }

    pub fn clear(&self) {
        self.last.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_fixed_messages() {
        assert_eq!(user_message(&ApiError::status(403, "nope")), "You do not have permission to perform this action");
        assert_eq!(user_message(&ApiError::status(422, "bad")), "The provided data is invalid");
        assert_eq!(
            user_message(&ApiError::client("dns failure")),
            "A network error occurred. Please check your connection"
        );
    }

    #[test]
    fn unknown_codes_use_server_message_or_fallback() {
        assert_eq!(user_message(&ApiError::status(409, "Email already taken")), "Email already taken");
        assert_eq!(user_message(&ApiError::status(502, "  ")), "An unexpected error occurred");
    }
}
