//! Persisted session record (durable storage serialization of token + user).

use thiserror::Error;

use staffdesk_core::DomainError;

use crate::user::{User, UserRecord};

/// Storage key holding the opaque auth token.
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key holding the JSON-serialized user.
pub const USER_KEY: &str = "user";

/// Why a stored (or received) user record could not become a [`User`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The payload is not valid JSON.
    #[error("malformed user record: {0}")]
    Malformed(String),

    /// The payload is JSON but lacks required structure.
    #[error("invalid user record: {0}")]
    Invalid(String),
}

impl From<DomainError> for RecordError {
    fn from(value: DomainError) -> Self {
        Self::Invalid(value.to_string())
    }
}

/// Decode a persisted user payload.
pub fn decode_user(raw: &str) -> Result<User, RecordError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| RecordError::Malformed(e.to_string()))?;

    decode_user_value(value)
}

/// Decode an already-parsed user payload (stored or received from the backend).
pub fn decode_user_value(value: serde_json::Value) -> Result<User, RecordError> {
    if !value.is_object() {
        return Err(RecordError::Invalid("user record is not an object".to_string()));
    }

    let record: UserRecord =
        serde_json::from_value(value).map_err(|e| RecordError::Invalid(e.to_string()))?;

    Ok(User::try_from(record)?)
}

/// Encode a user for durable storage.
pub fn encode_user(user: &User) -> Result<String, RecordError> {
    serde_json::to_string(user).map_err(|e| RecordError::Invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_are_malformed() {
        assert!(matches!(decode_user("{not json"), Err(RecordError::Malformed(_))));
    }

    #[test]
    fn non_objects_are_invalid() {
        assert!(matches!(decode_user("[1,2,3]"), Err(RecordError::Invalid(_))));
        assert!(matches!(decode_user("null"), Err(RecordError::Invalid(_))));
    }

    #[test]
    fn missing_required_fields_are_invalid() {
        let raw = r#"{"id":"1","email":"a@b.c","role":{"name":"Dev","permissions":[]}}"#;
        let err = decode_user(raw).unwrap_err();

        assert!(matches!(err, RecordError::Invalid(_)));
        assert!(err.to_string().contains("startDate"));
    }

    #[test]
    fn wrongly_shaped_permissions_are_invalid() {
        let raw = r#"{"id":"1","email":"a@b.c","startDate":"2024-01-01","role":{"name":"Dev","permissions":42}}"#;
        assert!(matches!(decode_user(raw), Err(RecordError::Invalid(_))));
    }
}
