//! The authenticated user snapshot and its decoding boundary.
//!
//! A [`User`] is only ever produced from a [`UserRecord`] (backend response or
//! persisted record) through `TryFrom`, so every `User` in memory has passed the
//! structural checks: a parseable start date and a role with a permission list.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use staffdesk_core::{DomainError, DomainResult, UserId};

use crate::roles::{Role, RoleRecord};

// ─────────────────────────────────────────────────────────────────────────────
// User Status
// ─────────────────────────────────────────────────────────────────────────────

/// Employment status of the logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Inactive => write!(f, "inactive"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable snapshot of the logged-in user.
///
/// Owned by the session and replaced wholesale on login/refresh; never
/// partially mutated. Serializes to the same camelCase shape the backend sends,
/// which is also the persisted record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
    pub role: Role,
    pub start_date: DateTime<Utc>,
    pub status: UserStatus,
}

impl User {
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => self.email.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire / persisted shape
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier as sent by the backend: mock servers mix strings and numbers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    pub fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// User as it appears in an auth response or in durable storage.
///
/// Fields whose absence makes the record unusable are `Option` here so the
/// conversion can report which one is missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: RawId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub role: Option<RoleRecord>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
}

impl TryFrom<UserRecord> for User {
    type Error = DomainError;

    fn try_from(record: UserRecord) -> DomainResult<Self> {
        let start_date = record
            .start_date
            .as_deref()
            .ok_or_else(|| DomainError::validation("user record has no startDate"))
            .and_then(parse_start_date)?;

        let role = record
            .role
            .ok_or_else(|| DomainError::validation("user record has no role"))
            .and_then(Role::try_from)?;

        Ok(User {
            id: UserId::new(record.id.into_string()),
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            department: record.department,
            role,
            start_date,
            status: record.status,
        })
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (taken as midnight UTC).
fn parse_start_date(raw: &str) -> DomainResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| DomainError::validation(format!("invalid startDate '{raw}'")))
}
