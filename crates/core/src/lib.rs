//! `staffdesk-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no storage, no transport).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{PermissionId, RoleId, UserId};
