//! `staffdesk-console`
//!
//! **Responsibility:** the employee-management admin console around the
//! session/authorization core.
//!
//! This crate provides:
//! - Permission-gated view fragments ([`access`])
//! - The application route table and guard-aware resolution ([`routes`])
//! - API error presentation, UI preferences and configuration
//! - An HTTP auth backend (feature `http`)
//! - The Leptos frontend (wasm32 with feature `http`)
//! - The `staffdesk` headless binary (native with feature `http`)

pub mod access;
pub mod config;
pub mod console;
pub mod errors;
pub mod http;
pub mod preferences;
pub mod routes;

#[cfg(all(target_arch = "wasm32", feature = "http"))]
pub mod frontend;

pub use access::{AccessGate, Requirement, ViewSlot};
pub use config::ConsoleConfig;
pub use console::Console;
pub use errors::{user_message, ErrorHandler};
#[cfg(feature = "http")]
pub use http::HttpAuthBackend;
pub use http::request_headers;
pub use preferences::{PreferencesStore, UserPreferences};
pub use routes::{AppRoute, NavItem, Page, Resolution, RouteTable, Router};
