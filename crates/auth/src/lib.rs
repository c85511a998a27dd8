//! `staffdesk-auth`: client-side session and authorization core.
//!
//! This crate is intentionally decoupled from HTTP, the router and the UI:
//! storage, navigation and the authentication backend are traits supplied by
//! the host.

pub mod backend;
pub mod catalog;
pub mod evaluate;
pub mod guards;
pub mod navigation;
pub mod permissions;
pub mod record;
pub mod roles;
pub mod session;
pub mod storage;
pub mod user;

pub use backend::{ApiError, AuthBackend, AuthResponse, AuthToken, Credentials, CLIENT_ERROR};
pub use catalog::{PermissionDefinition, RoleCatalog};
pub use evaluate::{explain_access, AccessExplanation, PermissionQuery, PermissionSet};
pub use guards::{check_authenticated, check_permissions, GuardDecision, RouteGuard, RouteGuards};
pub use navigation::{AuthPaths, HistoryNavigator, NavigationRequest, Navigator};
pub use permissions::{Permission, PermissionRecord};
pub use record::RecordError;
pub use roles::Role;
pub use session::{RestoreOutcome, Session, SessionError, SessionStore, SessionSubscription};
pub use storage::{DurableStorage, FileStorage, MemoryStorage, StorageError};
pub use user::{User, UserRecord, UserStatus};
