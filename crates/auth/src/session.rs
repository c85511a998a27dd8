//! Session store: the single source of truth for "who is logged in".
//!
//! # Invariants
//! - A token is present iff a user is present ([`Session`] cannot hold one
//!   without the other).
//! - Only `initialize`, `login`, `refresh` and `logout` write the session or the
//!   persisted session keys.
//! - Parsing/transformation failures never escape: they resolve to a cleared
//!   session (plus a deferred login redirect when a stored session was unusable).
//!   Only backend rejections of `login`/`refresh` are surfaced to callers.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::backend::{ApiError, AuthBackend, AuthResponse, AuthToken, Credentials};
use crate::evaluate::{PermissionQuery, PermissionSet};
use crate::navigation::{AuthPaths, NavigationRequest, Navigator};
use crate::permissions::Permission;
use crate::record::{decode_user, decode_user_value, encode_user, RecordError, TOKEN_KEY, USER_KEY};
use crate::roles::Role;
use crate::storage::{DurableStorage, StorageError};
use crate::user::User;

// ─────────────────────────────────────────────────────────────────────────────
// Session snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Token and user, always together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    token: AuthToken,
    user: User,
}

impl AuthSession {
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}

/// Immutable snapshot of the session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    auth: Option<AuthSession>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: AuthToken, user: User) -> Self {
        Self {
            auth: Some(AuthSession { token, user }),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    pub fn auth(&self) -> Option<&AuthSession> {
        self.auth.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.auth.as_ref().map(|a| &a.user)
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.auth.as_ref().map(|a| &a.token)
    }

    pub fn user_role(&self) -> Option<&Role> {
        self.user().map(|u| &u.role)
    }

    pub fn user_permissions(&self) -> &[Permission] {
        self.user_role()
            .map(|r| r.permissions.as_slice())
            .unwrap_or(&[])
    }

    pub fn permission_set(&self) -> PermissionSet {
        PermissionSet::from(self.user_permissions())
    }
}

impl PermissionQuery for Session {
    fn has_permission(&self, name: &str) -> bool {
        self.user_role().is_some_and(|role| role.has_permission(name))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors / outcomes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("authentication failed: {0}")]
    Backend(#[from] ApiError),

    #[error("unusable user data: {0}")]
    InvalidUser(#[from] RecordError),

    #[error("authentication response carried no token")]
    MissingToken,

    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("no active session")]
    NotAuthenticated,
}

/// Result of reading the persisted session at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing (or only a stray fragment) was stored.
    Empty,
    /// A complete, valid session was restored.
    Restored,
    /// A stored session existed but was unusable; a login redirect was deferred.
    Discarded(SessionError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Change notification
// ─────────────────────────────────────────────────────────────────────────────

type Listener = Rc<dyn Fn(&Session)>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Handle for a session-change listener; dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes the listener"]
pub struct SessionSubscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl core::fmt::Debug for SessionSubscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionSubscription").field("id", &self.id).finish()
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

struct StoreInner {
    session: RefCell<Rc<Session>>,
    storage: Rc<dyn DurableStorage>,
    navigator: Rc<dyn Navigator>,
    backend: Rc<dyn AuthBackend>,
    paths: AuthPaths,
    deferred: RefCell<VecDeque<NavigationRequest>>,
    listeners: Rc<RefCell<Listeners>>,
}

/// Single-writer session container, cheap to clone and share with consumers.
///
/// Not `Send`: the console runs on one event loop and every read is a
/// synchronous snapshot, so there is no read/write race within a turn.
#[derive(Clone)]
pub struct SessionStore {
    inner: Rc<StoreInner>,
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.session())
            .field("paths", &self.inner.paths)
            .field("deferred", &self.inner.deferred.borrow().len())
            .finish()
    }
}

impl SessionStore {
    /// Create an empty store. Call [`SessionStore::initialize`] to read storage.
    pub fn new(
        storage: Rc<dyn DurableStorage>,
        navigator: Rc<dyn Navigator>,
        backend: Rc<dyn AuthBackend>,
        paths: AuthPaths,
    ) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                session: RefCell::new(Rc::new(Session::anonymous())),
                storage,
                navigator,
                backend,
                paths,
                deferred: RefCell::new(VecDeque::new()),
                listeners: Rc::new(RefCell::new(Listeners::default())),
            }),
        }
    }

    /// Create a store and immediately restore the persisted session.
    pub fn restore(
        storage: Rc<dyn DurableStorage>,
        navigator: Rc<dyn Navigator>,
        backend: Rc<dyn AuthBackend>,
        paths: AuthPaths,
    ) -> Self {
        let store = Self::new(storage, navigator, backend, paths);
        let outcome = store.initialize();
        tracing::debug!(?outcome, "session store initialized");
        store
    }

    /// Read the persisted record.
    ///
    /// Absent (or half-present) records yield an empty session and no redirect.
    /// Unreadable, malformed or structurally invalid records are cleared and a
    /// login redirect is queued for the next [`SessionStore::run_deferred`].
    pub fn initialize(&self) -> RestoreOutcome {
        let storage = &self.inner.storage;
        let (token, raw_user) = match (storage.get(TOKEN_KEY), storage.get(USER_KEY)) {
            (Ok(token), Ok(user)) => (
                token.filter(|t| !t.is_empty()),
                user.filter(|u| !u.is_empty()),
            ),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "failed to read persisted session");
                return self.discard(SessionError::Storage(e));
            }
        };

        let (Some(token), Some(raw_user)) = (token, raw_user) else {
            self.clear_state();
            return RestoreOutcome::Empty;
        };

        match decode_user(&raw_user) {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "restored persisted session");
                self.replace(Session::authenticated(AuthToken::new(token), user));
                RestoreOutcome::Restored
            }
            Err(e) => {
                tracing::error!(error = %e, "discarding corrupt persisted session");
                self.discard(SessionError::InvalidUser(e))
            }
        }
    }

    /// Authenticate through the backend and replace the session wholesale.
    ///
    /// Backend failures leave the session untouched. A response whose user
    /// cannot be transformed clears the session.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, SessionError> {
        let backend = Rc::clone(&self.inner.backend);
        let response = backend.login(credentials).await.map_err(|e| {
            tracing::warn!(code = %e.code, "login rejected");
            SessionError::Backend(e)
        })?;

        self.establish(response)
    }

    /// Re-issue the session with the current token.
    pub async fn refresh(&self) -> Result<User, SessionError> {
        let token = self.auth_token().ok_or(SessionError::NotAuthenticated)?;

        let backend = Rc::clone(&self.inner.backend);
        let response = backend.refresh(&token).await.map_err(|e| {
            tracing::warn!(code = %e.code, "session refresh rejected");
            SessionError::Backend(e)
        })?;

        self.establish(response)
    }

    /// Clear memory and storage, then navigate to the login screen.
    ///
    /// Safe to call when already logged out.
    pub fn logout(&self) {
        let was_authenticated = self.is_authenticated();
        self.clear_state();
        tracing::info!(was_authenticated, "logged out");
        self.inner.navigator.navigate(self.inner.paths.login());
    }

    /// Current snapshot.
    pub fn session(&self) -> Rc<Session> {
        Rc::clone(&self.inner.session.borrow())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session().user().cloned()
    }

    pub fn auth_token(&self) -> Option<AuthToken> {
        self.session().token().cloned()
    }

    pub fn paths(&self) -> &AuthPaths {
        &self.inner.paths
    }

    pub fn navigator(&self) -> Rc<dyn Navigator> {
        Rc::clone(&self.inner.navigator)
    }

    /// Register a listener fired after every session transition.
    pub fn subscribe(&self, listener: impl Fn(&Session) + 'static) -> SessionSubscription {
        let mut listeners = self.inner.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Rc::new(listener)));

        SessionSubscription {
            id,
            listeners: Rc::downgrade(&self.inner.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().entries.len()
    }

    /// Issue navigations deferred during construction. Returns how many ran.
    ///
    /// Hosts call this on the tick after the store is built.
    pub fn run_deferred(&self) -> usize {
        let pending: Vec<NavigationRequest> = self.inner.deferred.borrow_mut().drain(..).collect();
        let count = pending.len();
        for request in pending {
            self.inner.navigator.navigate(request);
        }
        count
    }

    pub fn pending_navigations(&self) -> usize {
        self.inner.deferred.borrow().len()
    }

    fn establish(&self, response: AuthResponse) -> Result<User, SessionError> {
        let AuthResponse { token, user } = response;

        let result = if token.trim().is_empty() {
            Err(SessionError::MissingToken)
        } else {
            decode_user_value(user)
                .map_err(SessionError::InvalidUser)
                .and_then(|user| self.persist(&token, &user).map(|()| user))
        };

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "session established");
                self.replace(Session::authenticated(AuthToken::new(token), user.clone()));
                Ok(user)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to establish session");
                self.clear_state();
                Err(e)
            }
        }
    }

    fn persist(&self, token: &str, user: &User) -> Result<(), SessionError> {
        let raw = encode_user(user)?;
        self.inner.storage.set(TOKEN_KEY, token)?;
        self.inner.storage.set(USER_KEY, &raw)?;
        Ok(())
    }

    fn discard(&self, reason: SessionError) -> RestoreOutcome {
        self.clear_state();
        self.inner.deferred.borrow_mut().push_back(self.inner.paths.login());
        RestoreOutcome::Discarded(reason)
    }

    fn clear_state(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.inner.storage.remove(key) {
                tracing::warn!(key, error = %e, "failed to clear persisted session key");
            }
        }
        self.replace(Session::anonymous());
    }

    fn replace(&self, next: Session) {
        let changed = {
            let mut current = self.inner.session.borrow_mut();
            if **current == next {
                false
            } else {
                *current = Rc::new(next);
                true
            }
        };

        if changed {
            self.notify();
        }
    }

    fn notify(&self) {
        let snapshot = self.session();
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();

        for listener in listeners {
            listener(&snapshot);
        }
    }
}

impl PermissionQuery for SessionStore {
    fn has_permission(&self, name: &str) -> bool {
        self.session().has_permission(name)
    }
}
