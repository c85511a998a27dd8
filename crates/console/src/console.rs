//! Composition root: wires storage, navigation and the backend into the
//! session store and everything that reads it.

use std::rc::Rc;

use anyhow::Context;

use staffdesk_auth::{
    AuthBackend, DurableStorage, Navigator, RestoreOutcome, RouteGuards, SessionStore,
};

use crate::access::{AccessGate, Requirement, ViewSlot};
use crate::config::ConsoleConfig;
use crate::errors::ErrorHandler;
use crate::preferences::PreferencesStore;
use crate::routes::{RouteTable, Router};

/// Everything a view needs, built once at startup.
#[derive(Debug)]
pub struct Console {
    config: ConsoleConfig,
    store: SessionStore,
    router: Router,
    errors: ErrorHandler,
    preferences: PreferencesStore,
}

impl Console {
    /// Validate the configuration, build the services and restore the session.
    ///
    /// A discarded persisted session is not an error here; its login redirect
    /// is queued until the host calls [`SessionStore::run_deferred`].
    pub fn start(
        config: ConsoleConfig,
        storage: Rc<dyn DurableStorage>,
        navigator: Rc<dyn Navigator>,
        backend: Rc<dyn AuthBackend>,
    ) -> anyhow::Result<Self> {
        config.validate().context("invalid console configuration")?;

        let store = SessionStore::new(storage.clone(), navigator, backend, config.auth_paths());
        match store.initialize() {
            RestoreOutcome::Restored => tracing::info!("console started with restored session"),
            RestoreOutcome::Empty => tracing::info!("console started without session"),
            RestoreOutcome::Discarded(reason) => {
                tracing::warn!(%reason, "console started; stored session discarded")
            }
        }

        let router = Router::new(RouteTable::standard(&config), RouteGuards::new(store.clone()));
        let errors = ErrorHandler::new(store.clone());
        let preferences = PreferencesStore::load(storage);

        Ok(Self {
            config,
            store,
            router,
            errors,
            preferences,
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.store
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn errors(&self) -> &ErrorHandler {
        &self.errors
    }

    pub fn preferences(&self) -> &PreferencesStore {
        &self.preferences
    }

    /// Gate `slot` behind `requirement` for the lifetime of the returned gate.
    pub fn gate<V: ViewSlot + 'static>(
        &self,
        requirement: impl Into<Requirement>,
        slot: V,
    ) -> AccessGate<V> {
        AccessGate::new(&self.store, requirement, slot)
    }
}
