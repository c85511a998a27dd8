//! Persisted UI preferences.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use staffdesk_auth::DurableStorage;

pub const PREFERENCES_KEY: &str = "user_preferences";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub sidebar_collapsed: bool,
}

/// Preferences held in memory and written through to durable storage.
///
/// Load and save failures are logged and never surface: a broken record falls
/// back to defaults, a failed write keeps the previous value.
pub struct PreferencesStore {
    storage: Rc<dyn DurableStorage>,
    current: Cell<UserPreferences>,
}

impl PreferencesStore {
    pub fn load(storage: Rc<dyn DurableStorage>) -> Self {
        let current = match storage.get(PREFERENCES_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::error!(error = %e, "error loading preferences; using defaults");
                UserPreferences::default()
            }),
            Ok(None) => UserPreferences::default(),
            Err(e) => {
                tracing::error!(error = %e, "error loading preferences; using defaults");
                UserPreferences::default()
            }
        };

        Self {
            storage,
            current: Cell::new(current),
        }
    }

    pub fn get(&self) -> UserPreferences {
        self.current.get()
    }

    pub fn sidebar_collapsed(&self) -> bool {
        self.current.get().sidebar_collapsed
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.save(UserPreferences {
            sidebar_collapsed: collapsed,
            ..self.current.get()
        });
    }

    fn save(&self, prefs: UserPreferences) {
        let written = serde_json::to_string(&prefs)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                self.storage
                    .set(PREFERENCES_KEY, &raw)
                    .map_err(|e| e.to_string())
            });

        match written {
            Ok(()) => self.current.set(prefs),
            Err(e) => tracing::error!(error = %e, "error saving preferences"),
        }
    }
}

impl core::fmt::Debug for PreferencesStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PreferencesStore")
            .field("current", &self.current.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use staffdesk_auth::{MemoryStorage, StorageError};

    use super::*;

    struct ReadOnlyStorage;

    impl DurableStorage for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn defaults_when_nothing_stored() {
        let prefs = PreferencesStore::load(Rc::new(MemoryStorage::new()));
        assert!(!prefs.sidebar_collapsed());
    }

    #[test]
    fn stored_values_merge_over_defaults() {
        let storage = MemoryStorage::with_entries([(PREFERENCES_KEY, r#"{"sidebarCollapsed":true,"theme":"dark"}"#)]);
        assert!(PreferencesStore::load(Rc::new(storage)).sidebar_collapsed());

        let partial = MemoryStorage::with_entries([(PREFERENCES_KEY, "{}")]);
        assert!(!PreferencesStore::load(Rc::new(partial)).sidebar_collapsed());
    }

    #[test]
    fn corrupt_record_falls_back_to_defaults() {
        let storage = MemoryStorage::with_entries([(PREFERENCES_KEY, "{{{")]);
        assert_eq!(PreferencesStore::load(Rc::new(storage)).get(), UserPreferences::default());
    }

    #[test]
    fn toggling_writes_through() {
        let storage = Rc::new(MemoryStorage::new());
        let prefs = PreferencesStore::load(storage.clone());

        prefs.set_sidebar_collapsed(true);

        assert!(prefs.sidebar_collapsed());
        assert!(PreferencesStore::load(storage).sidebar_collapsed());
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let prefs = PreferencesStore::load(Rc::new(ReadOnlyStorage));
        prefs.set_sidebar_collapsed(true);
        assert!(!prefs.sidebar_collapsed());
    }
}
