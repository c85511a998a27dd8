//! Browser-backed implementations of the storage and navigation capabilities.

use leptos::{RwSignal, SignalSet};

use staffdesk_auth::{DurableStorage, NavigationRequest, Navigator, StorageError};

/// `window.localStorage`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserStorage;

fn local_storage() -> Result<web_sys::Storage, StorageError> {
    let window = web_sys::window()
        .ok_or_else(|| StorageError::Unavailable("no window object".to_string()))?;
    window
        .local_storage()
        .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
        .ok_or_else(|| StorageError::Unavailable("localStorage is disabled".to_string()))
}

impl DurableStorage for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        local_storage()?
            .get_item(key)
            .map_err(|e| StorageError::Io(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        local_storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Io(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        local_storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Io(format!("{e:?}")))
    }
}

/// Hands navigation requests to the router through a signal; a component
/// inside `<Router>` performs them.
#[derive(Debug, Clone, Copy)]
pub struct SignalNavigator(pub RwSignal<Option<NavigationRequest>>);

impl Navigator for SignalNavigator {
    fn navigate(&self, request: NavigationRequest) {
        self.0.set(Some(request));
    }
}

/// `path?key=value&...` with URI-encoded query values.
pub fn to_href(request: &NavigationRequest) -> String {
    if request.query.is_empty() {
        return request.path.clone();
    }

    let query: Vec<String> = request
        .query
        .iter()
        .map(|(k, v)| {
            let k: String = js_sys::encode_uri_component(k).into();
            let v: String = js_sys::encode_uri_component(v).into();
            format!("{k}={v}")
        })
        .collect();
    format!("{}?{}", request.path, query.join("&"))
}
