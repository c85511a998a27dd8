//! End-to-end session scenarios through the public API: a restored or freshly
//! established session driving the guards and the permission evaluator.

use std::rc::Rc;

use async_trait::async_trait;

use staffdesk_auth::{
    explain_access, ApiError, AuthBackend, AuthPaths, AuthResponse, AuthToken, Credentials,
    DurableStorage, FileStorage, HistoryNavigator, MemoryStorage, PermissionQuery,
    RestoreOutcome, RouteGuards, SessionStore,
};

fn user(permissions: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "id": 7,
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "department": "Engineering",
        "role": {
            "id": "r1",
            "name": "Manager",
            "permissions": permissions
        },
        "startDate": "2024-03-01",
        "status": "active"
    })
}

struct StaticBackend(serde_json::Value);

#[async_trait(?Send)]
impl AuthBackend for StaticBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        if credentials.password != "secret" {
            return Err(ApiError::status(401, "Invalid credentials"));
        }
        serde_json::from_value(serde_json::json!({ "token": "t-1", "user": self.0 }))
            .map_err(|e| ApiError::client(e.to_string()))
    }

    async fn refresh(&self, _token: &AuthToken) -> Result<AuthResponse, ApiError> {
        serde_json::from_value(serde_json::json!({ "token": "t-2", "user": self.0 }))
            .map_err(|e| ApiError::client(e.to_string()))
    }
}

fn store_with(
    storage: Rc<MemoryStorage>,
    permissions: &[&str],
) -> (SessionStore, Rc<HistoryNavigator>) {
    let navigator = Rc::new(HistoryNavigator::new());
    let store = SessionStore::new(
        storage,
        navigator.clone(),
        Rc::new(StaticBackend(user(permissions))),
        AuthPaths::default(),
    );
    (store, navigator)
}

#[tokio::test]
async fn login_persists_and_survives_a_reload() {
    let storage = Rc::new(MemoryStorage::new());
    let (store, _) = store_with(storage.clone(), &["view_employees"]);

    let user = store
        .login(&Credentials::new("ada@example.com", "secret"))
        .await
        .unwrap();
    assert_eq!(user.full_name(), "Ada Lovelace");
    assert_eq!(storage.get("auth_token").unwrap().as_deref(), Some("t-1"));

    let (reloaded, navigator) = store_with(storage, &[]);
    assert_eq!(reloaded.initialize(), RestoreOutcome::Restored);
    assert!(reloaded.has_permission("view_employees"));
    assert!(!reloaded.has_permission("manage_roles"));
    assert_eq!(reloaded.auth_token().map(|t| t.as_str().to_string()).as_deref(), Some("t-1"));
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn rejected_login_keeps_the_existing_session() {
    let storage = Rc::new(MemoryStorage::new());
    let (store, _) = store_with(storage, &["view_employees"]);
    store.login(&Credentials::new("ada@example.com", "secret")).await.unwrap();

    let err = store
        .login(&Credentials::new("ada@example.com", "wrong"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Invalid credentials"));
    assert!(store.is_authenticated());
    assert!(store.has_permission("view_employees"));
}

#[test]
fn corrupt_record_redirects_only_after_the_deferred_tick() {
    let storage = Rc::new(MemoryStorage::with_entries([
        ("auth_token", "t-1"),
        ("user", "{not json"),
    ]));
    let (store, navigator) = store_with(storage.clone(), &[]);

    assert!(matches!(store.initialize(), RestoreOutcome::Discarded(_)));
    assert!(!store.is_authenticated());
    assert!(!store.has_permission("view_employees"));
    assert!(store.has_all_permissions::<&str>(&[]));
    assert!(storage.is_empty());
    assert!(navigator.history().is_empty());

    assert_eq!(store.run_deferred(), 1);
    assert_eq!(navigator.last().unwrap().path, "/auth/login");
}

#[tokio::test]
async fn guards_follow_the_session_through_login_and_logout() {
    let (store, navigator) = store_with(Rc::new(MemoryStorage::new()), &["view_employees"]);
    let guards = RouteGuards::new(store.clone());

    assert!(!guards.can_activate_authenticated("/employees?page=2"));
    let redirect = navigator.last().unwrap();
    assert_eq!(redirect.path, "/auth/login");
    assert_eq!(redirect.query_value("returnUrl"), Some("/employees?page=2"));

    store.login(&Credentials::new("ada@example.com", "secret")).await.unwrap();
    navigator.clear();

    assert!(guards.can_activate_authenticated("/dashboard"));
    assert!(guards.can_activate_with_permissions("/employees", &["view_employees"]));
    assert!(!guards.can_activate_with_permissions("/roles", &["manage_roles"]));
    assert_eq!(navigator.last().unwrap().path, "/unauthorized");

    let explanation = explain_access(&*store.session(), &["view_employees", "manage_roles"]);
    assert_eq!(explanation.missing, vec!["manage_roles".to_string()]);

    store.logout();
    assert_eq!(navigator.last().unwrap().path, "/auth/login");
    assert!(!store.has_any_permission(&["view_employees", "manage_roles"]));
}

#[tokio::test]
async fn refresh_replaces_the_token() {
    let storage = Rc::new(MemoryStorage::new());
    let (store, _) = store_with(storage.clone(), &["manage_roles"]);

    assert!(store.refresh().await.is_err());

    store.login(&Credentials::new("ada@example.com", "secret")).await.unwrap();
    store.refresh().await.unwrap();

    assert_eq!(storage.get("auth_token").unwrap().as_deref(), Some("t-2"));
    assert!(store.has_permission("manage_roles"));
}

#[tokio::test]
async fn garbage_session_file_is_reset_and_login_works_again() {
    let path = std::env::temp_dir().join(format!(
        "staffdesk-scenario-garbage-{}.json",
        std::process::id()
    ));
    std::fs::write(&path, "not json").unwrap();

    let navigator = Rc::new(HistoryNavigator::new());
    let store = SessionStore::new(
        Rc::new(FileStorage::new(&path)),
        navigator.clone(),
        Rc::new(StaticBackend(user(&["view_employees"]))),
        AuthPaths::default(),
    );

    assert!(matches!(store.initialize(), RestoreOutcome::Discarded(_)));
    assert_eq!(store.run_deferred(), 1);
    assert!(FileStorage::new(&path).get("user").unwrap().is_none());

    store.login(&Credentials::new("ada@example.com", "secret")).await.unwrap();
    assert!(store.has_permission("view_employees"));

    let reopened = FileStorage::new(&path);
    assert_eq!(reopened.get("auth_token").unwrap().as_deref(), Some("t-1"));

    let _ = std::fs::remove_file(&path);
}
