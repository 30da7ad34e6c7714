use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

use invoice_api::{build_router, config::Config, state::AppState};
use invoice_history::{HistoryError, SwitchOutcome, ThreadHistory, VisibilityController};
use invoice_persist::{HttpThreadStore, InMemoryThreadStore, PersistError, ThreadStore};
use invoice_types::ThreadId;

fn test_config() -> Config {
    toml::from_str(
        r#"
        [server]
        host = "127.0.0.1"
        port = 0
    "#,
    )
    .unwrap()
}

async fn spawn_server(store: InMemoryThreadStore) -> SocketAddr {
    let state = Arc::new(AppState::new(test_config(), Arc::new(store)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    addr
}

fn client(addr: SocketAddr) -> HttpThreadStore {
    HttpThreadStore::new(format!("http://{}", addr), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_http_store_round_trip() {
    let backing = InMemoryThreadStore::new();
    let store = client(spawn_server(backing.clone()).await);

    let created = assert_ok!(store.create_thread().await);
    assert!(created.name.is_none());

    assert_ok!(store.rename_thread(&created.id, "  Acme Invoice ").await);
    let fetched = assert_ok!(store.get_thread(&created.id).await).unwrap();
    assert_eq!(fetched.name.as_deref(), Some("Acme Invoice"));

    let listed = assert_ok!(store.list_threads().await);
    assert_eq!(listed, backing.snapshot());

    let named = assert_ok!(store.generate_thread_name(&created.id).await);
    assert!(named.name.unwrap().starts_with("Invoice chat "));
}

#[tokio::test]
async fn test_http_store_maps_missing_threads() {
    let store = client(spawn_server(InMemoryThreadStore::new()).await);
    let missing = ThreadId::new("missing");

    assert_eq!(assert_ok!(store.get_thread(&missing).await), None);

    let err = assert_err!(store.rename_thread(&missing, "Name").await);
    assert!(matches!(err, PersistError::ThreadNotFound(id) if id == "missing"));
}

#[tokio::test]
async fn test_blank_rename_rejected_by_service() {
    let addr = spawn_server(InMemoryThreadStore::new()).await;

    let response = reqwest::Client::new()
        .patch(format!("http://{}/threads/any", addr))
        .json(&serde_json::json!({ "name": "  " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_controller_over_http() {
    let store = client(spawn_server(InMemoryThreadStore::new()).await);
    let history = ThreadHistory::new(Arc::new(store));
    let chat = VisibilityController::default();
    let _observer = history.add_observer(Arc::new(chat.clone()));

    let first = assert_ok!(history.create_thread().await);
    let second = assert_ok!(history.create_thread().await);
    assert_eq!(history.active_thread_id(), Some(second.id.clone()));
    assert!(chat.is_open());

    assert_ok!(history.rename_thread(&first.id, "Bolt Corp").await);
    assert!(matches!(
        history.rename_thread(&first.id, "").await,
        Err(HistoryError::EmptyName)
    ));

    chat.close();
    assert_eq!(history.switch_thread(&first.id), SwitchOutcome::Switched);
    assert!(chat.is_open());

    history.set_search_query("bolt");
    let rows = history.view().rows;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_active);
    assert_eq!(rows[0].display_name, "Bolt Corp");
}
