use chrono::{TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

use invoice_history::{
    HistoryError, KeyEvent, KeyboardHub, ListStatus, Operation, SwitchOutcome, ThreadHistory,
    VisibilityController,
};
use invoice_persist::{InMemoryThreadStore, StoreOperation};
use invoice_types::{HistoryEvent, Thread, ThreadId};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn seeded() -> (InMemoryThreadStore, ThreadHistory) {
    init_tracing();
    let created = Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap();
    let store = InMemoryThreadStore::with_threads(vec![
        Thread::new("1", created).with_name("Acme Invoice"),
        Thread::new("2", created).with_name("Bolt Corp"),
    ]);
    let history = ThreadHistory::new(Arc::new(store.clone()));
    (store, history)
}

fn shown_ids(history: &ThreadHistory) -> Vec<String> {
    history
        .view()
        .rows
        .into_iter()
        .map(|row| row.id.to_string())
        .collect()
}

#[tokio::test]
async fn test_search_filters_loaded_threads() {
    let (_store, history) = seeded();
    assert_ok!(history.list_threads().await);

    history.set_search_query("acme");
    assert_eq!(shown_ids(&history), vec!["1"]);

    history.set_search_query("");
    assert_eq!(shown_ids(&history), vec!["1", "2"]);

    history.set_search_query("zzz");
    let view = history.view();
    assert!(view.rows.is_empty());
    assert_eq!(view.status, ListStatus::NoMatches);
}

#[tokio::test]
async fn test_empty_store_reports_empty_history() {
    init_tracing();
    let history = ThreadHistory::new(Arc::new(InMemoryThreadStore::new()));
    assert_eq!(history.view().status, ListStatus::Empty);

    assert_ok!(history.list_threads().await);
    assert_eq!(history.view().status, ListStatus::Empty);
}

#[tokio::test]
async fn test_listing_twice_is_idempotent() {
    let (_store, history) = seeded();

    let first = assert_ok!(history.list_threads().await);
    let second = assert_ok!(history.list_threads().await);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_create_refetches_and_activates() {
    let (store, history) = seeded();
    let chat = VisibilityController::default();
    let _observer = history.add_observer(Arc::new(chat.clone()));
    let mut events = history.subscribe();

    let thread = assert_ok!(history.create_thread().await);

    assert!(history.threads().iter().any(|t| t.id == thread.id));
    assert_eq!(history.active_thread_id(), Some(thread.id.clone()));
    assert_eq!(store.calls(StoreOperation::List), 1);
    assert!(chat.is_open());
    assert!(!history.is_creating());

    let mut activated = false;
    while let Ok(event) = events.try_recv() {
        if event == (HistoryEvent::ThreadActivated { thread_id: thread.id.clone() }) {
            activated = true;
        }
    }
    assert!(activated);
}

#[tokio::test]
async fn test_failed_create_leaves_state_unchanged() {
    let (store, history) = seeded();
    assert_ok!(history.list_threads().await);
    store.fail_next(StoreOperation::Create, 1);

    let err = assert_err!(history.create_thread().await);
    assert!(matches!(err, HistoryError::CreateFailed(_)));
    assert_eq!(history.threads().len(), 2);
    assert_eq!(history.active_thread_id(), None);
    assert!(!history.is_creating());
    assert_eq!(history.last_fault().unwrap().operation, Operation::Create);

    // Gate is released after a failure
    assert_ok!(history.create_thread().await);
}

#[tokio::test]
async fn test_create_still_activates_when_refetch_fails() {
    let (store, history) = seeded();
    store.fail_next(StoreOperation::List, 1);

    let thread = assert_ok!(history.create_thread().await);
    assert_eq!(history.active_thread_id(), Some(thread.id.clone()));
    assert!(history.fetch_error().is_some());

    assert_ok!(history.list_threads().await);
    assert_eq!(history.active_thread_id(), Some(thread.id));
    assert!(history.fetch_error().is_none());
}

#[tokio::test]
async fn test_concurrent_create_is_rejected_locally() {
    let (store, history) = seeded();
    store.delay_next(StoreOperation::Create, Duration::from_millis(50));

    let (first, second) = tokio::join!(history.create_thread(), history.create_thread());

    assert_ok!(first);
    assert!(matches!(second, Err(HistoryError::CreateInFlight)));
    assert_eq!(store.calls(StoreOperation::Create), 1);
    assert_eq!(store.snapshot().len(), 3);
}

#[tokio::test]
async fn test_stale_list_response_does_not_overwrite_newer() {
    let (store, history) = seeded();
    store.delay_next(StoreOperation::List, Duration::from_millis(100));

    let newer = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.insert(Thread::new("3", Utc::now()).with_name("Cobalt"));
        history.list_threads().await
    };
    let (slow, fast) = tokio::join!(history.list_threads(), newer);

    assert_eq!(assert_ok!(fast).len(), 3);
    // The slow response saw two threads but was dropped on arrival
    assert_eq!(assert_ok!(slow).len(), 3);
    assert_eq!(history.threads().len(), 3);
}

#[tokio::test]
async fn test_stale_failed_fetch_is_silent() {
    let (store, history) = seeded();
    store.delay_next(StoreOperation::List, Duration::from_millis(100));
    store.fail_next(StoreOperation::List, 1);
    let mut events = history.subscribe();

    let newer = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        history.list_threads().await
    };
    let (slow, fast) = tokio::join!(history.list_threads(), newer);

    assert_eq!(assert_ok!(fast).len(), 2);
    // The slow response failed after the newer one was applied
    assert_eq!(assert_ok!(slow).len(), 2);
    assert!(history.fetch_error().is_none());
    assert!(history.view().error.is_none());

    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, HistoryEvent::FetchFailed { .. }));
    }
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_collection() {
    let (store, history) = seeded();
    assert_ok!(history.list_threads().await);
    store.fail_next(StoreOperation::List, 1);

    let err = assert_err!(history.list_threads().await);
    assert!(matches!(err, HistoryError::FetchFailed(_)));

    let view = history.view();
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.status, ListStatus::Ready);
    assert!(view.error.is_some());
}

#[tokio::test]
async fn test_switch_is_local_and_opens_chat() {
    let (store, history) = seeded();
    let chat = VisibilityController::default();
    let _observer = history.add_observer(Arc::new(chat.clone()));
    assert_ok!(history.list_threads().await);

    assert_eq!(history.switch_thread(&ThreadId::new("2")), SwitchOutcome::Switched);
    assert_eq!(history.active_thread().unwrap().display_name(), "Bolt Corp");
    assert!(chat.is_open());
    assert_eq!(store.calls(StoreOperation::List), 1);

    let active: Vec<_> = history.view().rows.iter().map(|row| row.is_active).collect();
    assert_eq!(active, vec![false, true]);
}

#[tokio::test]
async fn test_dropped_observer_guard_unregisters() {
    let (_store, history) = seeded();
    assert_ok!(history.list_threads().await);
    let chat = VisibilityController::default();

    let guard = history.add_observer(Arc::new(chat.clone()));
    assert_eq!(history.observer_count(), 1);
    drop(guard);
    assert_eq!(history.observer_count(), 0);

    history.switch_thread(&ThreadId::new("2"));
    assert!(!chat.is_open());

    // Registering again after teardown does not accumulate observers
    let _observer = history.add_observer(Arc::new(chat.clone()));
    assert_eq!(history.observer_count(), 1);
    history.switch_thread(&ThreadId::new("1"));
    assert!(chat.is_open());
}

#[tokio::test]
async fn test_switch_to_unknown_thread_is_noop() {
    let (_store, history) = seeded();
    assert_ok!(history.list_threads().await);
    history.switch_thread(&ThreadId::new("1"));
    let mut events = history.subscribe();

    assert_eq!(history.switch_thread(&ThreadId::new("nonexistent")), SwitchOutcome::Noop);
    assert_eq!(history.active_thread_id(), Some(ThreadId::new("1")));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_empty_rename_makes_no_network_call() {
    let (store, history) = seeded();
    assert_ok!(history.list_threads().await);

    let err = assert_err!(history.rename_thread(&ThreadId::new("1"), "").await);
    assert!(matches!(err, HistoryError::EmptyName));
    assert!(matches!(
        history.rename_thread(&ThreadId::new("1"), "   ").await,
        Err(HistoryError::EmptyName)
    ));

    assert_eq!(store.calls(StoreOperation::Rename), 0);
    assert_eq!(store.calls(StoreOperation::List), 1);
    assert_eq!(history.threads()[0].display_name(), "Acme Invoice");
}

#[tokio::test]
async fn test_submit_edit_renames_and_leaves_edit_mode() {
    let (store, history) = seeded();
    assert_ok!(history.list_threads().await);

    assert!(history.begin_edit(&ThreadId::new("2")));
    assert_eq!(history.view().edit_buffer.as_deref(), Some("Bolt Corp"));
    history.update_edit_buffer("  Bolt Corporation ");

    assert_ok!(history.submit_edit().await);
    assert!(history.edit().is_none());
    assert_eq!(history.threads()[1].display_name(), "Bolt Corporation");
    assert_eq!(store.calls(StoreOperation::List), 2);
}

#[tokio::test]
async fn test_failed_rename_keeps_buffer() {
    let (store, history) = seeded();
    assert_ok!(history.list_threads().await);
    history.begin_edit(&ThreadId::new("1"));
    history.update_edit_buffer("Acme Q4");
    store.fail_next(StoreOperation::Rename, 1);

    let err = assert_err!(history.submit_edit().await);
    assert!(matches!(err, HistoryError::RenameFailed { ref thread_id, .. } if thread_id.as_str() == "1"));

    let edit = history.edit().unwrap();
    assert_eq!(edit.buffer, "Acme Q4");
    assert_eq!(history.threads()[0].display_name(), "Acme Invoice");
    assert_eq!(history.last_fault().unwrap().operation, Operation::Rename);
}

#[tokio::test]
async fn test_rename_with_failed_refetch_stays_in_edit_mode() {
    let (store, history) = seeded();
    assert_ok!(history.list_threads().await);
    history.begin_edit(&ThreadId::new("1"));
    history.update_edit_buffer("Acme Q4");
    store.fail_next(StoreOperation::List, 1);

    assert!(matches!(history.submit_edit().await, Err(HistoryError::FetchFailed(_))));
    assert_eq!(history.edit().unwrap().buffer, "Acme Q4");
}

#[tokio::test]
async fn test_dismiss_edit_never_saves() {
    let (store, history) = seeded();
    assert_ok!(history.list_threads().await);
    history.begin_edit(&ThreadId::new("1"));
    history.update_edit_buffer("Changed");

    history.dismiss_edit();
    assert!(history.edit().is_none());
    assert!(!history.update_edit_buffer("ignored"));
    assert!(matches!(history.submit_edit().await, Err(HistoryError::NoEditInProgress)));
    assert_eq!(store.calls(StoreOperation::Rename), 0);
}

#[tokio::test]
async fn test_generate_thread_name_refetches() {
    let (store, history) = seeded();
    let thread = assert_ok!(history.create_thread().await);
    assert_eq!(history.active_thread().unwrap().display_name(), "Untitled Invoice");

    let named = assert_ok!(history.generate_thread_name(&thread.id).await);
    assert!(named.name().is_some());
    assert_eq!(history.active_thread().unwrap().name(), named.name());
    assert_eq!(store.calls(StoreOperation::List), 2);
}

#[tokio::test]
async fn test_collapse_and_search_affordance() {
    let (_store, history) = seeded();

    assert_eq!(history.layout().width, "18rem");
    assert!(history.toggle_collapsed());
    assert_eq!(history.layout().css_variable(), ("--sidebar-width", "4rem"));

    assert!(history.expand_for_search());
    assert!(!history.is_collapsed());
    assert!(history.take_search_focus());
}

#[test]
fn test_shortcut_does_not_double_toggle_across_remounts() {
    let hub = KeyboardHub::new();
    let chat = VisibilityController::default();
    let chord = KeyEvent::new("k").with_meta();

    let first = chat.mount(&hub).expect("first mount attaches");
    assert!(chat.mount(&hub).is_none());
    assert_eq!(hub.dispatch(&chord), 1);
    assert!(chat.is_open());

    drop(first);
    assert_eq!(hub.listener_count(), 0);
    assert_eq!(hub.dispatch(&chord), 0);
    assert!(chat.is_open());

    let _second = chat.mount(&hub).expect("remount after teardown");
    assert_eq!(hub.listener_count(), 1);
    assert_eq!(hub.dispatch(&chord), 1);
    assert!(!chat.is_open());
}
