use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

use invoice_persist::ThreadStore;
use invoice_types::{HistoryConfig, HistoryEvent, Thread, ThreadId};

use crate::error::{HistoryError, Result};
use crate::state::{EditState, Fault, FetchOutcome, HistoryState, Operation, Selection};
use crate::view::{SidebarLayout, ThreadListView};

/// Collaborator told whenever a thread becomes active through create or switch
///
/// The chat surface uses this to open itself, so starting or resuming a
/// conversation always shows it.
pub trait ThreadActivationObserver: Send + Sync {
    fn thread_activated(&self, thread_id: &ThreadId);
}

type Observers = RwLock<Vec<(u64, Arc<dyn ThreadActivationObserver>)>>;

/// Keeps an observer registered; dropping it unregisters the observer
#[must_use = "the observer is removed when the guard is dropped"]
pub struct ObserverGuard {
    id: u64,
    observers: Weak<Observers>,
}

impl ObserverGuard {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.write().retain(|(id, _)| *id != self.id);
            trace!(observer_id = self.id, "activation observer removed");
        }
    }
}

/// Outcome of [`ThreadHistory::switch_thread`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched,
    /// The id is not in the current collection; nothing changed
    Noop,
}

/// Shared handle onto the thread history state
///
/// Cloning is cheap and every clone observes the same state, so the list,
/// search box, new-thread button and chat surface can each hold one.
/// Local state is guarded by a synchronous lock that is never held across
/// an `.await`; only the store calls suspend.
#[derive(Clone)]
pub struct ThreadHistory {
    store: Arc<dyn ThreadStore>,
    config: Arc<HistoryConfig>,
    state: Arc<RwLock<HistoryState>>,
    observers: Arc<Observers>,
    next_observer_id: Arc<AtomicU64>,
    events: broadcast::Sender<HistoryEvent>,
}

// Clears the in-flight flag even if the create future is dropped mid-call
struct CreateGuard<'a> {
    state: &'a RwLock<HistoryState>,
}

impl Drop for CreateGuard<'_> {
    fn drop(&mut self) {
        self.state.write().end_create();
    }
}

impl ThreadHistory {
    pub fn new(store: Arc<dyn ThreadStore>) -> Self {
        Self::with_config(store, HistoryConfig::default())
    }

    pub fn with_config(store: Arc<dyn ThreadStore>, config: HistoryConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let state = HistoryState::new(&config);
        Self {
            store,
            config: Arc::new(config),
            state: Arc::new(RwLock::new(state)),
            observers: Arc::new(RwLock::new(Vec::new())),
            next_observer_id: Arc::new(AtomicU64::new(0)),
            events,
        }
    }

    /// Register an observer for as long as the returned guard lives
    pub fn add_observer(&self, observer: Arc<dyn ThreadActivationObserver>) -> ObserverGuard {
        let id = self.next_observer_id.fetch_add(1, Ordering::Relaxed);
        self.observers.write().push((id, observer));
        trace!(observer_id = id, "activation observer added");
        ObserverGuard {
            id,
            observers: Arc::downgrade(&self.observers),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    fn emit(&self, event: HistoryEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn notify_activated(&self, thread_id: &ThreadId) {
        let observers: Vec<_> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer.thread_activated(thread_id);
        }
        self.emit(HistoryEvent::ThreadActivated {
            thread_id: thread_id.clone(),
        });
    }

    fn fail(&self, operation: Operation, err: &invoice_persist::PersistError) {
        self.state.write().record_fault(operation, err);
        self.emit(HistoryEvent::OperationFailed {
            operation: operation.as_str().to_string(),
            message: err.to_string(),
        });
    }

    // Remote operations

    /// Fetch the full collection and replace the cached one
    ///
    /// Returns the collection in effect afterwards. A response that arrives
    /// after a newer one has been applied is dropped. On failure the previous
    /// collection stays and an inline error is recorded; nothing is retried.
    pub async fn list_threads(&self) -> Result<Vec<Thread>> {
        let ticket = self.state.write().begin_fetch();
        self.emit(HistoryEvent::Loading);

        let response = self.store.list_threads().await;

        let (outcome, active) = {
            let mut state = self.state.write();
            let outcome = state.finish_fetch(ticket, response);
            (outcome, state.active().cloned())
        };

        match outcome {
            Ok(FetchOutcome::Applied { count, active_changed }) => {
                debug!(ticket, count, "thread collection replaced");
                self.emit(HistoryEvent::ThreadsReplaced { count });
                if active_changed {
                    self.emit(HistoryEvent::ActiveChanged { thread_id: active });
                }
                Ok(self.threads())
            }
            Ok(FetchOutcome::Stale) => {
                debug!(ticket, "dropped stale thread list response");
                Ok(self.threads())
            }
            Err(err) => {
                warn!(ticket, error = %err, "failed to load threads");
                self.emit(HistoryEvent::FetchFailed {
                    message: err.to_string(),
                });
                Err(HistoryError::FetchFailed(err))
            }
        }
    }

    /// Create a thread, refetch, make it active and surface the chat
    ///
    /// A create issued while another is still in flight is rejected without
    /// contacting the store. If the refetch fails the thread is still
    /// activated, since the store confirmed it exists.
    pub async fn create_thread(&self) -> Result<Thread> {
        if !self.state.write().try_begin_create() {
            warn!("ignoring create request while another is in flight");
            return Err(HistoryError::CreateInFlight);
        }

        let created = {
            let _guard = CreateGuard { state: &self.state };
            self.store.create_thread().await
        };

        let thread = match created {
            Ok(thread) => thread,
            Err(err) => {
                error!(error = %err, "failed to create thread");
                self.fail(Operation::Create, &err);
                return Err(HistoryError::CreateFailed(err));
            }
        };
        info!(thread_id = %thread.id, "created thread");
        self.state.write().clear_fault(Operation::Create);

        if let Err(err) = self.list_threads().await {
            warn!(thread_id = %thread.id, error = %err, "created thread but refresh failed");
        }

        self.state.write().activate(thread.id.clone());
        self.emit(HistoryEvent::ActiveChanged {
            thread_id: Some(thread.id.clone()),
        });
        self.notify_activated(&thread.id);

        Ok(thread)
    }

    /// Rename a thread remotely, refetch, then leave rename mode
    ///
    /// Blank names are rejected before any network call. If either the
    /// rename or the refetch fails, rename mode stays open with its buffer.
    pub async fn rename_thread(&self, thread_id: &ThreadId, new_name: &str) -> Result<()> {
        let name = new_name.trim();
        if name.is_empty() {
            debug!(%thread_id, "rejected empty thread name");
            return Err(HistoryError::EmptyName);
        }

        if let Err(err) = self.store.rename_thread(thread_id, name).await {
            error!(%thread_id, error = %err, "failed to rename thread");
            self.fail(Operation::Rename, &err);
            return Err(HistoryError::RenameFailed {
                thread_id: thread_id.clone(),
                source: err,
            });
        }
        info!(%thread_id, name, "renamed thread");
        self.state.write().clear_fault(Operation::Rename);

        self.list_threads().await?;

        if self.state.write().finish_edit(thread_id) {
            self.emit(HistoryEvent::EditChanged { thread_id: None });
        }
        Ok(())
    }

    /// Rename the thread being edited using its pending buffer
    pub async fn submit_edit(&self) -> Result<()> {
        let edit = self.state.read().edit().cloned();
        let Some(EditState { thread_id, buffer }) = edit else {
            return Err(HistoryError::NoEditInProgress);
        };
        self.rename_thread(&thread_id, &buffer).await
    }

    /// Let the backend name the thread, then refetch
    pub async fn generate_thread_name(&self, thread_id: &ThreadId) -> Result<Thread> {
        let thread = match self.store.generate_thread_name(thread_id).await {
            Ok(thread) => thread,
            Err(err) => {
                error!(%thread_id, error = %err, "failed to generate thread name");
                self.fail(Operation::GenerateName, &err);
                return Err(HistoryError::NameGenerationFailed {
                    thread_id: thread_id.clone(),
                    source: err,
                });
            }
        };
        info!(%thread_id, name = ?thread.name, "generated thread name");
        self.state.write().clear_fault(Operation::GenerateName);

        self.list_threads().await?;
        Ok(thread)
    }

    // Local operations

    /// Make an already-fetched thread active; no network round trip
    pub fn switch_thread(&self, thread_id: &ThreadId) -> SwitchOutcome {
        if !self.state.write().switch_to(thread_id) {
            debug!(%thread_id, "ignoring switch to unknown thread");
            return SwitchOutcome::Noop;
        }

        self.emit(HistoryEvent::ActiveChanged {
            thread_id: Some(thread_id.clone()),
        });
        self.notify_activated(thread_id);
        SwitchOutcome::Switched
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        if self.state.write().set_search_query(query.clone()) {
            self.emit(HistoryEvent::SearchChanged { query });
        }
    }

    /// Enter rename mode, discarding any other row's pending buffer
    pub fn begin_edit(&self, thread_id: &ThreadId) -> bool {
        let started = self.state.write().begin_edit(thread_id);
        if started {
            self.emit(HistoryEvent::EditChanged {
                thread_id: Some(thread_id.clone()),
            });
        }
        started
    }

    pub fn update_edit_buffer(&self, text: impl Into<String>) -> bool {
        let editing = {
            let mut state = self.state.write();
            state
                .update_edit_buffer(text)
                .then(|| state.edit().map(|edit| edit.thread_id.clone()))
                .flatten()
        };
        match editing {
            Some(thread_id) => {
                self.emit(HistoryEvent::EditChanged {
                    thread_id: Some(thread_id),
                });
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&self) {
        if self.state.write().cancel_edit() {
            self.emit(HistoryEvent::EditChanged { thread_id: None });
        }
    }

    /// Click outside the rename input: cancel, never save
    pub fn dismiss_edit(&self) {
        self.cancel_edit();
    }

    pub fn set_collapsed(&self, collapsed: bool) {
        if self.state.write().set_collapsed(collapsed) {
            self.emit(HistoryEvent::CollapseChanged { collapsed });
        }
    }

    pub fn toggle_collapsed(&self) -> bool {
        let collapsed = !self.is_collapsed();
        self.set_collapsed(collapsed);
        collapsed
    }

    /// Search affordance of a collapsed sidebar: expand and focus the input
    pub fn expand_for_search(&self) -> bool {
        let expanded = self.state.write().expand_for_search();
        if expanded {
            self.emit(HistoryEvent::CollapseChanged { collapsed: false });
        }
        expanded
    }

    /// Whether the search input should grab focus; consumes the request
    pub fn take_search_focus(&self) -> bool {
        self.state.write().take_search_focus()
    }

    // Reads

    pub fn threads(&self) -> Vec<Thread> {
        self.state.read().threads().to_vec()
    }

    pub fn active_thread_id(&self) -> Option<ThreadId> {
        self.state.read().active().cloned()
    }

    pub fn selection(&self) -> Selection {
        self.state.read().selection().clone()
    }

    pub fn active_thread(&self) -> Option<Thread> {
        let state = self.state.read();
        state.active().and_then(|id| state.thread(id)).cloned()
    }

    pub fn search_query(&self) -> String {
        self.state.read().search_query().to_string()
    }

    pub fn is_collapsed(&self) -> bool {
        self.state.read().is_collapsed()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading()
    }

    pub fn is_creating(&self) -> bool {
        self.state.read().is_creating()
    }

    pub fn edit(&self) -> Option<EditState> {
        self.state.read().edit().cloned()
    }

    pub fn fetch_error(&self) -> Option<String> {
        self.state.read().fetch_error().map(str::to_string)
    }

    pub fn last_fault(&self) -> Option<Fault> {
        self.state.read().last_fault().cloned()
    }

    pub fn view(&self) -> ThreadListView {
        self.state.read().view()
    }

    pub fn layout(&self) -> SidebarLayout {
        self.state.read().layout(&self.config)
    }
}
