use invoice_persist::PersistError;
use tracing::debug;
use invoice_types::{HistoryConfig, Thread, ThreadId};

use crate::view::{self, SidebarLayout, ThreadListView};

/// Remote operation a caught failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Create,
    Rename,
    GenerateName,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Fetch => "fetch",
            Operation::Create => "create",
            Operation::Rename => "rename",
            Operation::GenerateName => "generate_name",
        }
    }
}

/// A caught remote failure kept as inline UI state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub operation: Operation,
    pub message: String,
}

/// Local selection intent next to what the last fetch confirmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub local: Option<ThreadId>,
    pub confirmed: Option<ThreadId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub thread_id: ThreadId,
    pub buffer: String,
}

/// Result of delivering a fetch response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The collection was replaced; `active_changed` if reconciling moved the pointer
    Applied { count: usize, active_changed: bool },
    /// A newer response was already applied; this one was dropped
    Stale,
}

#[derive(Debug)]
pub struct HistoryState {
    threads: Vec<Thread>,
    loaded: bool,
    selection: Selection,
    search_query: String,
    collapsed: bool,
    focus_search: bool,
    edit: Option<EditState>,
    fetches_in_flight: usize,
    fetch_error: Option<String>,
    last_fault: Option<Fault>,
    next_ticket: u64,
    applied_ticket: u64,
    creating: bool,
}

impl HistoryState {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            threads: Vec::new(),
            loaded: false,
            selection: Selection::default(),
            search_query: String::new(),
            collapsed: config.default_collapsed,
            focus_search: false,
            edit: None,
            fetches_in_flight: 0,
            fetch_error: None,
            last_fault: None,
            next_ticket: 0,
            applied_ticket: 0,
            creating: false,
        }
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn contains(&self, id: &ThreadId) -> bool {
        self.threads.iter().any(|t| &t.id == id)
    }

    pub fn thread(&self, id: &ThreadId) -> Option<&Thread> {
        self.threads.iter().find(|t| &t.id == id)
    }

    pub fn active(&self) -> Option<&ThreadId> {
        self.selection.local.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_loading(&self) -> bool {
        self.fetches_in_flight > 0
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn edit(&self) -> Option<&EditState> {
        self.edit.as_ref()
    }

    pub fn fetch_error(&self) -> Option<&str> {
        self.fetch_error.as_deref()
    }

    pub fn last_fault(&self) -> Option<&Fault> {
        self.last_fault.as_ref()
    }

    // Fetch lifecycle

    pub fn begin_fetch(&mut self) -> u64 {
        self.next_ticket += 1;
        self.fetches_in_flight += 1;
        self.next_ticket
    }

    pub fn finish_fetch(
        &mut self,
        ticket: u64,
        response: Result<Vec<Thread>, PersistError>,
    ) -> Result<FetchOutcome, PersistError> {
        self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);

        // Superseded by a response that was issued later; its failure is moot too
        if ticket <= self.applied_ticket {
            if let Err(err) = &response {
                debug!(
                    ticket,
                    applied = self.applied_ticket,
                    error = %err,
                    "dropped stale fetch failure"
                );
            }
            return Ok(FetchOutcome::Stale);
        }

        match response {
            Ok(threads) => {
                self.applied_ticket = ticket;
                self.threads = threads;
                self.loaded = true;
                self.fetch_error = None;
                self.clear_fault(Operation::Fetch);
                let active_changed = self.reconcile();
                Ok(FetchOutcome::Applied {
                    count: self.threads.len(),
                    active_changed,
                })
            }
            Err(err) => {
                self.fetch_error = Some(err.to_string());
                self.record_fault(Operation::Fetch, &err);
                Err(err)
            }
        }
    }

    /// Align the selection with the authoritative collection
    ///
    /// Returns whether the visible pointer moved.
    fn reconcile(&mut self) -> bool {
        let before = self.selection.local.clone();

        let local_known = self.selection.local.as_ref().is_some_and(|id| self.contains(id));
        if local_known {
            self.selection.confirmed = self.selection.local.clone();
        } else {
            let confirmed_known = self
                .selection
                .confirmed
                .as_ref()
                .is_some_and(|id| self.contains(id));
            if !confirmed_known {
                self.selection.confirmed = None;
            }
            self.selection.local = self.selection.confirmed.clone();
        }

        if self.edit.as_ref().is_some_and(|edit| !self.contains(&edit.thread_id)) {
            self.edit = None;
        }

        before != self.selection.local
    }

    // Selection

    /// Point at `id` without checking membership; reconciled when present
    pub fn activate(&mut self, id: ThreadId) {
        if self.contains(&id) {
            self.selection.confirmed = Some(id.clone());
        }
        self.selection.local = Some(id);
    }

    /// Switch to a thread already in the collection; `false` for unknown ids
    pub fn switch_to(&mut self, id: &ThreadId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.selection.local = Some(id.clone());
        true
    }

    // Create gating

    pub fn try_begin_create(&mut self) -> bool {
        if self.creating {
            return false;
        }
        self.creating = true;
        true
    }

    pub fn end_create(&mut self) {
        self.creating = false;
    }

    // Search and collapse

    pub fn set_search_query(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        if query == self.search_query {
            return false;
        }
        self.search_query = query;
        true
    }

    pub fn set_collapsed(&mut self, collapsed: bool) -> bool {
        if collapsed == self.collapsed {
            return false;
        }
        self.collapsed = collapsed;
        true
    }

    /// Expand a collapsed sidebar and request search focus
    pub fn expand_for_search(&mut self) -> bool {
        if !self.collapsed {
            return false;
        }
        self.collapsed = false;
        self.focus_search = true;
        true
    }

    pub fn take_search_focus(&mut self) -> bool {
        std::mem::take(&mut self.focus_search)
    }

    // Rename editing

    pub fn begin_edit(&mut self, id: &ThreadId) -> bool {
        let Some(thread) = self.thread(id) else {
            return false;
        };
        let buffer = thread.name().unwrap_or_default().to_string();
        self.edit = Some(EditState {
            thread_id: id.clone(),
            buffer,
        });
        true
    }

    pub fn update_edit_buffer(&mut self, text: impl Into<String>) -> bool {
        match self.edit.as_mut() {
            Some(edit) => {
                edit.buffer = text.into();
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.edit.take().is_some()
    }

    /// Leave rename mode if it is open for `id`
    pub fn finish_edit(&mut self, id: &ThreadId) -> bool {
        if self.edit.as_ref().is_some_and(|edit| &edit.thread_id == id) {
            self.edit = None;
            true
        } else {
            false
        }
    }

    // Faults

    pub fn record_fault(&mut self, operation: Operation, err: &PersistError) {
        self.last_fault = Some(Fault {
            operation,
            message: err.to_string(),
        });
    }

    pub fn clear_fault(&mut self, operation: Operation) {
        if self.last_fault.as_ref().is_some_and(|f| f.operation == operation) {
            self.last_fault = None;
        }
    }

    // Projection

    pub fn view(&self) -> ThreadListView {
        let editing = self.edit.as_ref().map(|edit| &edit.thread_id);
        let rows = view::project(&self.threads, &self.search_query, self.active(), editing);
        let status = view::list_status(
            &rows,
            self.threads.len(),
            self.loaded,
            self.is_loading(),
            self.fetch_error.is_some(),
        );

        ThreadListView {
            rows,
            status,
            error: self.fetch_error.clone(),
            edit_buffer: self.edit.as_ref().map(|edit| edit.buffer.clone()),
        }
    }

    pub fn layout(&self, config: &HistoryConfig) -> SidebarLayout {
        let width = if self.collapsed {
            &config.collapsed_width
        } else {
            &config.expanded_width
        };
        SidebarLayout {
            collapsed: self.collapsed,
            width: width.clone(),
            position: config.position,
        }
    }
}
