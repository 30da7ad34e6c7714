use serde::{Deserialize, Serialize};

use crate::thread::ThreadId;

/// State changes published by the thread history controller
///
/// Subviews (list, search box, header, chat surface) subscribe to these and
/// recompute their projection instead of polling shared state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEvent {
    /// A fetch started
    Loading,

    /// The thread collection was replaced by a fresh fetch
    ThreadsReplaced {
        count: usize,
    },

    /// Listing failed; the previous collection is still shown
    FetchFailed {
        message: String,
    },

    /// The active thread pointer moved
    ActiveChanged {
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<ThreadId>,
    },

    /// A thread became active through create or switch
    ThreadActivated {
        thread_id: ThreadId,
    },

    SearchChanged {
        query: String,
    },

    CollapseChanged {
        collapsed: bool,
    },

    /// Rename mode entered, left, or its buffer changed
    EditChanged {
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<ThreadId>,
    },

    /// A caught remote failure surfaced as inline state
    OperationFailed {
        operation: String,
        message: String,
    },
}
