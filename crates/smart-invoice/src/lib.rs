//! # Smart Invoice
//!
//! State and data layer for an AI invoice assistant: the conversation thread
//! history sidebar, the collapsible chat surface, and invoice totals.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smart_invoice::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Thread store (in-memory here; HTTP or MongoDB in production)
//!     let store = StoreBuilder::new().build().await?;
//!
//!     // Shared history state and the chat surface it opens
//!     let history = ThreadHistory::new(store);
//!     let chat = VisibilityController::new(VisibilityConfig::default());
//!     let _observer = history.add_observer(Arc::new(chat.clone()));
//!
//!     // Global shortcut, detached when the guard drops
//!     let keyboard = KeyboardHub::new();
//!     let _mounted = chat.mount(&keyboard);
//!
//!     history.list_threads().await?;
//!     let thread = history.create_thread().await?;
//!     history.rename_thread(&thread.id, "Acme Q4").await?;
//!
//!     for row in history.view().rows {
//!         println!("{} ({})", row.display_name, row.created_at_label);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`invoice-types`**: threads, invoice documents and totals, config, events
//! - **`invoice-persist`**: the `ThreadStore` seam with in-memory, HTTP and MongoDB backends
//! - **`invoice-history`**: thread history controller, list projection, chat visibility
//!   and keyboard shortcut handling
//!
//! The `invoice-api` binary serves the thread store over HTTP for the
//! `HttpThreadStore` client.
//!
//! ## License
//!
//! MIT

pub mod prelude;

pub use invoice_types::{
    compute_totals, format_currency, HistoryConfig, HistoryEvent, InvoiceDocument, IssueKind,
    LineItem, Party, Platform, ShortcutConfig, ShortcutModifier, SidebarPosition, Thread,
    ThreadId, Totals, ValidationIssue, VisibilityConfig, EMPTY_DRAFT_LABEL, UNTITLED_THREAD,
};

pub use invoice_persist::{
    HttpThreadStore, InMemoryThreadStore, PersistError, StoreBackend, StoreBuilder, StoreConfig,
    StoreOperation, ThreadStore,
};

#[cfg(feature = "mongodb")]
pub use invoice_persist::MongoThreadStore;

pub use invoice_history::{
    ChatVisibility, FocusTarget, HistoryError, KeyChord, KeyEvent, KeyListener, KeyboardHub,
    ListStatus, ListenerGuard, MountGuard, ObserverGuard, Presentation, SidebarLayout,
    SwitchOutcome, ThreadActivationObserver, ThreadHistory, ThreadListView, ThreadRow, Viewport,
    VisibilityController, VisibilityState,
};
