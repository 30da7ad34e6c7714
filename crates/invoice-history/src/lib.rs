//! Thread history and chat visibility state for the invoice assistant
//!
//! [`ThreadHistory`] owns the fetched thread collection, the active thread,
//! search and rename state, and talks to a [`invoice_persist::ThreadStore`].
//! [`VisibilityController`] owns whether the chat surface is open. Wire them
//! together with [`ThreadHistory::add_observer`] so creating or switching a
//! thread opens the chat; the returned guard unregisters it on drop.

pub mod controller;
pub mod error;
pub mod shortcut;
pub mod state;
pub mod view;
pub mod visibility;

pub use controller::{ObserverGuard, SwitchOutcome, ThreadActivationObserver, ThreadHistory};
pub use error::{HistoryError, Result};
pub use shortcut::{FocusTarget, KeyChord, KeyEvent, KeyListener, KeyboardHub, ListenerGuard};
pub use state::{EditState, Fault, FetchOutcome, HistoryState, Operation, Selection};
pub use view::{matches_query, project, ListStatus, SidebarLayout, ThreadListView, ThreadRow};
pub use visibility::{
    ChatVisibility, MountGuard, Presentation, Viewport, VisibilityController, VisibilityState,
};
