//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use smart_invoice::prelude::*;
//! ```

pub use crate::{
    compute_totals, HistoryConfig, HistoryError, HistoryEvent, InvoiceDocument, KeyEvent,
    KeyboardHub, LineItem, ListStatus, Platform, StoreBuilder, SwitchOutcome, Thread,
    ThreadHistory, ThreadId, ThreadStore, Totals, VisibilityConfig, VisibilityController,
};
