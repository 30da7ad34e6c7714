pub mod config;
pub mod events;
pub mod invoice;
pub mod thread;

pub use config::{
    HistoryConfig, Platform, ShortcutConfig, ShortcutModifier, SidebarPosition, VisibilityConfig,
};
pub use events::HistoryEvent;
pub use invoice::{
    compute_totals, format_currency, InvoiceDocument, IssueKind, LineItem, Party, Totals,
    ValidationIssue, EMPTY_DRAFT_LABEL,
};
pub use thread::{Thread, ThreadId, UNTITLED_THREAD};
