use async_trait::async_trait;
use invoice_types::{Thread, ThreadId};

use crate::error::{PersistError, Result};

/// Remote collaborator that owns the durable list of conversation threads
///
/// Every operation except [`ThreadStore::create_thread`] is safe to retry;
/// repeating a create produces a duplicate thread.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// All threads, in the order the store considers authoritative
    async fn list_threads(&self) -> Result<Vec<Thread>>;

    /// Create an empty, unnamed thread
    async fn create_thread(&self) -> Result<Thread>;

    /// Get a thread by ID
    async fn get_thread(&self, id: &ThreadId) -> Result<Option<Thread>>;

    /// Replace the thread's display name
    async fn rename_thread(&self, id: &ThreadId, name: &str) -> Result<()>;

    /// Ask the backend to name the thread from its content
    async fn generate_thread_name(&self, id: &ThreadId) -> Result<Thread>;
}

/// Trimmed name, or `InvalidName` when nothing is left
pub fn normalize_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(PersistError::InvalidName)
    } else {
        Ok(trimmed)
    }
}

/// Name used by stores that have no model to summarize the conversation
pub fn fallback_thread_name(thread: &Thread) -> String {
    format!("Invoice chat {}", thread.created_at_label())
}
