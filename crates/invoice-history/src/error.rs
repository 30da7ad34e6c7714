use invoice_persist::PersistError;
use invoice_types::ThreadId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to load threads: {0}")]
    FetchFailed(#[source] PersistError),

    #[error("Failed to create thread: {0}")]
    CreateFailed(#[source] PersistError),

    #[error("Failed to rename thread {thread_id}: {source}")]
    RenameFailed {
        thread_id: ThreadId,
        #[source]
        source: PersistError,
    },

    #[error("Failed to generate a name for thread {thread_id}: {source}")]
    NameGenerationFailed {
        thread_id: ThreadId,
        #[source]
        source: PersistError,
    },

    #[error("Thread name must not be empty")]
    EmptyName,

    #[error("A thread is already being created")]
    CreateInFlight,

    #[error("No rename in progress")]
    NoEditInProgress,
}

pub type Result<T> = std::result::Result<T, HistoryError>;
