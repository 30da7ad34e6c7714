use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use invoice_types::{Thread, ThreadId};

use crate::error::{PersistError, Result};
use crate::store::{fallback_thread_name, normalize_name, ThreadStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    List,
    Create,
    Get,
    Rename,
    GenerateName,
}

#[derive(Default)]
struct Inner {
    // Newest first, matching the ordering of the hosted stores
    threads: Vec<Thread>,
    failures: HashMap<StoreOperation, usize>,
    delays: HashMap<StoreOperation, VecDeque<Duration>>,
    calls: HashMap<StoreOperation, usize>,
}

/// In-memory thread store
///
/// Useful for development and as the remote double in tests: failures and
/// per-call latency can be scripted for each operation.
#[derive(Clone, Default)]
pub struct InMemoryThreadStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with threads, given in the order `list_threads` should return them
    pub fn with_threads(threads: Vec<Thread>) -> Self {
        let store = Self::new();
        store.inner.lock().threads = threads;
        store
    }

    /// Insert a thread directly, bypassing call accounting
    pub fn insert(&self, thread: Thread) {
        self.inner.lock().threads.insert(0, thread);
    }

    pub fn snapshot(&self) -> Vec<Thread> {
        self.inner.lock().threads.clone()
    }

    /// Make the next `times` calls of `op` fail
    pub fn fail_next(&self, op: StoreOperation, times: usize) {
        *self.inner.lock().failures.entry(op).or_default() += times;
    }

    /// Delay the next call of `op` by `delay`; queued delays apply in order
    pub fn delay_next(&self, op: StoreOperation, delay: Duration) {
        self.inner
            .lock()
            .delays
            .entry(op)
            .or_default()
            .push_back(delay);
    }

    pub fn calls(&self, op: StoreOperation) -> usize {
        self.inner.lock().calls.get(&op).copied().unwrap_or(0)
    }

    fn begin(&self, op: StoreOperation) -> ScriptedCall {
        let mut inner = self.inner.lock();
        *inner.calls.entry(op).or_default() += 1;

        let delay = inner.delays.get_mut(&op).and_then(VecDeque::pop_front);

        let failure = match inner.failures.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Some(PersistError::Internal(format!("injected {:?} failure", op)))
            }
            _ => None,
        };

        ScriptedCall { delay, failure }
    }
}

/// Latency and outcome scripted for one call
struct ScriptedCall {
    delay: Option<Duration>,
    failure: Option<PersistError>,
}

impl ScriptedCall {
    /// Wait out the delay, then fail if a failure was injected
    async fn settle(self) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn list_threads(&self) -> Result<Vec<Thread>> {
        let call = self.begin(StoreOperation::List);
        // Snapshot at request time; latency only delays the response
        let threads = self.snapshot();
        call.settle().await?;
        Ok(threads)
    }

    async fn create_thread(&self) -> Result<Thread> {
        self.begin(StoreOperation::Create).settle().await?;

        let thread = Thread::new(ThreadId::generate(), Utc::now());
        self.inner.lock().threads.insert(0, thread.clone());
        tracing::debug!(thread_id = %thread.id, "created thread in memory");
        Ok(thread)
    }

    async fn get_thread(&self, id: &ThreadId) -> Result<Option<Thread>> {
        self.begin(StoreOperation::Get).settle().await?;

        let inner = self.inner.lock();
        Ok(inner.threads.iter().find(|t| &t.id == id).cloned())
    }

    async fn rename_thread(&self, id: &ThreadId, name: &str) -> Result<()> {
        let name = normalize_name(name)?;
        self.begin(StoreOperation::Rename).settle().await?;

        let mut inner = self.inner.lock();
        let thread = inner
            .threads
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| PersistError::ThreadNotFound(id.to_string()))?;
        thread.name = Some(name.to_string());
        Ok(())
    }

    async fn generate_thread_name(&self, id: &ThreadId) -> Result<Thread> {
        self.begin(StoreOperation::GenerateName).settle().await?;

        let mut inner = self.inner.lock();
        let thread = inner
            .threads
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| PersistError::ThreadNotFound(id.to_string()))?;
        let name = fallback_thread_name(thread);
        thread.name = Some(name);
        Ok(thread.clone())
    }
}
