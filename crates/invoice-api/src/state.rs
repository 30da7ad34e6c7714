use std::sync::Arc;

use crate::config::Config;
use invoice_persist::ThreadStore;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ThreadStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ThreadStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
