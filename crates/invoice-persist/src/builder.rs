use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{PersistError, Result};
use crate::http::HttpThreadStore;
use crate::memory::InMemoryThreadStore;
use crate::store::ThreadStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Http,
    Mongodb,
}

/// Deserializable store selection, e.g. the `[store]` table of a config file
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Secret; supplied through the environment rather than config files
    #[serde(default)]
    pub mongodb_uri: Option<String>,
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            base_url: None,
            database: None,
            timeout_ms: default_timeout_ms(),
            mongodb_uri: None,
        }
    }
}

pub struct StoreBuilder {
    backend: StoreBackend,
    base_url: Option<String>,
    mongodb_uri: Option<String>,
    database: Option<String>,
    timeout: Duration,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self {
            backend: StoreBackend::Memory,
            base_url: None,
            mongodb_uri: None,
            database: None,
            timeout: Duration::from_millis(default_timeout_ms()),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            backend: config.backend,
            base_url: config.base_url.clone(),
            mongodb_uri: config.mongodb_uri.clone(),
            database: config.database.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    pub fn backend(mut self, backend: StoreBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn mongodb_uri(mut self, uri: impl Into<String>) -> Self {
        self.mongodb_uri = Some(uri.into());
        self
    }

    pub fn database(mut self, db: impl Into<String>) -> Self {
        self.database = Some(db.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn build(self) -> Result<Arc<dyn ThreadStore>> {
        match self.backend {
            StoreBackend::Memory => Ok(Arc::new(InMemoryThreadStore::new())),
            StoreBackend::Http => {
                let base_url = self
                    .base_url
                    .ok_or_else(|| PersistError::Internal("base_url is required".to_string()))?;
                Ok(Arc::new(HttpThreadStore::new(base_url, self.timeout)?))
            }
            StoreBackend::Mongodb => self.build_mongo().await,
        }
    }

    #[cfg(feature = "mongodb")]
    async fn build_mongo(self) -> Result<Arc<dyn ThreadStore>> {
        let uri = self
            .mongodb_uri
            .ok_or_else(|| PersistError::Internal("mongodb_uri is required".to_string()))?;
        let database = self
            .database
            .ok_or_else(|| PersistError::Internal("database is required".to_string()))?;
        let store = crate::dbs::mongo::MongoThreadStore::connect(&uri, &database).await?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "mongodb"))]
    async fn build_mongo(self) -> Result<Arc<dyn ThreadStore>> {
        Err(PersistError::Internal(
            "MongoDB backend requires the `mongodb` feature".to_string(),
        ))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_is_default() {
        let store = StoreBuilder::new().build().await.unwrap();
        assert!(store.list_threads().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_http_backend_requires_base_url() {
        let result = StoreBuilder::new().backend(StoreBackend::Http).build().await;
        assert!(matches!(result, Err(PersistError::Internal(_))));
    }

    #[test]
    fn test_store_config_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{ "backend": "http" }"#).unwrap();
        assert_eq!(config.backend, StoreBackend::Http);
        assert_eq!(config.timeout_ms, 10_000);
        assert!(config.base_url.is_none());
    }
}
