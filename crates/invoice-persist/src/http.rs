use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use invoice_types::{Thread, ThreadId};

use crate::error::{PersistError, Result};
use crate::store::{normalize_name, ThreadStore};

/// Body of `GET /threads`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListThreadsResponse {
    pub threads: Vec<Thread>,
}

/// Body of `PATCH /threads/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameThreadRequest {
    pub name: String,
}

/// Thread store backed by the `invoice-api` HTTP service
#[derive(Clone)]
pub struct HttpThreadStore {
    client: Client,
    base_url: String,
}

impl HttpThreadStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn thread_url(&self, id: &ThreadId) -> String {
        self.url(&format!("/threads/{}", id))
    }
}

// Map non-success statuses onto store errors
async fn check(response: Response, id: Option<&ThreadId>) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => Err(PersistError::ThreadNotFound(id.to_string())),
        _ => {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %body, "thread service returned an error");
            Err(PersistError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl ThreadStore for HttpThreadStore {
    async fn list_threads(&self) -> Result<Vec<Thread>> {
        let response = self.client.get(self.url("/threads")).send().await?;
        let body: ListThreadsResponse = check(response, None).await?.json().await?;
        Ok(body.threads)
    }

    async fn create_thread(&self) -> Result<Thread> {
        let response = self.client.post(self.url("/threads")).send().await?;
        Ok(check(response, None).await?.json().await?)
    }

    async fn get_thread(&self, id: &ThreadId) -> Result<Option<Thread>> {
        let response = self.client.get(self.thread_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(response, Some(id)).await?.json().await?))
    }

    async fn rename_thread(&self, id: &ThreadId, name: &str) -> Result<()> {
        let request = RenameThreadRequest {
            name: normalize_name(name)?.to_string(),
        };
        let response = self
            .client
            .patch(self.thread_url(id))
            .json(&request)
            .send()
            .await?;
        check(response, Some(id)).await?;
        Ok(())
    }

    async fn generate_thread_name(&self, id: &ThreadId) -> Result<Thread> {
        let response = self
            .client
            .post(self.url(&format!("/threads/{}/name", id)))
            .send()
            .await?;
        Ok(check(response, Some(id)).await?.json().await?)
    }
}
