use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use invoice_persist::{normalize_name, ListThreadsResponse, RenameThreadRequest};
use invoice_types::{Thread, ThreadId};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// List every thread in store order
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ListThreadsResponse>> {
    let threads = state.store.list_threads().await?;
    Ok(Json(ListThreadsResponse { threads }))
}

/// Create a new, unnamed thread
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<Thread>)> {
    let thread = state.store.create_thread().await?;
    tracing::info!(thread_id = %thread.id, "thread created");

    Ok((StatusCode::CREATED, Json(thread)))
}

/// Get a specific thread by ID
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Thread>> {
    let thread = state
        .store
        .get_thread(&ThreadId::new(thread_id.clone()))
        .await?
        .ok_or(ApiError::ThreadNotFound(thread_id))?;

    Ok(Json(thread))
}

/// Rename a thread
pub async fn rename_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(req): Json<RenameThreadRequest>,
) -> ApiResult<StatusCode> {
    let name = normalize_name(&req.name)
        .map_err(|_| ApiError::BadRequest("Thread name must not be empty".to_string()))?;

    state
        .store
        .rename_thread(&ThreadId::new(thread_id.clone()), name)
        .await?;
    tracing::info!(%thread_id, name, "thread renamed");

    Ok(StatusCode::NO_CONTENT)
}

/// Generate a name for a thread from its content
pub async fn generate_thread_name(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Thread>> {
    let thread = state
        .store
        .generate_thread_name(&ThreadId::new(thread_id))
        .await?;

    Ok(Json(thread))
}
