//! API Handlers
//!
//! HTTP request handlers for the frontend API over one group.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{CacheError, Result};
use crate::group::Group;
use crate::models::{BatchQuery, BatchResponse, HealthResponse, KeyQuery, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The group this API fronts
    pub group: Arc<Group>,
}

impl AppState {
    /// Creates a new AppState for the given group.
    pub fn new(group: Arc<Group>) -> Self {
        Self { group }
    }
}

/// Handler for `GET /api?key=K`
///
/// Returns the raw value bytes.
pub async fn get_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Response> {
    let key = query
        .key()
        .ok_or_else(|| CacheError::InvalidRequest("key is required".to_string()))?;

    let view = state.group.get(key).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        view.to_bytes(),
    )
        .into_response())
}

/// Handler for `GET /api/stats`
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.group.stats()))
}

/// Handler for `GET /api/healthz`
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(state.group.stats()))
}

/// Handler for `GET /api/batch?keys=a,b,c`
///
/// Resolves every key; failures are reported per key, not as an error status.
pub async fn batch_handler(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
) -> Result<Json<BatchResponse>> {
    let keys = query.keys();
    if keys.is_empty() {
        return Err(CacheError::InvalidRequest("keys is required".to_string()));
    }

    let (values, errors) = state.group.get_many(&keys).await;
    Ok(Json(BatchResponse::new(values, errors)))
}

/// Handler for `DELETE /api/delete?key=K`
///
/// Evicts the key from this node's cache only.
pub async fn delete_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<StatusCode> {
    let key = query
        .key()
        .ok_or_else(|| CacheError::InvalidRequest("key is required".to_string()))?;

    state.group.remove(key);
    Ok(StatusCode::NO_CONTENT)
}
