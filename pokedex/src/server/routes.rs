use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub entries: usize,
    pub favorites: usize,
    pub cache_fresh: bool,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let entries = state.snapshot().await.len();
    let favorites = state.favorites.list().await.len();
    let cache_fresh = match state.loader.status().await {
        Ok(status) => status.fresh,
        Err(e) => {
            tracing::warn!("Failed to read cache status: {}", e);
            false
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        entries,
        favorites,
        cache_fresh,
    })
}
