use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::cache::{CacheStatus, FailedEntry, LoadSource};
use crate::server::error::HandlerError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub source: LoadSource,
    pub entries: usize,
    pub failed: Vec<FailedEntry>,
    pub persisted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearResponse {
    pub removed: bool,
}

/// Snapshot cache status and hit statistics
#[utoipa::path(
    get,
    path = "/api/cache/status",
    responses(
        (status = 200, description = "Cache status", body = CacheStatus),
        (status = 500, description = "Store unreadable", body = crate::server::error::ErrorBody)
    ),
    tag = "cache"
)]
pub async fn cache_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CacheStatus>, HandlerError> {
    Ok(Json(state.loader.status().await?))
}

/// Refetch the catalog and swap it in
#[utoipa::path(
    post,
    path = "/api/cache/refresh",
    responses(
        (status = 200, description = "Catalog reloaded", body = RefreshResponse),
        (status = 500, description = "Reload failed", body = crate::server::error::ErrorBody)
    ),
    tag = "cache"
)]
pub async fn refresh_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, HandlerError> {
    tracing::info!("🔄 Catalog refresh requested");
    let report = state.loader.refresh(&CancellationToken::new()).await?;

    let response = RefreshResponse {
        source: report.source,
        entries: report.snapshot.len(),
        failed: report.failed,
        persisted: report.persisted,
    };
    state.replace_snapshot(report.snapshot).await;
    Ok(Json(response))
}

/// Drop the stored snapshot; the loaded catalog stays in memory
#[utoipa::path(
    delete,
    path = "/api/cache",
    responses(
        (status = 200, description = "Snapshot removed", body = ClearResponse),
        (status = 500, description = "Store unwritable", body = crate::server::error::ErrorBody)
    ),
    tag = "cache"
)]
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearResponse>, HandlerError> {
    let removed = state.loader.invalidate().await?;
    Ok(Json(ClearResponse { removed }))
}
