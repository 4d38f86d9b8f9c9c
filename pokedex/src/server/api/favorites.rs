use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use utoipa::ToSchema;

use super::pokemon::ListQuery;
use super::CardPage;
use crate::catalog;
use crate::favorites::FavoriteEntry;
use crate::server::error::HandlerError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoritesResponse {
    pub page: CardPage,
    /// Categories present among the favorites, for the filter dropdown
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleResponse {
    pub name: String,
    pub favorite: bool,
}

/// List favorites through the same search/category/sort/page pipeline
#[utoipa::path(
    get,
    path = "/api/favorites",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of favorites", body = FavoritesResponse)
    ),
    tag = "favorites"
)]
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Json<FavoritesResponse> {
    let favorites = state.favorites.list().await;
    let categories = favorites
        .iter()
        .flat_map(|fav| fav.categories.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let page = catalog::favorites_page(&favorites, &params.to_catalog_query(), state.config.page_size);

    Json(FavoritesResponse {
        page: page.into(),
        categories,
    })
}

/// Add a catalog entry to favorites
#[utoipa::path(
    post,
    path = "/api/favorites/{name}",
    params(("name" = String, Path, description = "Entry name")),
    responses(
        (status = 201, description = "Added", body = FavoriteEntry),
        (status = 404, description = "Unknown name", body = crate::server::error::ErrorBody),
        (status = 409, description = "Already a favorite", body = crate::server::error::ErrorBody)
    ),
    tag = "favorites"
)]
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<FavoriteEntry>), HandlerError> {
    let already_favorite = || HandlerError::conflict(format!("{} is already a favorite", name));

    let snapshot = state.snapshot().await;
    let Some(entry) = FavoriteEntry::from_snapshot(&snapshot, &name) else {
        // Favorites outlive catalog refreshes
        if state.favorites.contains(&name).await {
            return Err(already_favorite());
        }
        return Err(HandlerError::not_found(format!("{} is not in the catalog", name)));
    };
    if !state.favorites.add_if_absent(entry.clone()).await {
        return Err(already_favorite());
    }

    tracing::info!("⭐ Added {} to favorites", name);
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Remove an entry from favorites
#[utoipa::path(
    delete,
    path = "/api/favorites/{name}",
    params(("name" = String, Path, description = "Entry name")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Not a favorite", body = crate::server::error::ErrorBody)
    ),
    tag = "favorites"
)]
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, HandlerError> {
    if state.favorites.remove(&name).await {
        tracing::info!("Removed {} from favorites", name);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HandlerError::not_found(format!("{} is not a favorite", name)))
    }
}

/// Flip favorite membership, the way the heart button does
#[utoipa::path(
    post,
    path = "/api/favorites/{name}/toggle",
    params(("name" = String, Path, description = "Entry name")),
    responses(
        (status = 200, description = "New membership", body = ToggleResponse),
        (status = 404, description = "Unknown name", body = crate::server::error::ErrorBody)
    ),
    tag = "favorites"
)]
pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ToggleResponse>, HandlerError> {
    let snapshot = state.snapshot().await;
    let favorite = state
        .favorites
        .toggle(&name, &snapshot)
        .await
        .map_err(|e| HandlerError::not_found(e.to_string()))?;

    Ok(Json(ToggleResponse { name, favorite }))
}
