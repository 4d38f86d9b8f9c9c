// Catalog API endpoints
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::{mark_favorites, CardPage};
use crate::catalog::{self, CatalogQuery, CategoryStyle, PokemonCard, SortDirection};
use crate::server::error::HandlerError;
use crate::state::AppState;

/// Query parameters shared by the catalog and favorites listings
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Case-insensitive name substring
    pub search: Option<String>,
    /// Category name, or `all`
    #[serde(rename = "type")]
    pub category: Option<String>,
    #[param(value_type = Option<String>, example = "asc")]
    pub sort: Option<SortDirection>,
    /// 1-indexed page (default 1)
    pub page: Option<usize>,
}

impl ListQuery {
    pub fn to_catalog_query(&self) -> CatalogQuery {
        CatalogQuery {
            search: self.search.clone().unwrap_or_default(),
            category: self.category.clone().unwrap_or_default().into(),
            sort: self.sort.unwrap_or_default(),
            page: self.page.unwrap_or(1),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryInfo {
    pub name: String,
    pub style: CategoryStyle,
}

/// List one page of the catalog
#[utoipa::path(
    get,
    path = "/api/pokemon",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of catalog cards", body = CardPage)
    ),
    tag = "catalog"
)]
pub async fn list_pokemon(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Json<CardPage> {
    let snapshot = state.snapshot().await;
    let query = params.to_catalog_query();
    let mut page = catalog::catalog_page(&snapshot, &query, state.config.page_size);
    mark_favorites(&state, &mut page.items).await;
    Json(page.into())
}

/// Get a single catalog entry
#[utoipa::path(
    get,
    path = "/api/pokemon/{name}",
    params(("name" = String, Path, description = "Entry name")),
    responses(
        (status = 200, description = "Catalog card", body = PokemonCard),
        (status = 404, description = "Unknown name", body = crate::server::error::ErrorBody)
    ),
    tag = "catalog"
)]
pub async fn get_pokemon(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<PokemonCard>, HandlerError> {
    let snapshot = state.snapshot().await;
    if snapshot.entry(&name).is_none() {
        return Err(HandlerError::not_found(format!("{} is not in the catalog", name)));
    }

    let mut card = PokemonCard::from_snapshot(&snapshot, &name);
    card.favorite = state.favorites.contains(&name).await;
    Ok(Json(card))
}

/// List every category present in the catalog with its badge style
#[utoipa::path(
    get,
    path = "/api/types",
    responses(
        (status = 200, description = "Sorted category list", body = Vec<CategoryInfo>)
    ),
    tag = "catalog"
)]
pub async fn list_types(State(state): State<Arc<AppState>>) -> Json<Vec<CategoryInfo>> {
    let snapshot = state.snapshot().await;
    let categories = snapshot
        .all_categories()
        .into_iter()
        .map(|name| CategoryInfo {
            style: catalog::category_style(&name),
            name,
        })
        .collect();
    Json(categories)
}
