// Interactive view endpoints: the server-side equivalent of the browse screen
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::{mark_favorites, CardPage};
use crate::catalog::{self, SortDirection};
use crate::state::{AppState, ViewState};

#[derive(Debug, Serialize, ToSchema)]
pub struct ViewResponse {
    pub view: ViewState,
    pub results: CardPage,
}

/// Partial update; absent fields are left alone
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ViewUpdate {
    #[serde(rename = "type")]
    pub category: Option<String>,
    pub sort: Option<SortDirection>,
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchAccepted {
    pub pending: String,
    pub debounce_ms: u64,
}

async fn render(state: &AppState, view: ViewState) -> ViewResponse {
    let snapshot = state.snapshot().await;
    let mut page = catalog::catalog_page(&snapshot, view.query(), state.config.page_size);
    mark_favorites(state, &mut page.items).await;
    ViewResponse {
        view,
        results: page.into(),
    }
}

/// Current view and the page it selects
#[utoipa::path(
    get,
    path = "/api/view",
    responses(
        (status = 200, description = "Current view", body = ViewResponse)
    ),
    tag = "view"
)]
pub async fn get_view(State(state): State<Arc<AppState>>) -> Json<ViewResponse> {
    let view = state.current_view().await;
    Json(render(&state, view).await)
}

/// Change category, sort or page
#[utoipa::path(
    put,
    path = "/api/view",
    request_body = ViewUpdate,
    responses(
        (status = 200, description = "Updated view", body = ViewResponse)
    ),
    tag = "view"
)]
pub async fn put_view(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ViewUpdate>,
) -> Json<ViewResponse> {
    let view = state
        .update_view(|view| {
            if let Some(category) = update.category {
                view.set_category(category.into());
            }
            if let Some(sort) = update.sort {
                view.set_sort(sort);
            }
            // Applied last so a category change plus an explicit page keeps the page
            if let Some(page) = update.page {
                view.set_page(page);
            }
        })
        .await;
    Json(render(&state, view).await)
}

/// Submit raw search input; it takes effect once the input has been quiet
/// for the debounce period
#[utoipa::path(
    post,
    path = "/api/view/search",
    request_body = SearchRequest,
    responses(
        (status = 202, description = "Search queued", body = SearchAccepted)
    ),
    tag = "view"
)]
pub async fn post_search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> (StatusCode, Json<SearchAccepted>) {
    tracing::debug!("Search input: {:?}", request.query);
    state.search.submit(request.query.clone());
    (
        StatusCode::ACCEPTED,
        Json(SearchAccepted {
            pending: request.query,
            debounce_ms: state.config.debounce_ms,
        }),
    )
}
