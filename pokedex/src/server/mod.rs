pub mod api;
pub mod error;
pub mod routes;

use axum::{
    response::Json,
    routing::{get, post},
    serve, Router,
};

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health_check,
        api::pokemon::list_pokemon,
        api::pokemon::get_pokemon,
        api::pokemon::list_types,
        api::favorites::list_favorites,
        api::favorites::add_favorite,
        api::favorites::remove_favorite,
        api::favorites::toggle_favorite,
        api::view::get_view,
        api::view::put_view,
        api::view::post_search,
        api::cache::cache_status,
        api::cache::refresh_cache,
        api::cache::clear_cache,
    ),
    components(
        schemas(
            routes::HealthResponse,
            error::ErrorBody,
            api::CardPage,
            api::pokemon::CategoryInfo,
            api::favorites::FavoritesResponse,
            api::favorites::ToggleResponse,
            api::view::ViewResponse,
            api::view::ViewUpdate,
            api::view::SearchRequest,
            api::view::SearchAccepted,
            api::cache::RefreshResponse,
            api::cache::ClearResponse,
            crate::catalog::PokemonCard,
            crate::catalog::CatalogQuery,
            crate::catalog::SortDirection,
            crate::catalog::CategoryStyle,
            crate::favorites::FavoriteEntry,
            crate::state::ViewState,
            crate::cache::CacheStatus,
            crate::cache::FailedEntry,
            crate::cache::LoadSource,
        )
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "catalog", description = "Catalog browsing endpoints"),
        (name = "favorites", description = "Session favorites"),
        (name = "view", description = "Interactive view state and debounced search"),
        (name = "cache", description = "Snapshot cache management")
    ),
    info(
        title = "Pokedex API",
        description = "Local REST API over the cached Pokedex catalog",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

/// Build the router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // System endpoints
        .route("/api/health", get(routes::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async move { Json(ApiDoc::openapi()) }),
        )
        // Catalog endpoints
        .route("/api/pokemon", get(api::pokemon::list_pokemon))
        .route("/api/pokemon/:name", get(api::pokemon::get_pokemon))
        .route("/api/types", get(api::pokemon::list_types))
        // Favorites
        .route("/api/favorites", get(api::favorites::list_favorites))
        .route(
            "/api/favorites/:name",
            post(api::favorites::add_favorite).delete(api::favorites::remove_favorite),
        )
        .route(
            "/api/favorites/:name/toggle",
            post(api::favorites::toggle_favorite),
        )
        // View state
        .route(
            "/api/view",
            get(api::view::get_view).put(api::view::put_view),
        )
        .route("/api/view/search", post(api::view::post_search))
        // Cache endpoints
        .route("/api/cache", axum::routing::delete(api::cache::clear_cache))
        .route("/api/cache/status", get(api::cache::cache_status))
        .route("/api/cache/refresh", post(api::cache::refresh_cache))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(axum::http::header::HeaderValue::from_static("*"))
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
                .allow_credentials(false),
        )
}

/// Serve the API until ctrl-c
pub async fn start_server(state: Arc<AppState>, addr: &str) -> Result<()> {
    let app = router(state);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 Starting server:");
    info!("  📋 REST API: http://{}/api", addr);
    info!("  📚 OpenAPI: http://{}/api-docs/openapi.json", addr);

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
