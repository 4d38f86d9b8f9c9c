use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use utoipa::ToSchema;

use crate::cache::{CacheSnapshot, CatalogLoader};
use crate::catalog::{CatalogQuery, CategoryFilter, SortDirection};
use crate::config::PokedexConfig;
use crate::favorites::FavoritesStore;
use crate::search::SearchRelay;

/// The user's current view: search, category, sort and page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ViewState {
    query: CatalogQuery,
}

impl ViewState {
    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }

    /// New searches start from the first page
    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if self.query.search != search {
            self.query.search = search;
            self.query.page = 1;
        }
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        if self.query.category != category {
            self.query.category = category;
            self.query.page = 1;
        }
    }

    pub fn set_sort(&mut self, sort: SortDirection) {
        self.query.sort = sort;
    }

    pub fn set_page(&mut self, page: usize) {
        self.query.page = page;
    }
}

/// Shared state handed to every server handler
pub struct AppState {
    pub config: PokedexConfig,
    pub loader: Arc<CatalogLoader>,
    snapshot: RwLock<Arc<CacheSnapshot>>,
    pub favorites: FavoritesStore,
    pub view: Mutex<ViewState>,
    pub search: SearchRelay,
}

impl AppState {
    /// Must be called from within a tokio runtime (starts the search relay)
    pub fn new(config: PokedexConfig, loader: Arc<CatalogLoader>, snapshot: CacheSnapshot) -> Self {
        let search = SearchRelay::new(config.debounce());
        Self {
            config,
            loader,
            snapshot: RwLock::new(Arc::new(snapshot)),
            favorites: FavoritesStore::new(),
            view: Mutex::new(ViewState::default()),
            search,
        }
    }

    pub async fn snapshot(&self) -> Arc<CacheSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn replace_snapshot(&self, snapshot: CacheSnapshot) {
        *self.snapshot.write().await = Arc::new(snapshot);
    }

    /// View state with the latest settled search applied
    pub async fn current_view(&self) -> ViewState {
        let mut view = self.view.lock().await;
        view.set_search(self.search.current());
        view.clone()
    }

    pub async fn update_view(&self, update: impl FnOnce(&mut ViewState)) -> ViewState {
        let mut view = self.view.lock().await;
        view.set_search(self.search.current());
        update(&mut view);
        view.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_and_category_changes_reset_page() {
        let mut view = ViewState::default();
        view.set_page(4);
        view.set_search("char");
        assert_eq!(view.query().page, 1);

        view.set_page(3);
        view.set_search("char");
        assert_eq!(view.query().page, 3);

        view.set_category(CategoryFilter::Only("fire".into()));
        assert_eq!(view.query().page, 1);
    }

    #[test]
    fn sort_keeps_page() {
        let mut view = ViewState::default();
        view.set_page(2);
        view.set_sort(SortDirection::Descending);
        assert_eq!(view.query().page, 2);
        assert_eq!(view.query().sort, SortDirection::Descending);
    }
}
