use std::cmp::Ordering;

use serde::Serialize;
use utoipa::ToSchema;

use super::query::{CatalogQuery, SortDirection};
use crate::cache::CacheSnapshot;
use crate::favorites::FavoriteEntry;

/// One resolved catalog entry, ready to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PokemonCard {
    pub name: String,
    pub image_url: Option<String>,
    pub height: Option<i64>,
    pub weight: Option<i64>,
    pub categories: Vec<String>,
    pub favorite: bool,
}

impl PokemonCard {
    pub fn from_snapshot(snapshot: &CacheSnapshot, name: &str) -> Self {
        Self {
            name: name.to_string(),
            image_url: snapshot.images.get(name).filter(|url| !url.is_empty()).cloned(),
            height: snapshot.heights.get(name).copied(),
            weight: snapshot.weights.get(name).copied(),
            categories: snapshot.categories.get(name).cloned().unwrap_or_default(),
            favorite: false,
        }
    }
}

impl From<&FavoriteEntry> for PokemonCard {
    fn from(entry: &FavoriteEntry) -> Self {
        Self {
            name: entry.name.clone(),
            image_url: Some(entry.image_url.clone()).filter(|url| !url.is_empty()),
            height: Some(entry.height),
            weight: Some(entry.weight),
            categories: entry.categories.clone(),
            favorite: true,
        }
    }
}

/// A page of results plus the numbers pagination controls need
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    /// Matches after filtering, before slicing
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_next: self.has_next,
        }
    }
}

/// Case-insensitive substring match on name
pub fn matches_search(name: &str, search: &str) -> bool {
    search.is_empty() || name.to_lowercase().contains(&search.to_lowercase())
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Filter by search and category, sort by name, then slice one page.
///
/// `name_of` and `categories_of` let the same pipeline run over catalog
/// entries (categories live in the snapshot maps) and favorites (categories
/// are inline).
pub fn paginate<'a, T, N, C>(
    items: &'a [T],
    query: &CatalogQuery,
    page_size: usize,
    name_of: N,
    categories_of: C,
) -> Page<&'a T>
where
    N: Fn(&'a T) -> &'a str,
    C: Fn(&'a T) -> Option<&'a [String]>,
{
    let mut filtered: Vec<&'a T> = items
        .iter()
        .filter(|item| matches_search(name_of(*item), &query.search))
        .filter(|item| query.category.matches(categories_of(*item)))
        .collect();

    match query.sort {
        SortDirection::Ascending => {
            filtered.sort_by(|a, b| compare_names(name_of(*a), name_of(*b)))
        }
        SortDirection::Descending => {
            filtered.sort_by(|a, b| compare_names(name_of(*b), name_of(*a)))
        }
        SortDirection::None => {}
    }

    let total_items = filtered.len();
    let page_size = page_size.max(1);
    let total_pages = total_items.div_ceil(page_size);

    let items = if query.page == 0 {
        Vec::new()
    } else {
        let start = (query.page - 1).saturating_mul(page_size);
        filtered.into_iter().skip(start).take(page_size).collect()
    };

    Page {
        items,
        page: query.page,
        page_size,
        total_items,
        total_pages,
        has_next: query.page > 0 && query.page.saturating_mul(page_size) < total_items,
    }
}

/// One page of the catalog as resolved cards
pub fn catalog_page(
    snapshot: &CacheSnapshot,
    query: &CatalogQuery,
    page_size: usize,
) -> Page<PokemonCard> {
    paginate(
        &snapshot.entries,
        query,
        page_size,
        |entry| entry.name.as_str(),
        |entry| snapshot.categories_of(&entry.name),
    )
    .map(|entry| PokemonCard::from_snapshot(snapshot, &entry.name))
}

/// One page of favorites, filtered on each favorite's own categories
pub fn favorites_page(
    favorites: &[FavoriteEntry],
    query: &CatalogQuery,
    page_size: usize,
) -> Page<PokemonCard> {
    paginate(
        favorites,
        query,
        page_size,
        |fav| fav.name.as_str(),
        |fav| Some(fav.categories.as_slice()),
    )
    .map(PokemonCard::from)
}
