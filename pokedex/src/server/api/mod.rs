pub mod cache;
pub mod favorites;
pub mod pokemon;
pub mod view;

use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

use crate::catalog::{Page, PokemonCard};
use crate::state::AppState;

/// A page of cards, as returned by every listing endpoint
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardPage {
    pub items: Vec<PokemonCard>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
}

impl From<Page<PokemonCard>> for CardPage {
    fn from(page: Page<PokemonCard>) -> Self {
        Self {
            items: page.items,
            page: page.page,
            page_size: page.page_size,
            total_items: page.total_items,
            total_pages: page.total_pages,
            has_next: page.has_next,
        }
    }
}

/// Set the `favorite` flag on catalog cards
pub(crate) async fn mark_favorites(state: &AppState, cards: &mut [PokemonCard]) {
    let favorites: HashSet<String> = state
        .favorites
        .list()
        .await
        .into_iter()
        .map(|fav| fav.name)
        .collect();
    for card in cards {
        card.favorite = favorites.contains(&card.name);
    }
}
