pub mod pipeline;
pub mod query;
pub mod styles;

pub use pipeline::{catalog_page, favorites_page, paginate, Page, PokemonCard};
pub use query::{CatalogQuery, CategoryFilter, SortDirection, ALL_CATEGORIES};
pub use styles::{category_style, CategoryStyle};
