// PokeAPI client module for fetching catalog data
pub mod client;
pub mod error;
pub mod types;

pub use client::PokeApiClient;
pub use error::ApiError;
pub use types::{CatalogEntry, IndexResponse, PokemonDetail};
