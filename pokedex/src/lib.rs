// Modules for better organization

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod favorites;
pub mod logging;
pub mod pokeapi;
pub mod search;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use cache::{CacheSnapshot, CatalogLoader};
pub use catalog::{CatalogQuery, CategoryFilter, Page, PokemonCard, SortDirection};
pub use config::PokedexConfig;
pub use favorites::{FavoriteEntry, FavoritesStore};

use clap::Parser;

/// Parse arguments, set up logging and run the selected command
pub fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::init_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(cli::execute(cli))
}
