pub mod loader;
pub mod manager;
pub mod store;
pub mod types;

pub use loader::{CatalogLoader, FailedEntry, LoadReport, LoadSource, LoaderOptions, SNAPSHOT_KEY};
pub use manager::CacheManager;
pub use store::{KeyValueStore, MemoryStore};
pub use types::{CacheSnapshot, CacheStatus, DetailRecord, SnapshotRejection};

use std::sync::Arc;

use anyhow::Result;

use crate::config::PokedexConfig;
use crate::pokeapi::PokeApiClient;

/// Build a loader backed by the on-disk cache (or memory when `ephemeral`)
pub fn init_loader(config: &PokedexConfig, ephemeral: bool) -> Result<Arc<CatalogLoader>> {
    let store: Arc<dyn KeyValueStore> = if ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        let db_path = config.resolve_db_path()?;
        log::debug!("Using cache database at {}", db_path.display());
        Arc::new(CacheManager::open(&db_path)?)
    };
    let client = Arc::new(PokeApiClient::new(config)?);
    Ok(Arc::new(CatalogLoader::new(store, client, LoaderOptions::from(config))))
}
