use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use futures::Future;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use super::store::KeyValueStore;
use super::types::{CacheSnapshot, CacheStatus, DetailRecord};
use crate::config::{FailurePolicy, PokedexConfig};
use crate::pokeapi::{ApiError, CatalogEntry, PokeApiClient};

/// Storage key of the catalog snapshot
pub const SNAPSHOT_KEY: &str = "pokemonData";

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub index_limit: usize,
    pub max_concurrency: usize,
    pub ttl: Option<chrono::Duration>,
    pub failure_policy: FailurePolicy,
}

impl From<&PokedexConfig> for LoaderOptions {
    fn from(config: &PokedexConfig) -> Self {
        Self {
            index_limit: config.index_limit,
            max_concurrency: config.max_concurrency,
            ttl: config.cache_ttl(),
            failure_policy: config.failure_policy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoadSource {
    Cache,
    Network,
}

/// Detail fetch that failed after retries
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FailedEntry {
    pub name: String,
    pub error: String,
}

/// Outcome of a load: the snapshot plus how it was obtained
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub snapshot: CacheSnapshot,
    pub source: LoadSource,
    pub failed: Vec<FailedEntry>,
    pub persisted: bool,
}

#[derive(Default)]
struct CacheStats {
    hits: i64,
    misses: i64,
}

/// Loads the catalog from the snapshot cache, falling back to PokeAPI
pub struct CatalogLoader {
    store: Arc<dyn KeyValueStore>,
    client: Arc<PokeApiClient>,
    options: LoaderOptions,
    stats: Mutex<CacheStats>,
}

impl CatalogLoader {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        client: Arc<PokeApiClient>,
        options: LoaderOptions,
    ) -> Self {
        Self {
            store,
            client,
            options,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Cached snapshot if valid, otherwise a fresh one from the network
    pub async fn load(&self) -> Result<CacheSnapshot> {
        Ok(self.load_with_report(&CancellationToken::new()).await?.snapshot)
    }

    pub async fn load_with_report(&self, cancel: &CancellationToken) -> Result<LoadReport> {
        if let Some(snapshot) = self.read_cached().await {
            self.stats.lock().await.hits += 1;
            log::info!("✅ Serving {} catalog entries from cache", snapshot.len());
            return Ok(LoadReport {
                snapshot,
                source: LoadSource::Cache,
                failed: Vec::new(),
                persisted: true,
            });
        }

        self.stats.lock().await.misses += 1;
        self.refresh(cancel).await
    }

    /// Fetch from the network regardless of cache contents
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<LoadReport> {
        let start_time = std::time::Instant::now();

        let (snapshot, failed) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::warn!("Catalog load cancelled, nothing persisted");
                return Err(anyhow!("Catalog load cancelled"));
            }
            result = self.fetch_snapshot() => result?,
        };

        // Partial snapshots are served but never persisted
        let persisted = if failed.is_empty() {
            let blob = serde_json::to_string(&snapshot)?;
            self.store.put(SNAPSHOT_KEY, &blob).await?;
            true
        } else {
            log::warn!(
                "⚠️ {} detail fetches failed, snapshot not persisted: {}",
                failed.len(),
                failed
                    .iter()
                    .map(|f| f.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            false
        };

        log::info!(
            "✅ Loaded {} catalog entries in {:.2}s",
            snapshot.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(LoadReport {
            snapshot,
            source: LoadSource::Network,
            failed,
            persisted,
        })
    }

    /// Delete the stored snapshot; the next load refetches
    pub async fn invalidate(&self) -> Result<bool> {
        let removed = self.store.delete(SNAPSHOT_KEY).await?;
        if removed {
            log::info!("🗑️ Catalog snapshot removed from cache");
        }
        Ok(removed)
    }

    pub async fn status(&self) -> Result<CacheStatus> {
        let stats = self.stats.lock().await;
        let hit_rate = if stats.hits + stats.misses > 0 {
            (stats.hits as f64) / ((stats.hits + stats.misses) as f64)
        } else {
            0.0
        };

        let mut status = CacheStatus {
            stored: false,
            fresh: false,
            schema_version: None,
            cached_at: None,
            age_secs: None,
            entry_count: 0,
            cache_hits: stats.hits,
            cache_misses: stats.misses,
            hit_rate,
            rejection: None,
        };

        let Some(raw) = self.store.get(SNAPSHOT_KEY).await? else {
            return Ok(status);
        };
        status.stored = true;

        match serde_json::from_str::<CacheSnapshot>(&raw) {
            Ok(snapshot) => {
                let now = Utc::now();
                status.schema_version = Some(snapshot.schema_version);
                status.cached_at = Some(snapshot.cached_at);
                status.age_secs = Some(snapshot.age_secs(now));
                status.entry_count = snapshot.len();
                match snapshot.validate(self.options.ttl, now) {
                    Ok(()) => status.fresh = true,
                    Err(rejection) => status.rejection = Some(rejection.to_string()),
                }
            }
            Err(e) => status.rejection = Some(format!("unreadable: {}", e)),
        }

        Ok(status)
    }

    /// Stored snapshot, or `None` if absent, unreadable, stale or incomplete
    async fn read_cached(&self) -> Option<CacheSnapshot> {
        let raw = match self.store.get(SNAPSHOT_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::debug!("No cached catalog snapshot");
                return None;
            }
            Err(e) => {
                log::warn!("Failed to read catalog cache: {}", e);
                return None;
            }
        };

        let snapshot: CacheSnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Cached catalog snapshot is malformed, refetching: {}", e);
                return None;
            }
        };

        match snapshot.validate(self.options.ttl, Utc::now()) {
            Ok(()) => Some(snapshot),
            Err(rejection) => {
                log::info!("Cached catalog snapshot rejected ({}), refetching", rejection);
                None
            }
        }
    }

    async fn fetch_snapshot(&self) -> Result<(CacheSnapshot, Vec<FailedEntry>)> {
        let index = self.client.get_index(self.options.index_limit).await?;
        let total = index.len();
        log::info!(
            "🔄 Fetching {} detail records ({} at a time)",
            total,
            self.options.max_concurrency
        );

        let fetches = bounded(
            index.into_iter().enumerate(),
            self.options.max_concurrency,
            |(position, entry)| self.fetch_detail(position, entry),
        );

        let mut results: Vec<(usize, CatalogEntry, Result<DetailRecord, ApiError>)> =
            match self.options.failure_policy {
                FailurePolicy::Isolate => fetches.collect().await,
                FailurePolicy::AllOrNothing => {
                    // First failure aborts the whole batch
                    fetches
                        .map(|(position, entry, result)| match result {
                            Ok(record) => Ok((position, entry, Ok::<_, ApiError>(record))),
                            Err(e) => Err(anyhow!("Detail fetch for {} failed: {}", entry.name, e)),
                        })
                        .try_collect()
                        .await?
                }
            };

        // Restore index order
        results.sort_by_key(|(position, _, _)| *position);

        let mut snapshot = CacheSnapshot::empty();
        let mut failed = Vec::new();
        for (_, entry, result) in results {
            match result {
                Ok(record) => snapshot.insert(entry, record),
                Err(e) => failed.push(FailedEntry {
                    name: entry.name,
                    error: e.to_string(),
                }),
            }
        }

        Ok((snapshot, failed))
    }

    async fn fetch_detail(
        &self,
        position: usize,
        entry: CatalogEntry,
    ) -> (usize, CatalogEntry, Result<DetailRecord, ApiError>) {
        let result = self.client.get_detail(&entry.url).await.map(DetailRecord::from);
        if let Err(e) = &result {
            log::debug!("Failed to fetch detail for {}: {}", entry.name, e);
        }
        (position, entry, result)
    }
}

/// Run `fetch` over `items` with at most `limit` futures in flight.
/// Results arrive in completion order.
fn bounded<I, F, Fut>(items: I, limit: usize, fetch: F) -> impl Stream<Item = Fut::Output>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future,
{
    stream::iter(items).map(fetch).buffer_unordered(limit.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::RetryConfig;
    use crate::test_support;
    use mockito::{Matcher, Mock, ServerGuard};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const STARTERS: [(&str, &[&str]); 3] = [
        ("bulbasaur", &["grass", "poison"]),
        ("charmander", &["fire"]),
        ("squirtle", &["water"]),
    ];

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    fn options(policy: FailurePolicy) -> LoaderOptions {
        LoaderOptions {
            index_limit: 150,
            max_concurrency: 2,
            ttl: Some(chrono::Duration::days(7)),
            failure_policy: policy,
        }
    }

    fn loader(server: &ServerGuard, store: Arc<MemoryStore>, policy: FailurePolicy) -> CatalogLoader {
        let client =
            PokeApiClient::with_base_url(&server.url(), Duration::from_secs(5), fast_retry()).unwrap();
        CatalogLoader::new(store, Arc::new(client), options(policy))
    }

    async fn mock_index(server: &mut ServerGuard, names: &[&str], hits: usize) -> Mock {
        let body = test_support::index_body(&server.url(), names);
        server
            .mock("GET", "/pokemon")
            .match_query(Matcher::UrlEncoded("limit".into(), "150".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    async fn mock_details(server: &mut ServerGuard, items: &[(&str, &[&str])]) -> Vec<Mock> {
        let mut mocks = Vec::new();
        for (i, (name, types)) in items.iter().enumerate() {
            let mock = server
                .mock("GET", format!("/pokemon/{}/", i + 1).as_str())
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(test_support::detail_body(name, types, 7, 69))
                .create_async()
                .await;
            mocks.push(mock);
        }
        mocks
    }

    #[tokio::test]
    async fn cold_load_fetches_everything_and_persists() {
        let mut server = mockito::Server::new_async().await;
        let index = mock_index(&mut server, &["bulbasaur", "charmander", "squirtle"], 1).await;
        let _details = mock_details(&mut server, &STARTERS).await;

        let store = Arc::new(MemoryStore::new());
        let loader = loader(&server, store.clone(), FailurePolicy::Isolate);
        let report = loader.load_with_report(&CancellationToken::new()).await.unwrap();

        index.assert_async().await;
        assert_eq!(report.source, LoadSource::Network);
        assert!(report.persisted);
        assert!(report.failed.is_empty());

        let names: Vec<_> = report.snapshot.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["bulbasaur", "charmander", "squirtle"]);
        assert!(report.snapshot.is_complete());
        assert_eq!(
            report.snapshot.categories["bulbasaur"],
            vec!["grass".to_string(), "poison".to_string()]
        );
        assert_eq!(
            report.snapshot.images["squirtle"],
            "https://img.example/art/squirtle.png"
        );

        let stored = store.get(SNAPSHOT_KEY).await.unwrap().unwrap();
        let stored: CacheSnapshot = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn cached_snapshot_issues_no_requests() {
        let mut server = mockito::Server::new_async().await;
        let index = mock_index(&mut server, &["bulbasaur"], 0).await;

        let store = Arc::new(MemoryStore::new());
        let cached = test_support::snapshot(&[("mew", &["psychic"])]);
        store
            .put(SNAPSHOT_KEY, &serde_json::to_string(&cached).unwrap())
            .await
            .unwrap();

        let loader = loader(&server, store, FailurePolicy::Isolate);
        let snapshot = loader.load().await.unwrap();

        index.assert_async().await;
        assert_eq!(snapshot.entries[0].name, "mew");
        let status = loader.status().await.unwrap();
        assert_eq!(status.cache_hits, 1);
        assert_eq!(status.cache_misses, 0);
        assert!(status.fresh);
    }

    #[tokio::test]
    async fn second_load_is_served_from_cache() {
        let mut server = mockito::Server::new_async().await;
        let index = mock_index(&mut server, &["bulbasaur", "charmander", "squirtle"], 1).await;
        let _details = mock_details(&mut server, &STARTERS).await;

        let loader = loader(&server, Arc::new(MemoryStore::new()), FailurePolicy::Isolate);
        let first = loader.load().await.unwrap();
        let report = loader.load_with_report(&CancellationToken::new()).await.unwrap();

        index.assert_async().await;
        assert_eq!(report.source, LoadSource::Cache);
        assert_eq!(report.snapshot.entries, first.entries);
    }

    #[tokio::test]
    async fn stale_snapshot_is_refetched() {
        let mut server = mockito::Server::new_async().await;
        let index = mock_index(&mut server, &["bulbasaur", "charmander", "squirtle"], 1).await;
        let _details = mock_details(&mut server, &STARTERS).await;

        let store = Arc::new(MemoryStore::new());
        let mut stale = test_support::snapshot(&[("mew", &["psychic"])]);
        stale.cached_at = Utc::now() - chrono::Duration::days(30);
        store
            .put(SNAPSHOT_KEY, &serde_json::to_string(&stale).unwrap())
            .await
            .unwrap();

        let loader = loader(&server, store, FailurePolicy::Isolate);
        let snapshot = loader.load().await.unwrap();

        index.assert_async().await;
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.entry("mew").is_none());
    }

    #[tokio::test]
    async fn malformed_cache_falls_back_to_network() {
        let mut server = mockito::Server::new_async().await;
        let index = mock_index(&mut server, &["bulbasaur", "charmander", "squirtle"], 1).await;
        let _details = mock_details(&mut server, &STARTERS).await;

        let store = Arc::new(MemoryStore::new());
        store.put(SNAPSHOT_KEY, "{not json").await.unwrap();

        let loader = loader(&server, store.clone(), FailurePolicy::Isolate);
        let snapshot = loader.load().await.unwrap();

        index.assert_async().await;
        assert_eq!(snapshot.len(), 3);
        let stored = store.get(SNAPSHOT_KEY).await.unwrap().unwrap();
        assert!(serde_json::from_str::<CacheSnapshot>(&stored).is_ok());
    }

    #[tokio::test]
    async fn failed_detail_is_isolated_and_not_persisted() {
        let mut server = mockito::Server::new_async().await;
        let _index = mock_index(&mut server, &["bulbasaur", "charmander", "squirtle"], 1).await;
        let _details = mock_details(&mut server, &STARTERS[..2]).await;
        let _missing = server
            .mock("GET", "/pokemon/3/")
            .with_status(404)
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::new());
        let loader = loader(&server, store.clone(), FailurePolicy::Isolate);
        let report = loader.load_with_report(&CancellationToken::new()).await.unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "squirtle");
        assert!(!report.persisted);
        assert_eq!(report.snapshot.len(), 2);
        assert!(report.snapshot.is_complete());
        assert!(store.get(SNAPSHOT_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn all_or_nothing_fails_the_whole_load() {
        let mut server = mockito::Server::new_async().await;
        let _index = mock_index(&mut server, &["bulbasaur", "charmander", "squirtle"], 1).await;
        let _details = mock_details(&mut server, &STARTERS[..2]).await;
        let _missing = server
            .mock("GET", "/pokemon/3/")
            .with_status(404)
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::new());
        let loader = loader(&server, store.clone(), FailurePolicy::AllOrNothing);
        let result = loader.load().await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("squirtle"));
        assert!(store.get(SNAPSHOT_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn index_failure_fails_the_load() {
        let mut server = mockito::Server::new_async().await;
        let _index = server
            .mock("GET", "/pokemon")
            .match_query(Matcher::Any)
            .with_status(400)
            .create_async()
            .await;

        let loader = loader(&server, Arc::new(MemoryStore::new()), FailurePolicy::Isolate);
        assert!(loader.load().await.is_err());
    }

    #[tokio::test]
    async fn cancelled_load_persists_nothing() {
        let server = mockito::Server::new_async().await;
        let store = Arc::new(MemoryStore::new());
        let loader = loader(&server, store.clone(), FailurePolicy::Isolate);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = loader.load_with_report(&cancel).await;

        assert!(result.is_err());
        assert!(store.get(SNAPSHOT_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let mut server = mockito::Server::new_async().await;
        let index = mock_index(&mut server, &["bulbasaur", "charmander", "squirtle"], 2).await;
        let _details = mock_details(&mut server, &STARTERS).await;

        let loader = loader(&server, Arc::new(MemoryStore::new()), FailurePolicy::Isolate);
        loader.load().await.unwrap();
        assert!(loader.invalidate().await.unwrap());
        assert!(!loader.status().await.unwrap().stored);
        loader.load().await.unwrap();

        index.assert_async().await;
    }

    #[tokio::test(start_paused = true)]
    async fn detail_fan_out_respects_concurrency_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results: Vec<usize> = bounded(0..10, 2, |i| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                i
            }
        })
        .collect()
        .await;

        assert_eq!(results.len(), 10);
        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_concurrency_still_makes_progress() {
        let results: Vec<u32> = bounded(vec![1, 2, 3], 0, |i| async move { i * 2 }).collect().await;
        let mut sorted = results;
        sorted.sort();
        assert_eq!(sorted, vec![2, 4, 6]);
    }
}
