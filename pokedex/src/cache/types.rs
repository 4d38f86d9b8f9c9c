use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::pokeapi::{CatalogEntry, PokemonDetail};

/// Bump whenever the persisted snapshot layout changes.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Per-entry attributes resolved by the detail fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailRecord {
    pub image_url: String,
    pub categories: Vec<String>,
    pub height: i64,
    pub weight: i64,
}

impl From<PokemonDetail> for DetailRecord {
    fn from(detail: PokemonDetail) -> Self {
        Self {
            image_url: detail.image_url().unwrap_or_default().to_string(),
            categories: detail.type_names(),
            height: detail.height,
            weight: detail.weight,
        }
    }
}

/// The complete cached dataset: index plus four lookup maps keyed by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Blobs written before versioning deserialize as 0 and get rejected
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub cached_at: DateTime<Utc>,
    pub entries: Vec<CatalogEntry>,
    pub images: HashMap<String, String>,
    pub categories: HashMap<String, Vec<String>>,
    pub heights: HashMap<String, i64>,
    pub weights: HashMap<String, i64>,
}

/// Why a stored snapshot can't be served
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotRejection {
    #[error("schema version {found} does not match {}", SNAPSHOT_SCHEMA_VERSION)]
    VersionMismatch { found: u32 },

    #[error("expired ({age_secs}s old)")]
    Expired { age_secs: i64 },

    #[error("{missing} entries lack detail data")]
    Incomplete { missing: usize },
}

impl CacheSnapshot {
    pub fn empty() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            cached_at: Utc::now(),
            entries: Vec::new(),
            images: HashMap::new(),
            categories: HashMap::new(),
            heights: HashMap::new(),
            weights: HashMap::new(),
        }
    }

    /// Append an entry and populate all four maps at its name
    pub fn insert(&mut self, entry: CatalogEntry, record: DetailRecord) {
        let name = entry.name.clone();
        self.images.insert(name.clone(), record.image_url);
        self.categories.insert(name.clone(), record.categories);
        self.heights.insert(name.clone(), record.height);
        self.weights.insert(name, record.weight);
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Reassemble the detail record for `name` from the lookup maps
    pub fn record(&self, name: &str) -> Option<DetailRecord> {
        Some(DetailRecord {
            image_url: self.images.get(name)?.clone(),
            categories: self.categories.get(name)?.clone(),
            height: *self.heights.get(name)?,
            weight: *self.weights.get(name)?,
        })
    }

    pub fn categories_of(&self, name: &str) -> Option<&[String]> {
        self.categories.get(name).map(Vec::as_slice)
    }

    /// Number of entries missing from at least one lookup map
    pub fn missing_details(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| {
                !(self.images.contains_key(&e.name)
                    && self.categories.contains_key(&e.name)
                    && self.heights.contains_key(&e.name)
                    && self.weights.contains_key(&e.name))
            })
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_details() == 0
    }

    /// Sorted, de-duplicated category names across the catalog
    pub fn all_categories(&self) -> Vec<String> {
        self.categories
            .values()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.cached_at).num_seconds()
    }

    /// Check a stored snapshot before serving it
    pub fn validate(
        &self,
        ttl: Option<chrono::Duration>,
        now: DateTime<Utc>,
    ) -> Result<(), SnapshotRejection> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotRejection::VersionMismatch {
                found: self.schema_version,
            });
        }
        if let Some(ttl) = ttl {
            if now - self.cached_at > ttl {
                return Err(SnapshotRejection::Expired {
                    age_secs: self.age_secs(now),
                });
            }
        }
        let missing = self.missing_details();
        if missing > 0 {
            return Err(SnapshotRejection::Incomplete { missing });
        }
        Ok(())
    }
}

/// Cache status for the CLI and `/api/cache/status`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub stored: bool,
    pub fresh: bool,
    pub schema_version: Option<u32>,
    pub cached_at: Option<DateTime<Utc>>,
    pub age_secs: Option<i64>,
    pub entry_count: usize,
    pub cache_hits: i64,
    pub cache_misses: i64,
    pub hit_rate: f64,
    pub rejection: Option<String>,
}
