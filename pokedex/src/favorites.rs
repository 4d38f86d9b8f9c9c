use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use utoipa::ToSchema;

use crate::cache::CacheSnapshot;

/// Denormalized copy of a catalog entry, independent of the snapshot cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub name: String,
    pub image_url: String,
    pub height: i64,
    pub weight: i64,
    pub categories: Vec<String>,
}

impl FavoriteEntry {
    /// Copy `name` out of the snapshot; `None` if it isn't fully resolved
    pub fn from_snapshot(snapshot: &CacheSnapshot, name: &str) -> Option<Self> {
        let record = snapshot.record(name)?;
        Some(Self {
            name: name.to_string(),
            image_url: record.image_url,
            height: record.height,
            weight: record.weight,
            categories: record.categories,
        })
    }
}

/// Session-scoped favorites, shared by cloning the handle
#[derive(Clone, Default)]
pub struct FavoritesStore {
    entries: Arc<Mutex<Vec<FavoriteEntry>>>,
}

impl FavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append without de-duplicating; check [`Self::contains`] first
    pub async fn add(&self, entry: FavoriteEntry) {
        log::debug!("Adding favorite {}", entry.name);
        self.entries.lock().await.push(entry);
    }

    /// Append unless a favorite with the same name exists; one lock covers
    /// both the check and the push. Returns whether it was added.
    pub async fn add_if_absent(&self, entry: FavoriteEntry) -> bool {
        let mut entries = self.entries.lock().await;
        if entries.iter().any(|existing| existing.name == entry.name) {
            return false;
        }
        log::debug!("Adding favorite {}", entry.name);
        entries.push(entry);
        true
    }

    /// Remove every favorite called `name`; returns whether any existed
    pub async fn remove(&self, name: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|entry| entry.name != name);
        before != entries.len()
    }

    pub async fn list(&self) -> Vec<FavoriteEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.entries.lock().await.iter().any(|entry| entry.name == name)
    }

    /// Add `name` from the snapshot if absent, remove it if present.
    /// Returns the new membership.
    pub async fn toggle(&self, name: &str, snapshot: &CacheSnapshot) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        if entries.iter().any(|entry| entry.name == name) {
            entries.retain(|entry| entry.name != name);
            return Ok(false);
        }

        let entry = FavoriteEntry::from_snapshot(snapshot, name)
            .ok_or_else(|| anyhow!("{} is not in the catalog", name))?;
        entries.push(entry);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn starters() -> CacheSnapshot {
        test_support::snapshot(&[
            ("bulbasaur", &["grass", "poison"]),
            ("charmander", &["fire"]),
            ("squirtle", &["water"]),
        ])
    }

    #[tokio::test]
    async fn add_then_remove_restores_previous_list() {
        let snapshot = starters();
        let favorites = FavoritesStore::new();
        favorites
            .add(FavoriteEntry::from_snapshot(&snapshot, "bulbasaur").unwrap())
            .await;
        let before = favorites.list().await;

        favorites
            .add(FavoriteEntry::from_snapshot(&snapshot, "squirtle").unwrap())
            .await;
        assert!(favorites.remove("squirtle").await);

        assert_eq!(favorites.list().await, before);
    }

    #[tokio::test]
    async fn add_does_not_deduplicate() {
        let snapshot = starters();
        let favorites = FavoritesStore::new();
        let entry = FavoriteEntry::from_snapshot(&snapshot, "charmander").unwrap();
        favorites.add(entry.clone()).await;
        favorites.add(entry).await;
        assert_eq!(favorites.list().await.len(), 2);

        assert!(favorites.remove("charmander").await);
        assert!(favorites.list().await.is_empty());
        assert!(!favorites.remove("charmander").await);
    }

    #[tokio::test]
    async fn toggle_flips_membership() {
        let snapshot = starters();
        let favorites = FavoritesStore::new();

        assert!(favorites.toggle("squirtle", &snapshot).await.unwrap());
        assert!(favorites.contains("squirtle").await);
        assert!(!favorites.toggle("squirtle", &snapshot).await.unwrap());
        assert!(!favorites.contains("squirtle").await);
        assert!(favorites.toggle("missingno", &snapshot).await.is_err());
    }

    #[tokio::test]
    async fn favorites_survive_snapshot_changes() {
        let mut snapshot = starters();
        let favorites = FavoritesStore::new();
        favorites.toggle("bulbasaur", &snapshot).await.unwrap();

        snapshot = CacheSnapshot::empty();
        assert!(snapshot.is_empty());

        let list = favorites.list().await;
        assert_eq!(list[0].categories, vec!["grass", "poison"]);
        assert_eq!(list[0].image_url, "https://img.example/art/bulbasaur.png");
    }

    #[tokio::test]
    async fn clones_share_state() {
        let snapshot = starters();
        let favorites = FavoritesStore::new();
        let handle = favorites.clone();
        handle.toggle("charmander", &snapshot).await.unwrap();
        assert!(favorites.contains("charmander").await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_add_if_absent_keeps_one_copy() {
        let snapshot = starters();
        let favorites = FavoritesStore::new();
        let entry = FavoriteEntry::from_snapshot(&snapshot, "squirtle").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let favorites = favorites.clone();
                let entry = entry.clone();
                tokio::spawn(async move { favorites.add_if_absent(entry).await })
            })
            .collect();

        let mut added = 0;
        for handle in handles {
            if handle.await.unwrap() {
                added += 1;
            }
        }

        assert_eq!(added, 1);
        assert_eq!(favorites.list().await.len(), 1);
        assert!(!favorites.add_if_absent(entry).await);
    }
}
