use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use super::store::KeyValueStore;

/// Thread-safe SQLite key-value store backing the snapshot cache
pub struct CacheManager {
    pub(crate) db: Arc<Mutex<Connection>>,
}

impl CacheManager {
    /// Open (or create) the cache database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        // Enable WAL mode so a running server and the CLI can share the file
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        Self::apply_migrations(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    fn apply_migrations(conn: &Connection) -> Result<()> {
        let migration_001 = include_str!("sql/001_kv_store.sql");
        conn.execute_batch(migration_001)?;
        Ok(())
    }

    /// When `key` was last written, as a unix timestamp
    #[cfg(test)]
    pub async fn updated_at(&self, key: &str) -> Result<Option<i64>> {
        let db = self.db.lock().await;
        let updated = db
            .query_row(
                "SELECT updated_at FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated)
    }

    #[cfg(test)]
    pub async fn count_keys(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let count: i64 = db.query_row("SELECT COUNT(*) FROM kv_store", params![], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl KeyValueStore for CacheManager {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let db = self.db.lock().await;
        let value = db
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let db = self.db.lock().await;
        let removed = db.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    #[tokio::test]
    async fn sqlite_store_round_trips_and_overwrites() {
        let cache = CacheManager::open_in_memory().unwrap();
        assert_eq!(cache.get("pokemonData").await.unwrap(), None);

        cache.put("pokemonData", "{\"a\":1}").await.unwrap();
        cache.put("pokemonData", "{\"a\":2}").await.unwrap();

        assert_eq!(
            cache.get("pokemonData").await.unwrap().as_deref(),
            Some("{\"a\":2}")
        );
        assert_eq!(cache.count_keys().await.unwrap(), 1);
        assert!(cache.updated_at("pokemonData").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let cache = CacheManager::open_in_memory().unwrap();
        cache.put("k", "v").await.unwrap();
        assert!(cache.delete("k").await.unwrap());
        assert!(!cache.delete("k").await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_behaves_like_sqlite() {
        let store = MemoryStore::new();
        store.put("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }
}
