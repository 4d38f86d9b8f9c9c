use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:1646";

/// What the loader does when some detail fetches fail after retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Drop failed entries, return the rest, skip persisting.
    #[default]
    Isolate,
    /// Any failed entry fails the whole load.
    AllOrNothing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based), doubling and capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay_ms = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Runtime configuration, read from an optional JSON file and then
/// overridden by command line flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PokedexConfig {
    pub api_base_url: String,
    /// Number of entries requested from the index endpoint
    pub index_limit: usize,
    pub page_size: usize,
    pub debounce_ms: u64,
    /// Snapshot lifetime; 0 keeps snapshots forever
    pub cache_ttl_secs: u64,
    pub max_concurrency: usize,
    pub request_timeout_secs: u64,
    pub retry: RetryConfig,
    pub failure_policy: FailurePolicy,
    pub db_path: Option<PathBuf>,
    pub server_addr: String,
}

impl Default for PokedexConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            index_limit: 150,
            page_size: 15,
            debounce_ms: 500,
            cache_ttl_secs: 7 * 24 * 60 * 60,
            max_concurrency: 16,
            request_timeout_secs: 30,
            retry: RetryConfig::default(),
            failure_policy: FailurePolicy::default(),
            db_path: None,
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
        }
    }
}

impl PokedexConfig {
    /// Load config from `path`, or from `~/.pokedex/config.json` when it
    /// exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_config_path() {
                Some(p) if p.exists() => p,
                _ => {
                    log::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("Failed to parse config {}: {}", path.display(), e))?;
        config.validate()?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(anyhow!("page_size must be greater than zero"));
        }
        if self.max_concurrency == 0 {
            return Err(anyhow!("max_concurrency must be greater than zero"));
        }
        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be at least 1"));
        }
        url::Url::parse(&self.api_base_url)
            .map_err(|e| anyhow!("Invalid api_base_url {}: {}", self.api_base_url, e))?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// `None` when snapshots never expire.
    pub fn cache_ttl(&self) -> Option<chrono::Duration> {
        if self.cache_ttl_secs == 0 {
            return None;
        }
        // Out of range counts as never expiring
        i64::try_from(self.cache_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
    }

    /// Database location, `~/.pokedex/cache.db` unless configured
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not determine home directory"))?;
        let db_dir = home_dir.join(".pokedex");
        std::fs::create_dir_all(&db_dir)?;

        Ok(db_dir.join("cache.db"))
    }

    fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".pokedex").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_doubles_and_caps() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 350,
        };
        assert_eq!(retry.delay_for(0), Duration::from_millis(100));
        assert_eq!(retry.delay_for(1), Duration::from_millis(200));
        assert_eq!(retry.delay_for(2), Duration::from_millis(350));
        assert_eq!(retry.delay_for(40), Duration::from_millis(350));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: PokedexConfig =
            serde_json::from_str(r#"{"page_size": 20, "failure_policy": "all_or_nothing"}"#).unwrap();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.index_limit, 150);
        assert_eq!(config.failure_policy, FailurePolicy::AllOrNothing);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn zero_ttl_disables_expiry() {
        let config = PokedexConfig {
            cache_ttl_secs: 0,
            ..PokedexConfig::default()
        };
        assert!(config.cache_ttl().is_none());
        assert!(PokedexConfig::default().cache_ttl().is_some());
    }

    #[test]
    fn huge_ttl_never_expires() {
        let config = PokedexConfig {
            cache_ttl_secs: u64::MAX,
            ..PokedexConfig::default()
        };
        assert!(config.cache_ttl().is_none());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = PokedexConfig {
            page_size: 0,
            ..PokedexConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PokedexConfig {
            api_base_url: "not a url".to_string(),
            ..PokedexConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
