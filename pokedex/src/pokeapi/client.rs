// PokeAPI client - https://pokeapi.co/docs/v2
use super::error::ApiError;
use super::types::*;
use crate::config::{PokedexConfig, RetryConfig};
use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("pokedex/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the index and detail endpoints
pub struct PokeApiClient {
    client: Client,
    base_url: Url,
    retry: RetryConfig,
}

impl PokeApiClient {
    /// Create a client from runtime config
    pub fn new(config: &PokedexConfig) -> Result<Self> {
        Self::with_base_url(
            &config.api_base_url,
            config.request_timeout(),
            config.retry.clone(),
        )
    }

    /// Create a client against an arbitrary base URL (mirrors, test servers)
    pub fn with_base_url(base_url: &str, timeout: Duration, retry: RetryConfig) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    /// Fetch the first `limit` index entries, in API order
    /// Endpoint: GET /pokemon?limit={limit}
    pub async fn get_index(&self, limit: usize) -> Result<Vec<CatalogEntry>, ApiError> {
        let url = self.index_url(limit)?;
        log::info!("🔍 Fetching catalog index ({} entries) from {}", limit, url);

        let index: IndexResponse = self.get_with_retry(url.as_str()).await?;

        log::info!("✅ Received {} index entries", index.results.len());
        Ok(index.results)
    }

    /// Fetch one detail record by its absolute URL
    pub async fn get_detail(&self, url: &str) -> Result<PokemonDetail, ApiError> {
        self.get_with_retry(url).await
    }

    fn index_url(&self, limit: usize) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base URL".to_string(),
            })?
            .pop_if_empty()
            .push("pokemon");
        url.query_pairs_mut()
            .clear()
            .append_pair("limit", &limit.to_string());
        Ok(url)
    }

    /// GET with exponential backoff on transient failures
    async fn get_with_retry<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let mut attempt = 0;
        loop {
            match self.get_json(url).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    log::warn!(
                        "⚠️ {} (attempt {}/{}), retrying in {:?}",
                        e,
                        attempt + 1,
                        self.retry.max_attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await.map_err(|source| ApiError::Transport {
                    url: url.to_string(),
                    source,
                })?;
                serde_json::from_str(&body).map_err(|source| ApiError::Decode {
                    url: url.to_string(),
                    source,
                })
            }
            status => {
                log::debug!("PokeAPI error ({}) for {}", status, url);
                Err(ApiError::Status {
                    url: url.to_string(),
                    status,
                })
            }
        }
    }
}
