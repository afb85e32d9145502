//! Catalog client and the trait seam consumers program against.

use std::fmt::Debug;
use std::str::FromStr;
use std::time::Duration;

use enum_dispatch::enum_dispatch;
use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::cache::ResponseCache;
use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, FetchError};
use crate::mock::MockClient;
use crate::types::{EvolutionChain, MoveDetails, PokemonDetails, PokemonSpecies};

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// The complete catalog API interface.
///
/// Implementors provide raw GETs and access to their [`ResponseCache`],
/// everything else is derived from those:
/// - **HTTP**: REST calls to the catalog API via [`CatalogClient`]
/// - **Mock**: canned per-URL responses without HTTP via [`MockClient`]
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// Base URL endpoint paths are appended to.
    fn catalog_url(&self) -> &str;

    /// The cache backing [`ClientTrait::fetch_cached_resource`].
    fn cache(&self) -> &ResponseCache;

    /// GET `url` and parse the body as JSON. No retries.
    async fn fetch_resource(&self, url: &str) -> Result<Value, FetchError>;

    /// Like [`ClientTrait::fetch_resource`], but served from the cache if
    /// `url` was fetched successfully before.
    ///
    /// Only successes are cached, so a transient failure does not poison
    /// later lookups of the same URL.
    async fn fetch_cached_resource(&self, url: &str) -> Result<Value, FetchError> {
        if let Some(value) = self.cache().get(url) {
            trace!(url, "cache hit");
            return Ok(value);
        }

        let value = self.fetch_resource(url).await?;
        self.cache().insert(url, value.clone());
        Ok(value)
    }

    /// Base details of an entry, `GET /pokemon/{id}`.
    async fn pokemon_details(&self, id: u32) -> Result<PokemonDetails, FetchError> {
        let url = format!("{}/pokemon/{id}", self.catalog_url());
        let value = self.fetch_resource(&url).await?;
        decode(&url, value)
    }

    /// Species metadata of an entry, `GET /pokemon-species/{id}`.
    async fn pokemon_species(&self, id: u32) -> Result<PokemonSpecies, FetchError> {
        let url = format!("{}/pokemon-species/{id}", self.catalog_url());
        let value = self.fetch_cached_resource(&url).await?;
        decode(&url, value)
    }

    /// The evolution tree at `url`, as referenced by
    /// [`PokemonSpecies::evolution_chain`].
    async fn evolution_chain(&self, url: &str) -> Result<EvolutionChain, FetchError> {
        let value = self.fetch_cached_resource(url).await?;
        decode(url, value)
    }

    /// Details of a move at `url`, as referenced by an entry's move list.
    async fn move_details(&self, url: &str) -> Result<MoveDetails, FetchError> {
        let value = self.fetch_cached_resource(url).await?;
        decode(url, value)
    }

    /// Official artwork of entry `id`, if it has any.
    ///
    /// Goes through the cache, evolution lines ask for the same entries
    /// over and over.
    async fn pokemon_artwork(&self, id: u32) -> Result<Option<String>, FetchError> {
        let url = format!("{}/pokemon/{id}", self.catalog_url());
        let value = self.fetch_cached_resource(&url).await?;
        let details: PokemonDetails = decode(&url, value)?;
        Ok(details.artwork().map(ToString::to_string))
    }
}

/// Either a client for the actual catalog service,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// A client for the catalog service.
///
/// Wraps a [`reqwest::Client`] configured with timeouts and default headers,
/// and owns the [`ResponseCache`] it was constructed with.
pub struct CatalogClient {
    http: reqwest::Client,
    config: CatalogClientConfig,
    cache: ResponseCache,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(
        config: CatalogClientConfig,
        cache: ResponseCache,
    ) -> Result<Self, CatalogClientError> {
        let http = build_http_client(&config)?;
        Ok(Self {
            http,
            config,
            cache,
        })
    }
}

impl ClientTrait for CatalogClient {
    fn catalog_url(&self) -> &str {
        self.config.base_url()
    }

    fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_resource(&self, url: &str) -> Result<Value, FetchError> {
        debug!(url, "sending catalog request");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!(url, %status, "catalog request failed");
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(|e| CatalogClientError::InvalidHeader {
                name: key.clone(),
                message: e.to_string(),
            })?,
            header::HeaderValue::from_str(value).map_err(|e| {
                CatalogClientError::InvalidHeader {
                    name: key.clone(),
                    message: e.to_string(),
                }
            })?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(60));

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder.build().map_err(CatalogClientError::Build)
}
