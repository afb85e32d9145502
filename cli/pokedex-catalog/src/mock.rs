//! A catalog client serving canned responses, for tests.
//!
//! Responses are keyed by URL rather than queued, because the SDK issues
//! requests concurrently and their order is not deterministic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::debug;

use crate::cache::ResponseCache;
use crate::client::ClientTrait;
use crate::error::FetchError;

const MOCK_CATALOG_URL: &str = "https://mock.pokedex.test/api/v2";

// Arc allows you to push things into the client from outside the client if necessary
// Mutex allows you to share across threads (necessary because of tokio)
type MockField<T> = Arc<Mutex<T>>;

/// What the mock answers for a URL.
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    /// 200 with this body.
    Json(Value),
    /// Non-success status.
    Status(u16),
    /// The request never reaches a server.
    Transport(String),
}

#[derive(Debug, Clone)]
struct MockRoute {
    response: MockResponse,
    delay: Option<Duration>,
}

/// A catalog client that can be seeded with mock responses.
///
/// Unknown URLs answer 404, like the real catalog.
/// Every call to [`ClientTrait::fetch_resource`] is counted per URL,
/// cache hits never reach it.
#[derive(Debug, Clone)]
pub struct MockClient {
    catalog_url: String,
    cache: ResponseCache,
    routes: MockField<HashMap<String, MockRoute>>,
    calls: MockField<HashMap<String, usize>>,
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new(ResponseCache::new())
    }
}

impl MockClient {
    pub fn new(cache: ResponseCache) -> Self {
        Self {
            catalog_url: MOCK_CATALOG_URL.to_string(),
            cache,
            routes: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Answer requests for `url` with `response`.
    pub fn respond(&self, url: impl Into<String>, response: MockResponse) {
        self.route(url.into(), response, None);
    }

    fn route(&self, url: String, response: MockResponse, delay: Option<Duration>) {
        self.routes
            .lock()
            .expect("couldn't acquire mock lock")
            .insert(url, MockRoute { response, delay });
    }

    /// Number of uncached fetches of `url`.
    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .expect("couldn't acquire mock lock")
            .get(url)
            .copied()
            .unwrap_or_default()
    }

    /// Number of uncached fetches across all URLs.
    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .expect("couldn't acquire mock lock")
            .values()
            .sum()
    }

    pub fn details_url(&self, id: u32) -> String {
        format!("{}/pokemon/{id}", self.catalog_url)
    }

    pub fn species_url(&self, id: u32) -> String {
        format!("{}/pokemon-species/{id}", self.catalog_url)
    }

    pub fn evolution_chain_url(&self, chain_id: u32) -> String {
        format!("{}/evolution-chain/{chain_id}/", self.catalog_url)
    }

    /// Register details, species and a single-stage evolution chain
    /// for entry `id`, with the chain stored under `chain_id`.
    pub fn seed_entry(&self, id: u32, chain_id: u32) {
        self.seed_entry_after(id, chain_id, None);
    }

    /// Like [`MockClient::seed_entry`], but the details request of `id`
    /// takes `delay` to answer.
    pub fn seed_entry_after(&self, id: u32, chain_id: u32, delay: Option<Duration>) {
        let name = format!("pokemon-{id}");
        let chain_url = self.evolution_chain_url(chain_id);

        self.route(
            self.details_url(id),
            MockResponse::Json(json!({
                "id": id,
                "name": name,
                "base_experience": 64,
                "height": 7,
                "weight": 69,
                "sprites": {
                    "front_default": format!("https://sprites.test/{id}.png"),
                    "other": {
                        "official-artwork": {
                            "front_default": format!("https://artwork.test/{id}.png")
                        }
                    }
                },
                "stats": [{
                    "base_stat": 45,
                    "effort": 0,
                    "stat": { "name": "hp", "url": "https://pokeapi.co/api/v2/stat/1/" }
                }],
                "types": [{
                    "slot": 1,
                    "type": { "name": "normal", "url": "https://pokeapi.co/api/v2/type/1/" }
                }],
                "abilities": [],
                "moves": []
            })),
            delay,
        );
        self.route(
            self.species_url(id),
            MockResponse::Json(json!({
                "id": id,
                "name": name,
                "capture_rate": 45,
                "growth_rate": { "name": "medium-slow", "url": "https://pokeapi.co/api/v2/growth-rate/4/" },
                "evolution_chain": { "url": chain_url },
                "flavor_text_entries": [],
                "genera": []
            })),
            None,
        );
        self.route(
            chain_url,
            MockResponse::Json(json!({
                "id": chain_id,
                "chain": {
                    "species": {
                        "name": name,
                        "url": format!("https://pokeapi.co/api/v2/pokemon-species/{id}/")
                    },
                    "evolution_details": [],
                    "evolves_to": []
                }
            })),
            None,
        );
    }
}

impl ClientTrait for MockClient {
    fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn fetch_resource(&self, url: &str) -> Result<Value, FetchError> {
        *self
            .calls
            .lock()
            .expect("couldn't acquire mock lock")
            .entry(url.to_string())
            .or_default() += 1;

        let route = self
            .routes
            .lock()
            .expect("couldn't acquire mock lock")
            .get(url)
            .cloned();

        let Some(route) = route else {
            debug!(url, "no mock response registered");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND,
            });
        };

        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }

        match route.response {
            MockResponse::Json(value) => Ok(value),
            MockResponse::Status(code) => Err(FetchError::Status {
                url: url.to_string(),
                status: StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            }),
            MockResponse::Transport(message) => Err(FetchError::Transport {
                url: url.to_string(),
                message,
            }),
        }
    }
}
