use anyhow::{Context, Result};
use pokedex_catalog::{CatalogClient, CatalogClientConfig, Client, ClientTrait, ResponseCache};
use pokedex_sdk::models::index::StaticIndex;
use tracing::debug;

use crate::config::Config;

fn default_user_agent() -> String {
    format!("pokedex/{}", env!("CARGO_PKG_VERSION"))
}

/// Initialize the catalog client with a fresh response cache.
pub fn init_catalog_client(config: &Config) -> Result<Client> {
    let client_config = CatalogClientConfig {
        catalog_url: config.catalog_url.clone(),
        extra_headers: config.extra_headers.clone(),
        user_agent: Some(config.user_agent.clone().unwrap_or_else(default_user_agent)),
    };

    debug!(catalog_url = %client_config.catalog_url, "using catalog client");
    let client = CatalogClient::new(client_config, ResponseCache::new())
        .context("Could not create catalog client")?;
    Ok(client.into())
}

/// Read the static index from the configured file,
/// fetch it from the catalog listing,
/// or generate it for the configured number of entries.
pub async fn init_static_index(
    config: &Config,
    client: &impl ClientTrait,
) -> Result<StaticIndex> {
    match &config.index_file {
        Some(path) => {
            debug!(path = %path.display(), "reading static index");
            StaticIndex::from_json_file(path).context("Could not load static index")
        },
        None if config.fetch_index => {
            debug!(size = config.index_size, "fetching static index");
            StaticIndex::fetch(client, config.index_size)
                .await
                .context("Could not fetch static index")
        },
        None => {
            debug!(size = config.index_size, "generating static index");
            Ok(StaticIndex::generated(
                client.catalog_url(),
                config.index_size,
            ))
        },
    }
}
