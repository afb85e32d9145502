//! HTTP client infrastructure for the Pokédex catalog API.
//!
//! This crate provides:
//! - HTTP client construction with default headers and timeouts
//! - The [`FetchError`] taxonomy for catalog requests
//! - An injectable [`ResponseCache`] for immutable sub-resources
//! - Typed payloads for the endpoints the SDK consumes
//! - A [`MockClient`] serving canned per-URL responses for tests
//!
//! ## Usage
//!
//! ```ignore
//! use pokedex_catalog::{CatalogClient, CatalogClientConfig, ClientTrait, ResponseCache};
//!
//! let config = CatalogClientConfig {
//!     catalog_url: "https://pokeapi.co/api/v2".to_string(),
//!     ..Default::default()
//! };
//!
//! let client = CatalogClient::new(config, ResponseCache::default())?;
//! let species = client.pokemon_species(25).await?;
//! ```

mod cache;
mod client;
mod config;
mod error;
mod mock;
pub mod types;

pub use cache::ResponseCache;
pub use client::{CatalogClient, Client, ClientTrait};
pub use config::{CatalogClientConfig, DEFAULT_CATALOG_URL};
pub use error::{CatalogClientError, FetchError};
pub use mock::{MockClient, MockResponse};
