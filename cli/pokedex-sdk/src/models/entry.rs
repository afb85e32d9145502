//! Fully enriched catalog entries.

use pokedex_catalog::types::{EvolutionChain, PokemonDetails, PokemonSpecies};
use pokedex_catalog::{ClientTrait, FetchError};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// One species' fully enriched record.
///
/// Base details merged with the species and evolution chain documents.
/// Identity is [`CatalogEntry::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub details: PokemonDetails,
    pub species: PokemonSpecies,
    pub evolution_chain: EvolutionChain,
}

impl CatalogEntry {
    /// Fetch details, then species, then the evolution chain the species
    /// points at, and merge them.
    ///
    /// The first failure aborts the remaining fetches.
    pub async fn fetch(client: &impl ClientTrait, id: u32) -> Result<Self, FetchError> {
        let details = client.pokemon_details(id).await?;
        let species = client.pokemon_species(id).await?;
        let evolution_chain = client.evolution_chain(&species.evolution_chain.url).await?;
        trace!(id, chain = evolution_chain.id, "enriched catalog entry");

        Ok(Self {
            details,
            species,
            evolution_chain,
        })
    }

    pub fn id(&self) -> u32 {
        self.details.id
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.details.type_names()
    }
}
