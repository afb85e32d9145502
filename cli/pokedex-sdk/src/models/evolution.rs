//! Flattening of evolution trees into displayable lines.

use std::collections::HashSet;

use futures::future::join_all;
use pokedex_catalog::ClientTrait;
use pokedex_catalog::types::{ChainLink, EvolutionChain};
use serde::Serialize;
use tracing::debug;

/// One species within an evolution line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionStage {
    /// Species id, `None` if the species URL carries none.
    pub id: Option<u32>,
    pub name: String,
    /// Level at which the previous stage evolves into this one.
    pub min_level: Option<u32>,
    /// Name of the evolution trigger, e.g. `level-up` or `use-item`.
    pub trigger: Option<String>,
    /// Distance from the root of the tree.
    pub depth: usize,
    pub artwork: Option<String>,
}

/// The stages of an evolution tree in pre-order:
/// every stage precedes the stages it evolves into,
/// siblings keep the order the catalog lists them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvolutionLine {
    stages: Vec<EvolutionStage>,
}

impl EvolutionLine {
    pub fn from_chain(chain: &EvolutionChain) -> Self {
        let mut stages = Vec::new();
        let mut visited = HashSet::new();
        let mut pending: Vec<(&ChainLink, usize)> = vec![(&chain.chain, 0)];

        while let Some((link, depth)) = pending.pop() {
            let id = link.species.id();
            if let Some(id) = id {
                if !visited.insert(id) {
                    debug!(id, chain = chain.id, "species listed twice in evolution chain");
                    continue;
                }
            }

            let detail = link.evolution_details.first();
            stages.push(EvolutionStage {
                id,
                name: link.species.name.clone(),
                min_level: detail.and_then(|detail| detail.min_level),
                trigger: detail
                    .and_then(|detail| detail.trigger.as_ref())
                    .map(|trigger| trigger.name.clone()),
                depth,
                artwork: None,
            });

            // reversed so the first child is popped first
            for next in link.evolves_to.iter().rev() {
                pending.push((next, depth + 1));
            }
        }

        Self { stages }
    }

    /// Look up the artwork of every stage.
    ///
    /// Lookups run concurrently, a failed lookup leaves that stage
    /// without artwork.
    pub async fn with_artwork(mut self, client: &impl ClientTrait) -> Self {
        let lookups = self.stages.iter().map(|stage| async move {
            let id = stage.id?;
            match client.pokemon_artwork(id).await {
                Ok(artwork) => artwork,
                Err(err) => {
                    debug!(id, %err, "could not look up artwork");
                    None
                },
            }
        });
        let artworks = join_all(lookups).await;

        for (stage, artwork) in self.stages.iter_mut().zip(artworks) {
            stage.artwork = artwork;
        }
        self
    }

    pub fn stages(&self) -> &[EvolutionStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// A species that does not evolve forms a line of one.
    pub fn is_trivial(&self) -> bool {
        self.stages.len() <= 1
    }
}
