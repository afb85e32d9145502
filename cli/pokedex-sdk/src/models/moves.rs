use futures::future::try_join_all;
use itertools::Itertools;
use pokedex_catalog::types::{MoveDetails, MoveVersionDetail, PokemonDetails};
use pokedex_catalog::{ClientTrait, FetchError};
use serde::Serialize;
use tracing::debug;

/// Entries can know well over a hundred moves, only this many are looked up.
pub const MOVE_DETAILS_LIMIT: usize = 20;
pub const DEFAULT_LEARN_METHOD: &str = "level-up";
const ENGLISH: &str = "en";

/// A move together with the ways an entry learns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnableMove {
    pub details: MoveDetails,
    pub learn_methods: Vec<MoveVersionDetail>,
}

impl LearnableMove {
    pub fn is_learned_by(&self, method: &str) -> bool {
        self.learn_methods
            .iter()
            .any(|detail| detail.move_learn_method.name == method)
    }

    /// Lowest level the move is learned at through `method`, if it is.
    pub fn level_learned_at(&self, method: &str) -> Option<u32> {
        self.learn_methods
            .iter()
            .filter(|detail| detail.move_learn_method.name == method)
            .map(|detail| detail.level_learned_at)
            .min()
    }

    pub fn type_name(&self) -> &str {
        &self.details.r#type.name
    }

    /// English flavor text, falling back to the first entry in any language.
    pub fn flavor_text(&self) -> Option<&str> {
        let entries = &self.details.flavor_text_entries;
        entries
            .iter()
            .find(|entry| entry.language.name == ENGLISH)
            .or(entries.first())
            .map(|entry| entry.flavor_text.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoveList {
    moves: Vec<LearnableMove>,
}

impl MoveList {
    /// Look up the first [`MOVE_DETAILS_LIMIT`] moves of `pokemon` concurrently.
    ///
    /// Fails as a whole if any lookup fails.
    pub async fn fetch(
        client: &impl ClientTrait,
        pokemon: &PokemonDetails,
    ) -> Result<Self, FetchError> {
        let known = &pokemon.moves[..pokemon.moves.len().min(MOVE_DETAILS_LIMIT)];
        debug!(
            id = pokemon.id,
            total = pokemon.moves.len(),
            fetching = known.len(),
            "fetching move details"
        );

        let details = try_join_all(known.iter().map(|known| client.move_details(&known.r#move.url)))
            .await?;

        let moves = details
            .into_iter()
            .zip(known)
            .map(|(details, known)| LearnableMove {
                details,
                learn_methods: known.version_group_details.clone(),
            })
            .collect();

        Ok(Self { moves })
    }

    pub fn moves(&self) -> &[LearnableMove] {
        &self.moves
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Moves learned through `method`, optionally only those of `move_type`.
    ///
    /// A `move_type` of `all` does not filter.
    pub fn filtered<'a>(
        &'a self,
        method: &'a str,
        move_type: Option<&'a str>,
    ) -> impl Iterator<Item = &'a LearnableMove> + 'a {
        let move_type = move_type.filter(|move_type| *move_type != "all");
        self.moves.iter().filter(move |learnable| {
            learnable.is_learned_by(method)
                && move_type.is_none_or(|move_type| learnable.type_name() == move_type)
        })
    }

    /// Distinct move types, in the order they first appear.
    pub fn move_types(&self) -> Vec<&str> {
        self.moves
            .iter()
            .map(LearnableMove::type_name)
            .unique()
            .collect()
    }
}
