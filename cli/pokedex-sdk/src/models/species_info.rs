//! Human readable summaries of species metadata.

use derive_more::Display;
use itertools::Itertools;
use pokedex_catalog::types::PokemonSpecies;
use serde::Serialize;

const ENGLISH: &str = "en";
const MAX_CAPTURE_RATE: f64 = 255.0;

/// The most recent English flavor text, whitespace normalized.
///
/// The catalog lists entries oldest game first.
pub fn description(species: &PokemonSpecies) -> Option<String> {
    let latest = species
        .flavor_text_entries
        .iter()
        .rfind(|entry| entry.language.name == ENGLISH)?;

    // flavor texts carry hard line breaks and form feeds from the game text boxes
    Some(latest.flavor_text.split_whitespace().join(" "))
}

/// The English genus, e.g. "Seed Pokémon", or an empty string.
pub fn genus(species: &PokemonSpecies) -> &str {
    species
        .genera
        .iter()
        .find(|genus| genus.language.name == ENGLISH)
        .map(|genus| genus.genus.as_str())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum CatchDifficulty {
    #[display("Very Easy to Catch")]
    VeryEasy,
    #[display("Moderate Catch Rate")]
    Moderate,
    #[display("Hard to Catch")]
    Hard,
    #[display("Very Hard to Catch")]
    VeryHard,
}

impl CatchDifficulty {
    pub fn from_capture_rate(rate: u8) -> Self {
        match rate {
            200.. => CatchDifficulty::VeryEasy,
            100..=199 => CatchDifficulty::Moderate,
            45..=99 => CatchDifficulty::Hard,
            _ => CatchDifficulty::VeryHard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatchInfo {
    pub capture_rate: u8,
    /// `capture_rate` relative to the maximum of 255, rounded.
    pub percentage: u8,
    pub difficulty: CatchDifficulty,
    /// Title cased, "Unknown" if the catalog does not say.
    pub growth_rate: String,
    pub base_experience: Option<u32>,
}

impl CatchInfo {
    pub fn new(species: &PokemonSpecies, base_experience: Option<u32>) -> Self {
        let capture_rate = species.capture_rate;
        let growth_rate = species
            .growth_rate
            .as_ref()
            .map(|rate| rate.name.as_str())
            .unwrap_or("unknown");

        Self {
            capture_rate,
            percentage: (f64::from(capture_rate) / MAX_CAPTURE_RATE * 100.0).round() as u8,
            difficulty: CatchDifficulty::from_capture_rate(capture_rate),
            growth_rate: title_case(growth_rate),
            base_experience,
        }
    }
}

/// `medium-slow` → `Medium Slow`
fn title_case(name: &str) -> String {
    name.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .join(" ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn species(extra: serde_json::Value) -> PokemonSpecies {
        let mut value = json!({
            "id": 1,
            "name": "bulbasaur",
            "evolution_chain": { "url": "https://pokeapi.co/api/v2/evolution-chain/1/" }
        });
        value
            .as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        serde_json::from_value(value).unwrap()
    }

    fn lang(name: &str) -> serde_json::Value {
        json!({ "name": name, "url": "https://pokeapi.co/api/v2/language/9/" })
    }

    #[test]
    fn description_uses_latest_english_entry() {
        let species = species(json!({
            "flavor_text_entries": [
                { "flavor_text": "old\ntext", "language": lang("en") },
                { "flavor_text": "A strange seed was\nplanted on its\u{c}back at birth.", "language": lang("en") },
                { "flavor_text": "Graine étrange", "language": lang("fr") }
            ]
        }));

        assert_eq!(
            description(&species).as_deref(),
            Some("A strange seed was planted on its back at birth.")
        );
    }

    #[test]
    fn no_english_description() {
        let species = species(json!({
            "flavor_text_entries": [{ "flavor_text": "Graine", "language": lang("fr") }]
        }));
        assert_eq!(description(&species), None);
    }

    #[test]
    fn english_genus() {
        let species = species(json!({
            "genera": [
                { "genus": "Pokémon Graine", "language": lang("fr") },
                { "genus": "Seed Pokémon", "language": lang("en") }
            ]
        }));
        assert_eq!(genus(&species), "Seed Pokémon");
        assert_eq!(genus(&self::species(json!({}))), "");
    }

    #[test]
    fn catch_info() {
        let species = species(json!({
            "capture_rate": 45,
            "growth_rate": { "name": "medium-slow", "url": "https://pokeapi.co/api/v2/growth-rate/4/" }
        }));

        assert_eq!(CatchInfo::new(&species, Some(64)), CatchInfo {
            capture_rate: 45,
            percentage: 18,
            difficulty: CatchDifficulty::Hard,
            growth_rate: "Medium Slow".to_string(),
            base_experience: Some(64),
        });
    }

    #[test]
    fn catch_difficulty_tiers() {
        assert_eq!(CatchDifficulty::from_capture_rate(255), CatchDifficulty::VeryEasy);
        assert_eq!(CatchDifficulty::from_capture_rate(200), CatchDifficulty::VeryEasy);
        assert_eq!(CatchDifficulty::from_capture_rate(199), CatchDifficulty::Moderate);
        assert_eq!(CatchDifficulty::from_capture_rate(100), CatchDifficulty::Moderate);
        assert_eq!(CatchDifficulty::from_capture_rate(45), CatchDifficulty::Hard);
        assert_eq!(CatchDifficulty::from_capture_rate(3), CatchDifficulty::VeryHard);
        assert_eq!(CatchDifficulty::Hard.to_string(), "Hard to Catch");
    }

    #[test]
    fn unknown_growth_rate() {
        let info = CatchInfo::new(&species(json!({ "capture_rate": 255 })), None);
        assert_eq!(info.growth_rate, "Unknown");
        assert_eq!(info.percentage, 100);
    }
}
