use anyhow::Result;
use bpaf::Bpaf;
use itertools::Itertools;
use pokedex_sdk::models::type_chart::{Multiplier, PokemonType, TypeEffectiveness};
use tracing::instrument;

// Show how a type combination fares against every attacking type
#[derive(Debug, Bpaf, Clone)]
pub struct Types {
    /// Print the matchups as JSON
    #[bpaf(long)]
    json: bool,

    /// The defending types, e.g. 'fire flying'
    #[bpaf(positional("type"), some("at least one type is required"))]
    types: Vec<PokemonType>,
}

impl Types {
    #[instrument(name = "types", skip_all)]
    pub fn handle(self) -> Result<()> {
        let effectiveness = TypeEffectiveness::for_types(&self.types);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&effectiveness)?);
        } else {
            println!("{}", self.types.iter().join("/"));
            print!("{}", render_effectiveness(&effectiveness));
        }
        Ok(())
    }
}

fn render_multipliers(multipliers: &[Multiplier]) -> String {
    multipliers
        .iter()
        .map(|m| format!("{} ×{}", m.attacking, m.multiplier))
        .join(", ")
}

/// One line per non-empty category.
pub(super) fn render_effectiveness(effectiveness: &TypeEffectiveness) -> String {
    let mut out = String::new();
    if !effectiveness.weaknesses.is_empty() {
        out.push_str(&format!(
            "  Weak to:      {}\n",
            render_multipliers(&effectiveness.weaknesses)
        ));
    }
    if !effectiveness.resistances.is_empty() {
        out.push_str(&format!(
            "  Resists:      {}\n",
            render_multipliers(&effectiveness.resistances)
        ));
    }
    if !effectiveness.immunities.is_empty() {
        out.push_str(&format!(
            "  Immune to:    {}\n",
            effectiveness.immunities.iter().join(", ")
        ));
    }
    out
}
