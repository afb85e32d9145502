use anyhow::{Context, Result};
use bpaf::Bpaf;
use indoc::formatdoc;
use itertools::Itertools;
use pokedex_catalog::ClientTrait;
use pokedex_sdk::models::entry::CatalogEntry;
use pokedex_sdk::models::evolution::EvolutionLine;
use pokedex_sdk::models::moves::{DEFAULT_LEARN_METHOD, LearnableMove, MoveList};
use pokedex_sdk::models::species_info::{CatchInfo, description, genus};
use pokedex_sdk::models::type_chart::TypeEffectiveness;
use serde::Serialize;
use tracing::{debug, instrument};

use super::types::render_effectiveness;
use crate::config::Config;
use crate::utils::init::init_catalog_client;
use crate::utils::message;

// Show everything known about one entry
#[derive(Debug, Bpaf, Clone)]
pub struct Show {
    /// Also list the moves the entry learns
    #[bpaf(long)]
    moves: bool,

    /// Only list moves learned this way, e.g. 'machine'
    #[bpaf(long, argument("method"), fallback(DEFAULT_LEARN_METHOD.to_string()))]
    method: String,

    /// Only list moves of this type, 'all' lists every type
    #[bpaf(long("move-type"), argument("type"))]
    move_type: Option<String>,

    /// Show the shiny artwork
    #[bpaf(long)]
    shiny: bool,

    /// Print the entry as JSON, including the artwork of every evolution stage
    #[bpaf(long)]
    json: bool,

    /// The number of the entry, e.g. '25'
    #[bpaf(positional("id"))]
    id: u32,
}

/// Everything `show` prints.
#[derive(Debug, Serialize)]
struct EntryReport {
    entry: CatalogEntry,
    artwork: Option<String>,
    description: Option<String>,
    genus: String,
    catch_info: CatchInfo,
    effectiveness: TypeEffectiveness,
    evolution: EvolutionLine,
    moves: Option<MoveList>,
}

impl Show {
    #[instrument(name = "show", skip_all, fields(id = self.id))]
    pub async fn handle(self, config: Config) -> Result<()> {
        let client = init_catalog_client(&config)?;
        let report = self.report(&client).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        print!("{}", render_report(&report));
        if let Some(moves) = &report.moves {
            let selected = moves
                .filtered(&self.method, self.move_type.as_deref())
                .collect::<Vec<_>>();
            if selected.is_empty() {
                message::warning(format!(
                    "No moves learned by '{}'. Move types: {}",
                    self.method,
                    moves.move_types().join(", ")
                ));
            } else {
                print!("{}", render_moves(&selected, &self.method));
            }
        }
        Ok(())
    }

    async fn report(&self, client: &impl ClientTrait) -> Result<EntryReport> {
        let entry = CatalogEntry::fetch(client, self.id)
            .await
            .with_context(|| format!("Could not load entry #{}", self.id))?;
        debug!(name = entry.name(), "loaded entry");

        // only the JSON output carries the artwork of the stages
        let evolution = EvolutionLine::from_chain(&entry.evolution_chain);
        let evolution = if self.json {
            evolution.with_artwork(client).await
        } else {
            evolution
        };

        let artwork = if self.shiny {
            entry.details.shiny_artwork()
        } else {
            entry.details.artwork()
        };

        let moves = if self.moves {
            let moves = MoveList::fetch(client, &entry.details)
                .await
                .context("Could not load moves")?;
            Some(moves)
        } else {
            None
        };

        Ok(EntryReport {
            artwork: artwork.map(ToString::to_string),
            description: description(&entry.species),
            genus: genus(&entry.species).to_string(),
            catch_info: CatchInfo::new(&entry.species, entry.details.base_experience),
            effectiveness: TypeEffectiveness::for_type_names(entry.type_names()),
            evolution,
            moves,
            entry,
        })
    }
}

fn render_report(report: &EntryReport) -> String {
    let entry = &report.entry;
    let details = &entry.details;
    let catch_info = &report.catch_info;

    let mut out = formatdoc! {"
        #{id:03} {name}  {genus}
        Types:            {types}
        Height:           {height:.1} m
        Weight:           {weight:.1} kg
        ",
        id = entry.id(),
        name = entry.name(),
        genus = report.genus,
        types = entry.type_names().join("/"),
        height = f64::from(details.height) / 10.0,
        weight = f64::from(details.weight) / 10.0,
    };

    if let Some(artwork) = &report.artwork {
        out.push_str(&format!("Artwork:          {artwork}\n"));
    }

    if let Some(description) = &report.description {
        out.push_str(&format!("\n{description}\n"));
    }

    out.push_str("\nBase stats\n");
    for stat in &details.stats {
        out.push_str(&format!("  {:<16} {:>3}\n", stat.stat.name, stat.base_stat));
    }

    if !details.abilities.is_empty() {
        let abilities = details
            .abilities
            .iter()
            .map(|ability| match ability.is_hidden {
                true => format!("{} (hidden)", ability.ability.name),
                false => ability.ability.name.clone(),
            })
            .join(", ");
        out.push_str(&format!("Abilities:        {abilities}\n"));
    }

    out.push_str(&formatdoc! {"

        Catching
          Capture rate:   {rate} ({percentage}%, {difficulty})
          Growth rate:    {growth_rate}
          Base exp.:      {base_experience}
        ",
        rate = catch_info.capture_rate,
        percentage = catch_info.percentage,
        difficulty = catch_info.difficulty,
        growth_rate = catch_info.growth_rate,
        base_experience = catch_info
            .base_experience
            .map(|exp| exp.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    });

    out.push_str("\nType matchups\n");
    out.push_str(&render_effectiveness(&report.effectiveness));

    if !report.evolution.is_trivial() {
        out.push_str("\nEvolution\n");
        for stage in report.evolution.stages() {
            let condition = match (stage.min_level, &stage.trigger) {
                (Some(level), _) => format!(" (Lv. {level})"),
                (None, Some(trigger)) => format!(" ({trigger})"),
                (None, None) => String::new(),
            };
            out.push_str(&format!(
                "  {}{}{condition}\n",
                "  ".repeat(stage.depth),
                stage.name
            ));
        }
    }

    out
}

fn render_moves(moves: &[&LearnableMove], method: &str) -> String {
    let mut out = format!("\nMoves ({method})\n");
    for learnable in moves {
        let details = &learnable.details;
        let level = learnable
            .level_learned_at(method)
            .filter(|level| *level > 0)
            .map(|level| format!("Lv. {level}"))
            .unwrap_or_default();
        let power = details
            .power
            .map(|power| power.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {:<20} {:<10} {:<8} power {power}\n",
            details.name,
            learnable.type_name(),
            level,
        ));
    }
    out
}
