use anyhow::{Context, Result, anyhow};
use bpaf::Bpaf;
use futures::{StreamExt, pin_mut};
use itertools::Itertools;
use pokedex_catalog::ClientTrait;
use pokedex_sdk::loader::{CollectionLoader, LoadState};
use pokedex_sdk::models::entry::CatalogEntry;
use pokedex_sdk::models::filter::EntryFilter;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::utils::init::{init_catalog_client, init_static_index};
use crate::utils::message;

// List catalog entries
#[derive(Debug, Bpaf, Clone)]
pub struct List {
    /// Number of batches to load
    #[bpaf(long, argument("N"), fallback(1))]
    batches: usize,

    /// Load every entry of the index
    #[bpaf(long)]
    all: bool,

    /// Only list entries whose name or number contains <term>
    #[bpaf(long, short, argument("term"))]
    search: Option<String>,

    /// Only list entries of <type>, may be given multiple times
    #[bpaf(long("type"), short('t'), argument("type"), many)]
    types: Vec<String>,

    /// Print the entries as JSON
    #[bpaf(long)]
    json: bool,
}

impl List {
    #[instrument(name = "list", skip_all)]
    pub async fn handle(self, config: Config) -> Result<()> {
        let client = init_catalog_client(&config)?;
        let index = init_static_index(&config, &client).await?;
        let loader = CollectionLoader::new(client, index).with_batch_size(config.batch_size);

        let state = self.load(&loader).await?;
        let filter = EntryFilter::new()
            .with_search(self.search.clone().unwrap_or_default())
            .with_types(self.types.clone());
        let entries = filter
            .apply(&state.collection)
            .map(AsRef::as_ref)
            .collect::<Vec<&CatalogEntry>>();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            print!("{}", render_entries(&entries));
        }

        message::plain(render_footer(&state, entries.len()));
        Ok(())
    }

    /// Load as many batches as requested.
    async fn load<C: ClientTrait>(&self, loader: &CollectionLoader<C>) -> Result<LoadState> {
        let stream = loader.batches();
        pin_mut!(stream);

        let mut loaded = 0;
        while let Some(state) = stream.next().await {
            loaded += 1;
            info!(
                batch = loaded,
                entries = state.collection.len(),
                progress = state.progress(),
                "loaded batch"
            );

            if let Some(err) = state.error {
                return Err(anyhow!(err)).context("Could not load catalog entries");
            }
            if !self.all && loaded >= self.batches {
                break;
            }
        }

        debug!(batches = loaded, "done loading");
        Ok(loader.snapshot())
    }
}

fn render_entries(entries: &[&CatalogEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            format!(
                "#{:<5} {:<24} {}\n",
                entry.id(),
                entry.name(),
                entry.type_names().join("/")
            )
        })
        .collect()
}

fn render_footer(state: &LoadState, shown: usize) -> String {
    let mut footer = format!(
        "Showing {shown} of {} loaded entries ({} of {} processed, {:.0}%)",
        state.collection.len(),
        state.cursor,
        state.index_size,
        state.progress()
    );
    if state.has_more {
        footer.push_str("\nUse '--batches <N>' or '--all' to load more.");
    }
    footer
}

#[cfg(test)]
mod tests {
    use bpaf::Parser;
    use pokedex_catalog::MockClient;
    use pokedex_sdk::models::index::StaticIndex;
    use pretty_assertions::assert_eq;

    use super::*;

    fn list_args(args: &[&str]) -> List {
        list().to_options().run_inner(args).unwrap()
    }

    fn loader(count: u32) -> CollectionLoader<MockClient> {
        let client = MockClient::default();
        for id in 1..=count {
            client.seed_entry(id, id);
        }
        let index = StaticIndex::generated(client.catalog_url(), count);
        CollectionLoader::new(client, index)
    }

    #[tokio::test]
    async fn loads_requested_batches() {
        let loader = loader(50).with_batch_size(10);

        let state = list_args(&["--batches", "2"]).load(&loader).await.unwrap();

        assert_eq!(state.collection.len(), 20);
        assert!(state.has_more);
    }

    #[tokio::test]
    async fn loads_everything() {
        let loader = loader(50).with_batch_size(10);

        let state = list_args(&["--all"]).load(&loader).await.unwrap();

        assert_eq!(state.collection.len(), 50);
        assert!(!state.has_more);
    }

    #[tokio::test]
    async fn renders_table() {
        let loader = loader(2);
        let state = list_args(&[]).load(&loader).await.unwrap();
        let entries = state
            .collection
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&CatalogEntry>>();

        assert_eq!(
            render_entries(&entries),
            "#1     pokemon-1                normal\n#2     pokemon-2                normal\n"
        );
        assert_eq!(
            render_footer(&state, 1),
            "Showing 1 of 2 loaded entries (2 of 2 processed, 100%)"
        );
    }

    #[tokio::test]
    async fn corrupt_index_fails() {
        let index = StaticIndex::new(vec![
            pokedex_sdk::models::index::CatalogEntryRef::new("bad", "not a url"),
        ]);
        let loader = CollectionLoader::new(MockClient::default(), index);

        let err = list_args(&[]).load(&loader).await.unwrap_err();
        assert_eq!(err.to_string(), "Could not load catalog entries");
    }

    #[test]
    fn parses_filters() {
        let args = list_args(&["--search", "saur", "-t", "grass", "--type", "poison"]);

        assert_eq!(args.search.as_deref(), Some("saur"));
        assert_eq!(args.types, vec!["grass", "poison"]);
        assert_eq!(args.batches, 1);
    }
}
