mod list;
mod show;
mod types;

use std::fmt;

use anyhow::Result;
use bpaf::Bpaf;
use indoc::indoc;
use tracing::debug;

use crate::config::Config;

const POKEDEX_DESCRIPTION: &'_ str = indoc! {"
    Browse the Pokédex catalog from the command line.

    Entries are loaded from the catalog in batches, enriched with their species
    data and evolution chain."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(POKEDEX_DESCRIPTION))]
pub struct PokedexCli(#[bpaf(external(pokedex_args))] pub PokedexArgs);

/// Main pokedex args parser
///
/// To parse the pokedex CLI, use [`PokedexCli`] instead using [`pokedex_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct PokedexArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

impl PokedexArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        debug!(command = ?self.command, "running command");
        match self.command {
            Commands::List(args) => args.handle(config).await,
            Commands::Show(args) => args.handle(config).await,
            Commands::Types(args) => args.handle(),
        }
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// List catalog entries
    #[bpaf(command)]
    List(#[bpaf(external(list::list))] list::List),

    /// Show everything known about one entry
    #[bpaf(command)]
    Show(#[bpaf(external(show::show))] show::Show),

    /// Show how a type combination fares against every attacking type
    #[bpaf(command)]
    Types(#[bpaf(external(types::types))] types::Types),
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Commands::List(_) => write!(f, "list"),
            Commands::Show(_) => write!(f, "show"),
            Commands::Types(_) => write!(f, "types"),
        }
    }
}
