use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use pokedex_catalog::DEFAULT_CATALOG_URL;
use pokedex_sdk::loader::BATCH_SIZE;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xdg::BaseDirectories;

/// Name of pokedex managed directories
const POKEDEX_DIR_NAME: &str = "pokedex";
const POKEDEX_CONFIG_DIR_VAR: &str = "POKEDEX_CONFIG_DIR";
const POKEDEX_ENV_PREFIX: &str = "POKEDEX_";
pub const POKEDEX_CONFIG_FILE: &str = "pokedex.toml";

/// Number of entries in the generated index, every species up to generation 9.
pub const DEFAULT_INDEX_SIZE: u32 = 1025;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// The URL of the catalog API, e.g. `https://pokeapi.co/api/v2`
    // Using a URL here adds an extra trailing slash,
    // so just use a String.
    pub catalog_url: String,

    /// JSON file with the static index.
    /// If unset, the index is generated for ids `1..=index_size`.
    pub index_file: Option<PathBuf>,

    /// Number of entries in the generated or fetched index
    pub index_size: u32,

    /// Fetch the index from the catalog listing instead of generating it.
    /// Ignored if `index_file` is set.
    pub fetch_index: bool,

    /// Number of entries loaded concurrently per batch
    pub batch_size: usize,

    /// User agent sent with catalog requests
    pub user_agent: Option<String>,

    /// Additional headers sent with catalog requests
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,

    /// Directory the configuration file is read from (default:
    /// `$XDG_CONFIG_HOME/pokedex`)
    pub config_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            index_file: None,
            index_size: DEFAULT_INDEX_SIZE,
            fetch_index: false,
            batch_size: BATCH_SIZE,
            user_agent: None,
            extra_headers: BTreeMap::new(),
            config_dir: PathBuf::new(),
        }
    }
}

impl Config {
    fn read_raw_config() -> Result<HierarchicalConfig> {
        let pokedex_dirs = BaseDirectories::with_prefix(POKEDEX_DIR_NAME);

        let config_dir = match env::var(POKEDEX_CONFIG_DIR_VAR) {
            Ok(v) => {
                debug!("`${POKEDEX_CONFIG_DIR_VAR}` set: {v}");
                PathBuf::from(v)
            },
            Err(_) => {
                let config_dir = pokedex_dirs
                    .get_config_home()
                    .context("Could not determine config directory, is $HOME set?")?;
                debug!("`${POKEDEX_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
                config_dir
            },
        };

        let mut builder = HierarchicalConfig::builder()
            .set_default("catalog_url", DEFAULT_CATALOG_URL)?
            .set_default("index_size", u64::from(DEFAULT_INDEX_SIZE))?
            .set_default("fetch_index", false)?
            .set_default("batch_size", BATCH_SIZE as u64)?
            // Config dir is added to the config for completeness;
            // the config file cannot change the config dir.
            .set_override("config_dir", config_dir.to_string_lossy().into_owned())?;

        // read from /etc
        builder = builder.add_source(
            config::File::from(PathBuf::from("/etc").join(POKEDEX_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );

        // look for files in XDG_CONFIG_DIRS locations
        for file in pokedex_dirs.find_config_files(POKEDEX_CONFIG_FILE) {
            builder = builder.add_source(config::File::from(file).format(config::FileFormat::Toml));
        }

        // Add explicit POKEDEX_CONFIG_DIR file last
        builder = builder.add_source(
            config::File::from(config_dir.join(POKEDEX_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );

        // override via env variables
        let pokedex_envs = env::vars()
            .filter_map(|(k, v)| {
                k.strip_prefix(POKEDEX_ENV_PREFIX)
                    .map(|k| (k.to_owned(), v))
            })
            .collect::<HashMap<_, _>>();

        let builder = builder.add_source(
            Environment::default()
                .source(Some(pokedex_envs))
                .try_parsing(true),
        );

        Ok(builder.build()?)
    }

    /// Creates a [Config] from the environment and config files
    pub fn parse() -> Result<Config> {
        let final_config = Self::read_raw_config()?;
        let config: Config = final_config
            .try_deserialize()
            .context("Could not parse config")?;

        debug!(?config, "parsed config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;

    /// Run `f` with a config environment rooted in a fresh temporary directory.
    fn with_isolated_env<R>(
        vars: &[(&str, Option<&str>)],
        f: impl FnOnce(&std::path::Path) -> R,
    ) -> R {
        let tempdir = tempfile::tempdir().unwrap();
        let home = tempdir.path().to_string_lossy().into_owned();
        let xdg_dirs = tempdir.path().join("xdg").to_string_lossy().into_owned();

        let mut all_vars = vec![
            ("HOME", Some(home.as_str())),
            ("XDG_CONFIG_HOME", None),
            ("XDG_CONFIG_DIRS", Some(xdg_dirs.as_str())),
            (POKEDEX_CONFIG_DIR_VAR, None),
            ("POKEDEX_CATALOG_URL", None),
            ("POKEDEX_BATCH_SIZE", None),
            ("POKEDEX_INDEX_SIZE", None),
            ("POKEDEX_INDEX_FILE", None),
            ("POKEDEX_FETCH_INDEX", None),
            ("POKEDEX_USER_AGENT", None),
        ];
        all_vars.retain(|(key, _)| !vars.iter().any(|(var, _)| var == key));
        all_vars.extend_from_slice(vars);

        temp_env::with_vars(all_vars, || f(tempdir.path()))
    }

    #[test]
    #[serial]
    fn defaults() {
        let config = with_isolated_env(&[], |home| {
            let config = Config::parse().unwrap();
            assert_eq!(config.config_dir, home.join(".config").join(POKEDEX_DIR_NAME));
            config
        });

        assert_eq!(config.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(config.index_size, 1025);
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.index_file, None);
        assert!(!config.fetch_index);
        assert!(config.extra_headers.is_empty());
    }

    #[test]
    #[serial]
    fn set_by_env() {
        let config = with_isolated_env(
            &[
                ("POKEDEX_CATALOG_URL", Some("http://localhost:8000/api/v2")),
                ("POKEDEX_BATCH_SIZE", Some("5")),
                ("POKEDEX_FETCH_INDEX", Some("true")),
            ],
            |_| Config::parse().unwrap(),
        );
        assert!(config.fetch_index);

        assert_eq!(config.catalog_url, "http://localhost:8000/api/v2");
        assert_eq!(config.batch_size, 5);
    }

    #[test]
    #[serial]
    fn read_from_config_dir() {
        let tempdir = tempfile::tempdir().unwrap();
        let config_dir = tempdir.path().join("custom");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join(POKEDEX_CONFIG_FILE),
            indoc! {r#"
                catalog_url = "https://catalog.example.com/api/v2"
                index_size = 151

                [extra_headers]
                x-trace = "1"
            "#},
        )
        .unwrap();

        let config_dir_str = config_dir.to_string_lossy().into_owned();
        let config = with_isolated_env(&[(POKEDEX_CONFIG_DIR_VAR, Some(&config_dir_str))], |_| {
            Config::parse().unwrap()
        });

        assert_eq!(config.catalog_url, "https://catalog.example.com/api/v2");
        assert_eq!(config.index_size, 151);
        assert_eq!(config.config_dir, config_dir);
        assert_eq!(
            config.extra_headers,
            BTreeMap::from([("x-trace".to_string(), "1".to_string())])
        );
    }

    #[test]
    #[serial]
    fn env_overrides_config_file() {
        let tempdir = tempfile::tempdir().unwrap();
        fs::write(tempdir.path().join(POKEDEX_CONFIG_FILE), "batch_size = 10\n").unwrap();

        let config_dir_str = tempdir.path().to_string_lossy().into_owned();
        let config = with_isolated_env(
            &[
                (POKEDEX_CONFIG_DIR_VAR, Some(&config_dir_str)),
                ("POKEDEX_BATCH_SIZE", Some("30")),
            ],
            |_| Config::parse().unwrap(),
        );

        assert_eq!(config.batch_size, 30);
    }

    #[test]
    #[serial]
    fn invalid_value_is_an_error() {
        let result = with_isolated_env(&[("POKEDEX_BATCH_SIZE", Some("many"))], |_| {
            Config::parse()
        });
        assert!(result.is_err());
    }
}
