use std::sync::OnceLock;

use tracing::error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let log_filter = log_filter(verbosity.unwrap_or_default());

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (subscriber, reload_handle) = create_registry_and_filter_reload_handle();
        subscriber.init();
        reload_handle
    });

    update_filters(filter_handle, log_filter);
}

fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,pokedex=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,pokedex=warn",
        // Show our own info logs, and entries the loader had to skip
        Verbosity::Verbose(1) => "off,pokedex=info,pokedex_sdk=warn",
        // Also show debug from our libraries
        Verbosity::Verbose(2) => "off,pokedex=debug,pokedex_sdk=debug,pokedex_catalog=debug",
        // Also show trace from our libraries
        Verbosity::Verbose(3) => "off,pokedex=trace,pokedex_sdk=trace,pokedex_catalog=trace",
        // Also show debug from everything else, e.g. the HTTP stack
        Verbosity::Verbose(4) => "debug,pokedex=trace,pokedex_sdk=trace,pokedex_catalog=trace",
        Verbosity::Verbose(_) => "trace",
    }
}

/// Replace the active filter, `RUST_LOG` takes precedence over `log_filter`.
pub fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

pub fn create_registry_and_filter_reload_handle() -> (
    impl tracing::Subscriber + Send + Sync + 'static,
    Handle<EnvFilter, Registry>,
) {
    // Start permissive, the actual level is set through the handle right after.
    let filter = EnvFilter::new("trace");
    let (filter, filter_reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(tracing_subscriber::fmt::format())
        .with_filter(filter);

    let registry = tracing_subscriber::registry().with(log_layer);

    (registry, filter_reload_handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_verbosity_is_a_valid_filter() {
        let verbosities = [Verbosity::Quiet]
            .into_iter()
            .chain((0..=5).map(Verbosity::Verbose));

        for verbosity in verbosities {
            let filter = log_filter(verbosity);
            assert!(EnvFilter::try_new(filter).is_ok(), "{filter}");
        }
    }

    #[test]
    fn default_shows_warnings() {
        assert_eq!(log_filter(Verbosity::default()), "off,pokedex=warn");
    }
}
