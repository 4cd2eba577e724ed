// rt/src/logger.rs
//! Logger setup for the `rt` binary.
//!
//! Logs always go to stderr so they never mix with filtered output on stdout.
//! `RUST_LOG` is honoured unless an explicit level is passed in, in which case
//! the explicit level wins.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Level used when neither a flag nor `RUST_LOG` says otherwise.
const DEFAULT_FILTER: &str = "warn";

/// Installs the global logger. Calling it twice is harmless.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    builder.target(Target::Stderr).format_timestamp(None);

    if let Some(level) = level {
        builder.filter_level(level);
    }

    // A second init (e.g. from tests) must not panic.
    let _ = builder.try_init();
}

/// Maps the CLI verbosity flags to an override level.
///
/// `quiet` beats `debug`; with neither flag `RUST_LOG` decides.
pub fn level_from_flags(debug: bool, quiet: bool) -> Option<LevelFilter> {
    match (debug, quiet) {
        (_, true) => Some(LevelFilter::Off),
        (true, false) => Some(LevelFilter::Debug),
        (false, false) => None,
    }
}
