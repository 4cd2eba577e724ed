// rt/src/cli.rs
//! This file defines the command-line interface (CLI) for the rt application,
//! including all available commands and their arguments.

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

const RUN_COMMAND: &str = "run";
const SHELL_FLAG: &str = "--shell";

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "rt",
    version = env!("CARGO_PKG_VERSION"),
    about = "Reduce tokens in command output",
    long_about = "rt runs a shell command, picks the declarative filter that best matches it, and prints a condensed version of the command's output. Filters are TOML files: a set ships with the binary and user filters in the filter directory override them by name.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Suppress all log output.
    #[arg(long, short = 'q', global = true, help = "Suppress all log output.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG).
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// Directory holding user filter definitions.
    #[arg(long = "filter-dir", value_name = "DIR", env = "RT_FILTER_DIR", global = true)]
    pub filter_dir: Option<PathBuf>,

    /// Location of the filter snapshot.
    #[arg(long = "cache-file", value_name = "FILE", env = "RT_CACHE_FILE", global = true)]
    pub cache_file: Option<PathBuf>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `rt` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command and filter its output.
    #[command(trailing_var_arg = true)]
    Run {
        /// Run the joined command line through `sh -c` (pipes, redirections, `&&`).
        /// `rt run -- <cmd...>` implies this.
        #[arg(long, short = 's')]
        shell: bool,

        /// The command to run.
        #[arg(required = true, allow_hyphen_values = true, num_args = 1.., value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// List available filters.
    #[command(visible_alias = "list")]
    Ls {
        /// Print the filter list as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the TOML source of a filter.
    Show {
        /// Filter name, e.g. `git/status`.
        name: String,
    },

    /// Validate a filter TOML file.
    Check {
        /// Path to the filter file.
        file: PathBuf,
    },

    /// Install a filter from a file or URL into the user filter directory.
    Add {
        /// Local path or http(s) URL of a filter TOML file.
        source: String,
    },

    /// Copy a built-in filter into the user directory for customization.
    Eject {
        /// Built-in filter name, e.g. `git/status`.
        name: String,
    },

    /// Manage the filter snapshot cache.
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCommand {
    /// Delete the filter snapshot.
    Clear,
    /// Show where the snapshot lives and what it contains.
    Info,
}

/// Rewrites `rt run -- <cmd...>` into `rt run --shell -- <cmd...>`.
///
/// clap swallows the `--` separator, so the shell-mode marker is turned into
/// an explicit flag before parsing.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if let Some(run) = args.iter().skip(1).position(|a| a == RUN_COMMAND) {
        let run = run + 1;
        if args.get(run + 1).is_some_and(|a| a == "--") {
            args.insert(run + 1, OsString::from(SHELL_FLAG));
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_keeps_hyphenated_arguments() {
        let cli = Cli::try_parse_from(normalize_args(["rt", "run", "git", "log", "--oneline", "-n", "5"])).unwrap();
        match cli.command {
            Commands::Run { shell, command } => {
                assert!(!shell);
                assert_eq!(command, vec!["git", "log", "--oneline", "-n", "5"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_leading_double_dash_selects_shell_mode() {
        let cli = Cli::try_parse_from(normalize_args(["rt", "-q", "run", "--", "ls", "|", "wc", "-l"])).unwrap();
        match cli.command {
            Commands::Run { shell, command } => {
                assert!(shell);
                assert_eq!(command, vec!["ls", "|", "wc", "-l"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_normalize_leaves_other_commands_alone() {
        let args = normalize_args(["rt", "show", "run"]);
        assert_eq!(args, vec![OsString::from("rt"), "show".into(), "run".into()]);
    }
}
