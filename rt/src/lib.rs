// rt/src/lib.rs
//! # rt CLI Application
//!
//! This crate provides the command-line front end for `rt-core`: argument
//! parsing, logger setup, subprocess execution, and the `run`, `ls`, `show`,
//! `check`, `add`, `eject` and `cache` commands.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod runner;
pub mod stats;
pub mod ui;

use anyhow::Result;
use is_terminal::IsTerminal;
use std::io::{self, Write};

use rt_core::{BuiltinSet, FilterRepository, PipelineEngine, RepositoryPaths};

use cli::{Cli, Commands};
use commands::run::RunOptions;
use stats::LogStatsSink;
use ui::theme::ThemeStyle;

/// Resolves filter and cache locations: CLI flags (and their environment
/// variables) first, platform defaults otherwise.
pub fn repository_for(cli: &Cli) -> Result<FilterRepository> {
    let paths = match (&cli.filter_dir, &cli.cache_file) {
        (Some(user_dir), Some(cache_file)) => RepositoryPaths::new(user_dir, cache_file),
        (user_dir, cache_file) => {
            let defaults = RepositoryPaths::from_env()?;
            RepositoryPaths::new(
                user_dir.clone().unwrap_or(defaults.user_dir),
                cache_file.clone().unwrap_or(defaults.cache_file),
            )
        }
    };
    Ok(FilterRepository::new(paths, BuiltinSet::embedded()))
}

/// Executes the parsed command line and returns the process exit code.
pub fn dispatch(cli: Cli) -> Result<i32> {
    let repository = repository_for(&cli)?;
    let theme = ThemeStyle::default_theme_map();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Run { shell, command } => {
            let opts = RunOptions { command, shell };
            return commands::run::run_command(&repository, &PipelineEngine::new(), &LogStatsSink, &opts, &mut stdout);
        }
        Commands::Ls { json } => {
            let filters = repository.load()?;
            if json {
                commands::list::write_json(&filters, &mut stdout)?;
            } else {
                let enable_color = io::stdout().is_terminal();
                commands::list::write_table(&filters, &mut stdout, &theme, enable_color)?;
            }
        }
        Commands::Show { name } => commands::show::show_filter(&repository, &name, &mut stdout)?,
        Commands::Check { file } => {
            let def = commands::check::check_file(&file)?;
            log::debug!("'{}' declares {} command patterns.", def.name, def.commands.len());
            writeln!(stdout, "ok")?;
        }
        Commands::Add { source } => {
            let dest = commands::install::add_filter(&repository, &source)?;
            writeln!(stdout, "installed: {}", dest.display())?;
        }
        Commands::Eject { name } => {
            let dest = commands::install::eject_filter(&repository, &name)?;
            writeln!(stdout, "ejected: {}", dest.display())?;
            commands::info_msg(format!("edit {} to customize '{}'", dest.display(), name), &theme);
        }
        Commands::Cache(command) => commands::cache::run_cache_command(&repository, command, &mut stdout)?,
    }
    Ok(0)
}
