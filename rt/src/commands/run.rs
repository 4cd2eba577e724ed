//! `rt run`: execute a command and print its filtered output.

use anyhow::{Context, Result};
use log::{debug, info};
use std::io::Write;

use rt_core::{match_filter, FilterDefinition, FilterEngine, FilterRepository, RunRecord, StatsSink};

use crate::runner::{self, Invocation, RunOutput};

/// Options for a single `rt run` invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The command words as given on the command line.
    pub command: Vec<String>,
    /// Run the joined line through the shell instead of executing argv.
    pub shell: bool,
}

impl RunOptions {
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// Runs the command, writes the result to `out` and returns the exit code the
/// process should terminate with.
pub fn run_command<W: Write>(
    repository: &FilterRepository,
    engine: &dyn FilterEngine,
    sink: &dyn StatsSink,
    opts: &RunOptions,
    out: &mut W,
) -> Result<i32> {
    let command_line = opts.command_line();
    let filters = repository.load().context("Failed to load filters")?;
    let filter = match_filter(&filters, &command_line);

    let result = execute(filter, opts, &command_line);
    debug!(
        "Command exited with {} after producing {} bytes.",
        result.exit_code,
        result.output.len()
    );

    if result.exit_code != 0 {
        writeln!(out, "Error: Exit code {}", result.exit_code)?;
    }

    let record = match filter {
        Some(filter) => {
            info!("Applying filter '{}' ({}).", filter.name, filter.source);
            let filtered = engine.apply(filter, &result.output, result.exit_code);
            out.write_all(filtered.as_bytes())?;
            if !filtered.is_empty() && !filtered.ends_with('\n') {
                writeln!(out)?;
            }
            RunRecord::new(Some(&filter.name), &command_line, &result.output, &filtered, result.exit_code)
        }
        None => {
            out.write_all(result.output.as_bytes())?;
            RunRecord::new(None, &command_line, &result.output, &result.output, result.exit_code)
        }
    };
    out.flush()?;

    sink.record(&record);
    Ok(result.exit_code)
}

/// Picks how the command is executed: a filter's `run` override and shell
/// or passthrough mode go through the shell, everything else runs as argv.
fn execute(filter: Option<&FilterDefinition>, opts: &RunOptions, command_line: &str) -> RunOutput {
    match filter {
        Some(FilterDefinition { run: Some(run), .. }) => runner::run(Invocation::Shell(run)),
        Some(_) if !opts.shell => runner::run(Invocation::Argv(&opts.command)),
        _ => runner::run(Invocation::Shell(command_line)),
    }
}
