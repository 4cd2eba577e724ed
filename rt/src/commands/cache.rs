//! `rt cache clear|info`.

use anyhow::{Context, Result};
use std::io::Write;

use rt_core::FilterRepository;

use crate::cli::CacheCommand;

pub fn run_cache_command<W: Write>(repository: &FilterRepository, command: CacheCommand, out: &mut W) -> Result<()> {
    match command {
        CacheCommand::Clear => {
            let removed = repository.clear_cache().context("Failed to clear the filter cache")?;
            writeln!(out, "{}", if removed { "cache cleared" } else { "no cache" })?;
        }
        CacheCommand::Info => {
            let paths = repository.paths();
            writeln!(out, "filters: {}", paths.user_dir.display())?;
            match repository.cache_info() {
                Some(info) => {
                    writeln!(out, "cache:   {} ({} bytes)", info.path.display(), info.size)?;
                    match (info.built_at, info.filter_count) {
                        (Some(built_at), Some(count)) => {
                            writeln!(out, "built:   {}", built_at.to_rfc3339())?;
                            writeln!(out, "entries: {}", count)?;
                        }
                        _ => writeln!(out, "status:  unreadable (will be rebuilt on next run)")?,
                    }
                }
                None => writeln!(out, "cache:   {} (not built)", paths.cache_file.display())?,
            }
        }
    }
    Ok(())
}
