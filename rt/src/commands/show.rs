//! `rt show`: print the TOML source of a filter.

use anyhow::{bail, Result};
use log::debug;
use std::io::Write;

use rt_core::FilterRepository;

/// Writes the source of `name`, preferring a user definition over the
/// built-in one.
pub fn show_filter<W: Write>(repository: &FilterRepository, name: &str, out: &mut W) -> Result<()> {
    let Some((source, text)) = repository.definition_source(name) else {
        bail!("filter not found: {}", name);
    };
    debug!("Showing {} filter '{}'.", source, name);
    out.write_all(text.as_bytes())?;
    Ok(())
}
