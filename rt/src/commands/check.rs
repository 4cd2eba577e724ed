//! `rt check`: parse and validate a filter file without installing it.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use rt_core::{filter_name_from_path, validate_definition, FilterDefinition, FilterSource};

/// Parses and validates a definition held in memory.
///
/// `origin` names the file or URL in messages; the filter name is derived from
/// its final path segment.
pub fn check_source(text: &str, origin: &str) -> Result<FilterDefinition> {
    let name = origin
        .rsplit(['/', '\\'])
        .next()
        .and_then(|file| filter_name_from_path(Path::new(file)))
        .unwrap_or_else(|| "check".to_string());

    let def = FilterDefinition::from_toml(text, &name, FilterSource::User, origin)
        .with_context(|| format!("invalid filter: {}", origin))?;
    validate_definition(&def).with_context(|| format!("invalid filter: {}", origin))?;
    Ok(def)
}

/// Reads, parses and validates the file at `path`.
pub fn check_file(path: &Path) -> Result<FilterDefinition> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    check_source(&text, &path.display().to_string())
}
