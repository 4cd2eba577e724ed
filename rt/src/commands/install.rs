//! `rt add` and `rt eject`: put filter definitions into the user directory.
//!
//! Both commands clear the snapshot afterwards so the next run sees the new
//! file even if its modification time is older than the snapshot.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use rt_core::config::FILTER_EXTENSION;
use rt_core::FilterRepository;

use crate::commands::check::check_source;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("built-in filter not found: {0}")]
    BuiltinNotFound(String),

    #[error("cannot derive a filter file name from '{0}'")]
    NoFileName(String),

    #[error("download failed: {url}: HTTP {status}")]
    Http { url: String, status: u16 },
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Final path segment of a file path or URL, ignoring query and fragment.
fn file_name_of(source: &str) -> Option<&str> {
    let trimmed = source.split(['?', '#']).next().unwrap_or(source);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
}

fn download(url: &str) -> Result<String> {
    debug!("Downloading filter from {}", url);
    let response = reqwest::blocking::get(url).with_context(|| format!("download failed: {}", url))?;
    let status = response.status();
    if !status.is_success() {
        return Err(InstallError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into());
    }
    response.text().with_context(|| format!("read failed: {}", url))
}

fn write_user_file(dest: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(dest, contents).with_context(|| format!("Failed to write {}", dest.display()))
}

fn invalidate(repository: &FilterRepository) {
    if let Err(e) = repository.clear_cache() {
        warn!("Could not clear filter snapshot: {}", e);
    }
}

/// Validates a filter from a local file or an http(s) URL and installs it at
/// the top of the user filter directory. Returns the installed path.
pub fn add_filter(repository: &FilterRepository, source: &str) -> Result<PathBuf> {
    let text = if is_url(source) {
        download(source)?
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))?
    };

    check_source(&text, source)?;

    let file_name = file_name_of(source).ok_or_else(|| InstallError::NoFileName(source.to_string()))?;
    let mut dest = repository.paths().user_dir.join(file_name);
    if dest.extension().and_then(|e| e.to_str()) != Some(FILTER_EXTENSION) {
        dest.set_extension(FILTER_EXTENSION);
    }

    write_user_file(&dest, &text)?;
    invalidate(repository);
    info!("Installed filter from {} to {}", source, dest.display());
    Ok(dest)
}

/// Copies the built-in definition `name` into the user directory, keeping
/// its relative path, and returns the new file's path.
pub fn eject_filter(repository: &FilterRepository, name: &str) -> Result<PathBuf> {
    let text = repository
        .builtins()
        .source_of(name)
        .ok_or_else(|| InstallError::BuiltinNotFound(name.to_string()))?;

    let dest = repository.user_path_for(name);
    write_user_file(&dest, text)?;
    invalidate(repository);
    info!("Ejected built-in filter '{}' to {}", name, dest.display());
    Ok(dest)
}
