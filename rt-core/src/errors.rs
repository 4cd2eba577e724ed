//! errors.rs - Custom error types for the rt-core library.
//!
//! The taxonomy follows how far each failure is allowed to travel:
//! `ConfigError` stops a definition at validation/install time, `PatternError`
//! only ever disables the rule that owns it, `CacheError` is logged and
//! discarded, and `RtError` is what a repository load surfaces to the caller.
//!
//! License: MIT OR APACHE 2.0

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the library to its callers.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RtError {
    #[error("Failed to read filter source {path}: {source}")]
    SourceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid filter definition: {0}")]
    Config(#[from] ConfigError),
}

/// A filter definition that cannot enter the repository.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Failed to parse filter '{name}': {message}")]
    Parse { name: String, message: String },

    #[error("Filter '{name}' failed validation:\n{}", problems.join("\n"))]
    Invalid { name: String, problems: Vec<String> },
}

/// A regular expression that could not be compiled.
///
/// Never fatal: the owning rule simply becomes inert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PatternError {
    #[error("Failed to compile pattern '{pattern}': {message}")]
    Compile { pattern: String, message: String },

    #[error("Pattern length ({0}) exceeds maximum allowed ({1})")]
    TooLong(usize, usize),
}

/// Failures while reading or writing the persisted filter snapshot.
///
/// Reads turn into a cache miss and writes are best-effort, so these are only
/// ever logged.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CacheError {
    #[error("Cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode filter snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Failed to decode filter snapshot: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Unsupported snapshot format version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}
