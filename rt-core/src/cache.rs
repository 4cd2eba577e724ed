//! cache.rs - The persisted snapshot of the merged filter set.
//!
//! The artifact is a little-endian `u32` format version followed by a bincode
//! encoded [`CachedFilterSet`]. Reading it never fails loudly: every problem is
//! reported as a [`CacheError`] that the repository turns into a cache miss.
//!
//! License: MIT OR APACHE 2.0

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::FilterDefinition;
use crate::errors::CacheError;

/// Bumped whenever `FilterDefinition` or `CachedFilterSet` change shape.
pub const SNAPSHOT_VERSION: u32 = 1;

const TMP_SUFFIX: &str = "tmp";

/// Immutable snapshot of a merged, name-ordered filter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedFilterSet {
    pub built_at: DateTime<Utc>,
    /// Digest of the built-in layer the snapshot was merged from.
    pub builtin_fingerprint: String,
    pub filters: Vec<FilterDefinition>,
}

impl CachedFilterSet {
    /// `built_at` must be taken before the sources were read, so an edit
    /// racing the rebuild still counts as newer than the snapshot.
    pub fn new(
        filters: Vec<FilterDefinition>,
        builtin_fingerprint: impl Into<String>,
        built_at: DateTime<Utc>,
    ) -> Self {
        Self {
            built_at,
            builtin_fingerprint: builtin_fingerprint.into(),
            filters,
        }
    }

    /// True when a tracked source modified at `newest_source` postdates the snapshot.
    pub fn is_stale(&self, newest_source: Option<DateTime<Utc>>) -> bool {
        newest_source.is_some_and(|modified| modified > self.built_at)
    }

    pub fn encode(&self) -> Result<Vec<u8>, CacheError> {
        let config = bincode::config::standard();
        let mut bytes = SNAPSHOT_VERSION.to_le_bytes().to_vec();
        bytes.extend(bincode::serde::encode_to_vec(self, config)?);
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CacheError> {
        let (header, body) = bytes.split_at_checked(4).ok_or(CacheError::Version {
            found: 0,
            expected: SNAPSHOT_VERSION,
        })?;
        let mut version = [0u8; 4];
        version.copy_from_slice(header);
        let found = u32::from_le_bytes(version);
        if found != SNAPSHOT_VERSION {
            return Err(CacheError::Version {
                found,
                expected: SNAPSHOT_VERSION,
            });
        }

        let (snapshot, _) = bincode::serde::decode_from_slice(body, bincode::config::standard())?;
        Ok(snapshot)
    }

    pub fn read(path: &Path) -> Result<Self, CacheError> {
        let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
        let snapshot = Self::decode(&bytes)?;
        debug!(
            "Read filter snapshot with {} filters built at {} from {}",
            snapshot.filters.len(),
            snapshot.built_at,
            path.display()
        );
        Ok(snapshot)
    }

    /// Writes the snapshot next to `path` and renames it into place, so a
    /// concurrent reader sees either the old or the new artifact.
    pub fn write(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let bytes = self.encode()?;
        let tmp_path = tmp_path_for(path);
        fs::write(&tmp_path, &bytes).map_err(|e| io_error(&tmp_path, e))?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_error(path, e));
        }

        debug!("Wrote filter snapshot ({} bytes) to {}", bytes.len(), path.display());
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.{}", std::process::id(), TMP_SUFFIX));
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}
