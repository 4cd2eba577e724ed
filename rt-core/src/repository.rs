//! Filter repository: layered loading, merging and the snapshot cache.
//!
//! Two layers feed the repository, built-in first and user second. They are
//! merged into a name-keyed map in that order, so a user definition replaces a
//! built-in one with the same name outright; fields are never mixed. The
//! result is always ordered by name, which is also the tie-break order used by
//! the matcher.
//!
//! A merged set is persisted as a [`CachedFilterSet`]. The snapshot is only
//! served while nothing under the user filter directory (files or
//! directories) was modified after it was built and while the built-in layer
//! is the one it was merged from.
//!
//! License: MIT OR APACHE 2.0

use anyhow::Context;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::builtin::BuiltinSet;
use crate::cache::CachedFilterSet;
use crate::config::{filter_name_from_path, FilterDefinition, FilterSource, FILTER_EXTENSION};
use crate::errors::{CacheError, RtError};

/// Overrides the user filter directory.
pub const FILTER_DIR_ENV: &str = "RT_FILTER_DIR";
/// Overrides the snapshot location.
pub const CACHE_FILE_ENV: &str = "RT_CACHE_FILE";

const APP_DIR: &str = "rt";
const CACHE_FILE_NAME: &str = "filters.bin";

/// Where the repository reads user filters from and writes its snapshot to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryPaths {
    pub user_dir: PathBuf,
    pub cache_file: PathBuf,
}

impl RepositoryPaths {
    pub fn new(user_dir: impl Into<PathBuf>, cache_file: impl Into<PathBuf>) -> Self {
        Self {
            user_dir: user_dir.into(),
            cache_file: cache_file.into(),
        }
    }

    /// Platform locations, honouring `RT_FILTER_DIR` and `RT_CACHE_FILE`.
    pub fn from_env() -> anyhow::Result<Self> {
        let user_dir = match std::env::var_os(FILTER_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
                .context("Could not determine a configuration directory")?
                .join(APP_DIR)
                .join("filters"),
        };

        let cache_file = match std::env::var_os(CACHE_FILE_ENV) {
            Some(file) => PathBuf::from(file),
            None => dirs::cache_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
                .context("Could not determine a cache directory")?
                .join(APP_DIR)
                .join(CACHE_FILE_NAME),
        };

        Ok(Self::new(user_dir, cache_file))
    }
}

/// Why a load could not be served from the snapshot.
#[derive(Debug)]
pub enum CacheMiss {
    /// No snapshot has been written yet.
    Missing,
    /// A file or directory under the user filter root is newer than the snapshot.
    Stale { newest: DateTime<Utc> },
    /// The snapshot was merged from a different built-in layer.
    BuiltinsChanged,
    /// The snapshot exists but could not be read or decoded.
    Corrupt(CacheError),
}

/// Where the filters returned by a load came from.
#[derive(Debug)]
pub enum LoadOrigin {
    Snapshot,
    Sources(CacheMiss),
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub filters: Vec<FilterDefinition>,
    pub origin: LoadOrigin,
}

/// Metadata about the persisted snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheInfo {
    pub path: PathBuf,
    pub size: u64,
    pub built_at: Option<DateTime<Utc>>,
    pub filter_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct FilterRepository {
    paths: RepositoryPaths,
    builtins: BuiltinSet,
}

impl FilterRepository {
    pub fn new(paths: RepositoryPaths, builtins: BuiltinSet) -> Self {
        Self { paths, builtins }
    }

    pub fn paths(&self) -> &RepositoryPaths {
        &self.paths
    }

    pub fn builtins(&self) -> &BuiltinSet {
        &self.builtins
    }

    /// The merged filter set, ordered by name.
    pub fn load(&self) -> Result<Vec<FilterDefinition>, RtError> {
        self.load_with_outcome().map(|outcome| outcome.filters)
    }

    /// Like [`load`](Self::load), also reporting whether the snapshot was used.
    pub fn load_with_outcome(&self) -> Result<LoadOutcome, RtError> {
        let miss = match self.read_snapshot() {
            Ok(filters) => {
                debug!("Serving {} filters from snapshot.", filters.len());
                return Ok(LoadOutcome {
                    filters,
                    origin: LoadOrigin::Snapshot,
                });
            }
            Err(miss) => miss,
        };

        debug!("Filter snapshot miss: {:?}", miss);
        self.rebuild(Utc::now(), miss)
    }

    fn rebuild(&self, started: DateTime<Utc>, miss: CacheMiss) -> Result<LoadOutcome, RtError> {
        let filters = self.load_from_sources()?;

        let snapshot = CachedFilterSet::new(filters, self.builtins.fingerprint(), started);
        if let Err(e) = snapshot.write(&self.paths.cache_file) {
            warn!("Could not persist filter snapshot: {}", e);
        }

        Ok(LoadOutcome {
            filters: snapshot.filters,
            origin: LoadOrigin::Sources(miss),
        })
    }

    /// Rebuilds the merged set from both layers, bypassing the snapshot.
    pub fn load_from_sources(&self) -> Result<Vec<FilterDefinition>, RtError> {
        let builtin = self.builtins.definitions();
        let user = self.load_user_filters()?;
        info!(
            "Loaded {} built-in and {} user filters.",
            builtin.len(),
            user.len()
        );
        Ok(merge_filters(builtin, user))
    }

    /// Parses every definition under the user directory.
    ///
    /// A missing directory, or a path that is not a directory, means no user
    /// filters. Files that fail to parse
    /// are skipped with a warning; I/O failures abort the load.
    pub fn load_user_filters(&self) -> Result<Vec<FilterDefinition>, RtError> {
        let root = &self.paths.user_dir;
        if root.exists() && !root.is_dir() {
            warn!("User filter path {} is not a directory; ignoring it.", root.display());
            return Ok(Vec::new());
        }
        let files = match filter_files(root) {
            Ok(files) => files,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("User filter directory {} does not exist.", root.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(RtError::SourceIo {
                    path: root.clone(),
                    source: e,
                })
            }
        };

        let mut out = Vec::with_capacity(files.len());
        for path in files {
            let Some(name) = path
                .strip_prefix(root)
                .ok()
                .and_then(filter_name_from_path)
            else {
                continue;
            };
            match FilterDefinition::load_from_file(&path, &name, FilterSource::User) {
                Ok(def) => out.push(def),
                Err(RtError::Config(e)) => warn!("Skipping user filter {}: {}", path.display(), e),
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// The snapshot's filters, or why it cannot be served.
    fn read_snapshot(&self) -> Result<Vec<FilterDefinition>, CacheMiss> {
        let snapshot = match CachedFilterSet::read(&self.paths.cache_file) {
            Ok(snapshot) => snapshot,
            Err(CacheError::Io { ref source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Err(CacheMiss::Missing)
            }
            Err(e) => return Err(CacheMiss::Corrupt(e)),
        };

        if snapshot.builtin_fingerprint != self.builtins.fingerprint() {
            return Err(CacheMiss::BuiltinsChanged);
        }

        let newest = newest_modification(&self.paths.user_dir);
        if let Some(newest) = newest.filter(|_| snapshot.is_stale(newest)) {
            return Err(CacheMiss::Stale { newest });
        }

        Ok(snapshot.filters)
    }

    /// Deletes the snapshot. `Ok(false)` if there was none.
    pub fn clear_cache(&self) -> Result<bool, CacheError> {
        match fs::remove_file(&self.paths.cache_file) {
            Ok(()) => {
                info!("Removed filter snapshot {}", self.paths.cache_file.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io {
                path: self.paths.cache_file.clone(),
                source: e,
            }),
        }
    }

    /// Describes the snapshot on disk, or `None` when there is none.
    pub fn cache_info(&self) -> Option<CacheInfo> {
        let path = &self.paths.cache_file;
        let meta = fs::metadata(path).ok()?;
        let snapshot = CachedFilterSet::read(path).ok();
        Some(CacheInfo {
            path: path.clone(),
            size: meta.len(),
            built_at: snapshot.as_ref().map(|s| s.built_at),
            filter_count: snapshot.as_ref().map(|s| s.filters.len()),
        })
    }

    /// The file a user definition called `name` lives in.
    pub fn user_path_for(&self, name: &str) -> PathBuf {
        let mut path = self.paths.user_dir.clone();
        let (dirs, file) = name.rsplit_once('/').unwrap_or(("", name));
        path.extend(dirs.split('/').filter(|d| !d.is_empty()));
        path.push(format!("{file}.{FILTER_EXTENSION}"));
        path
    }

    /// Raw TOML of `name`, preferring the user layer over the built-in one.
    pub fn definition_source(&self, name: &str) -> Option<(FilterSource, String)> {
        if let Ok(text) = fs::read_to_string(self.user_path_for(name)) {
            return Some((FilterSource::User, text));
        }
        self.builtins
            .source_of(name)
            .map(|text| (FilterSource::Builtin, text.to_string()))
    }
}

/// Merges the two layers: later layer wins per name, output ordered by name.
pub fn merge_filters(
    builtin: Vec<FilterDefinition>,
    user: Vec<FilterDefinition>,
) -> Vec<FilterDefinition> {
    let mut by_name: BTreeMap<String, FilterDefinition> = BTreeMap::new();
    for def in builtin.into_iter().chain(user) {
        if let Some(shadowed) = by_name.insert(def.name.clone(), def) {
            debug!("Filter '{}' from {} was shadowed.", shadowed.name, shadowed.source);
        }
    }
    by_name.into_values().collect()
}

/// Every `.toml` file below `root`, in a stable order.
pub fn filter_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some(FILTER_EXTENSION) {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

/// Latest modification time of any filter file or directory below `root`.
///
/// Directories are included so that deleting or renaming a definition also
/// invalidates the snapshot. Entries that cannot be inspected are ignored.
pub fn newest_modification(root: &Path) -> Option<DateTime<Utc>> {
    let mut newest: Option<DateTime<Utc>> = None;
    let mut note = |path: &Path| {
        if let Ok(modified) = fs::metadata(path).and_then(|m| m.modified()) {
            let modified = DateTime::<Utc>::from(modified);
            if newest.map_or(true, |n| modified > n) {
                newest = Some(modified);
            }
        }
    };

    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        note(&dir);
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            match entry.file_type() {
                Ok(t) if t.is_dir() => pending.push(path),
                Ok(_) if path.extension().and_then(|e| e.to_str()) == Some(FILTER_EXTENSION) => note(&path),
                _ => {}
            }
        }
    }
    newest
}
