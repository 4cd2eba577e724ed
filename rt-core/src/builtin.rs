// rt-core/src/builtin.rs
//! The built-in filter layer.
//!
//! Definitions under `rt-core/filters/` are embedded into the binary. The set
//! can also be built from in-memory sources, which is how tests and embedders
//! supply their own lowest-precedence layer.

use log::{debug, warn};
use rust_embed::RustEmbed;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::config::{filter_name_from_path, FilterDefinition, FilterSource};

#[derive(RustEmbed)]
#[folder = "filters/"]
struct EmbeddedFilters;

/// One built-in definition file, addressed by its path below the filter root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinFile {
    pub path: String,
    pub contents: String,
}

#[derive(Debug, Clone, Default)]
pub struct BuiltinSet {
    files: Vec<BuiltinFile>,
}

impl BuiltinSet {
    /// The filters compiled into this binary.
    pub fn embedded() -> Self {
        let files: Vec<BuiltinFile> = EmbeddedFilters::iter()
            .filter_map(|path| {
                let file = EmbeddedFilters::get(&path)?;
                match String::from_utf8(file.data.into_owned()) {
                    Ok(contents) => Some(BuiltinFile {
                        path: path.into_owned(),
                        contents,
                    }),
                    Err(e) => {
                        warn!("Skipping built-in filter {}: not UTF-8 ({})", path, e);
                        None
                    }
                }
            })
            .collect();
        Self::from_files(files)
    }

    pub fn from_files<I>(files: I) -> Self
    where
        I: IntoIterator<Item = BuiltinFile>,
    {
        let mut files: Vec<BuiltinFile> = files
            .into_iter()
            .filter(|f| filter_name_from_path(Path::new(&f.path)).is_some())
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self { files }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[BuiltinFile] {
        &self.files
    }

    /// Raw TOML source of the built-in definition called `name`.
    pub fn source_of(&self, name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| filter_name_from_path(Path::new(&f.path)).as_deref() == Some(name))
            .map(|f| f.contents.as_str())
    }

    /// Stable digest of every path and body in the set.
    ///
    /// A snapshot records this so that a binary shipping different built-ins
    /// never serves a snapshot written by another one.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for file in &self.files {
            hasher.update(file.path.as_bytes());
            hasher.update([0u8]);
            hasher.update(file.contents.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }

    /// Parses every file, skipping (and logging) the ones that fail.
    pub fn definitions(&self) -> Vec<FilterDefinition> {
        let mut out = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let Some(name) = filter_name_from_path(Path::new(&file.path)) else {
                continue;
            };
            match FilterDefinition::from_toml(&file.contents, &name, FilterSource::Builtin, file.path.clone()) {
                Ok(def) => out.push(def),
                Err(e) => warn!("Skipping built-in filter {}: {}", file.path, e),
            }
        }
        debug!("Parsed {} built-in filters.", out.len());
        out
    }
}
