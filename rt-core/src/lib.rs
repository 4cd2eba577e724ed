// rt-core/src/lib.rs
//! # rt Core Library
//!
//! `rt-core` provides the platform-independent logic behind `rt`: it decides
//! which declarative filter applies to a shell command and rewrites that
//! command's captured output into a compact form before it is shown to an
//! agent. It owns the filter schema, the two-layer filter repository and its
//! snapshot cache, the command matcher, and a pluggable `FilterEngine` trait.
//!
//! The library never spawns processes and never prints; running commands and
//! presenting results is the job of the `rt` binary.
//!
//! ## Modules
//!
//! * `config`: The TOML filter schema, the normalized `FilterDefinition`, and validation.
//! * `builtin`: The filter definitions embedded in the binary at compile time.
//! * `repository`: Loads and merges the built-in and user layers, backed by the snapshot cache.
//! * `cache`: The serialized snapshot of a merged filter set.
//! * `matcher`: Scores command patterns against an invocation and picks one filter.
//! * `engine`: Defines the `FilterEngine` trait.
//! * `engines`: Contains concrete implementations of the `FilterEngine` trait.
//! * `patterns`: The shared, thread-safe compiled-regex cache.
//! * `stats`: Per-run records and the `StatsSink` contract.
//! * `headless`: One-shot match-and-apply helpers.
//!
//! ## Public API
//!
//! **Definitions**
//!
//! * [`FilterDefinition`]: One named filter, normalized from its TOML file.
//! * [`validate_definition`]: Collects every problem in a definition.
//!
//! **Loading**
//!
//! * [`FilterRepository`]: Layered loading with a snapshot that is rebuilt when
//!   user files change.
//! * [`merge_filters`]: The "user wins" merge, ordered by name.
//!
//! **Filtering**
//!
//! * [`match_filter`]: Selects the best filter for a command line.
//! * [`FilterEngine`] / [`PipelineEngine`]: Applies a filter to captured output.
//! * [`headless_filter`]: Both steps in a single call.
//!
//! ## Usage Example
//!
//! ```rust
//! use rt_core::{headless_filter, FilterDefinition, FilterSource};
//!
//! let filter = FilterDefinition::from_toml(
//!     r#"
//! command = "git push"
//! skip = ["^remote:"]
//! "#,
//!     "git/push",
//!     FilterSource::User,
//!     "git/push.toml",
//! )
//! .unwrap();
//!
//! let outcome = headless_filter(&[filter], "git push origin main", "remote: hi\ndone\n", 0);
//! assert_eq!(outcome.filter_name.as_deref(), Some("git/push"));
//! assert_eq!(outcome.output, "done");
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return the typed errors in [`errors`]. Filtering itself
//! never fails: a pattern that does not compile turns its rule into a no-op.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod builtin;
pub mod cache;
pub mod config;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod headless;
pub mod matcher;
pub mod patterns;
pub mod repository;
pub mod stats;

/// Re-exports the filter schema and validation.
pub use config::{
    filter_name_from_path, validate_definition, FilterDefinition, FilterSource, MatchOutputRule,
    OutputBlock, ReplaceRule, Variant, VariantDetect,
};

/// Re-exports the typed errors.
pub use errors::{CacheError, ConfigError, PatternError, RtError};

pub use builtin::BuiltinSet;
pub use cache::CachedFilterSet;
pub use repository::{
    merge_filters, CacheInfo, CacheMiss, FilterRepository, LoadOrigin, LoadOutcome, RepositoryPaths,
};

pub use matcher::{match_filter, score};

/// Re-exports the engine trait and its pipeline implementation.
pub use engine::FilterEngine;
pub use engines::pipeline::PipelineEngine;

pub use patterns::compiler::{RegexCache, MAX_PATTERN_LENGTH};

pub use headless::{filter_with_engine, headless_filter, FilterOutcome};
pub use stats::{estimate_tokens, NullSink, RunRecord, StatsSink, PASSTHROUGH};
