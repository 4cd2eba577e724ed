// rt-core/src/headless.rs
//! `headless.rs`
//! One-shot helpers for callers that already hold captured output.
//!
//! Wraps matcher selection and engine application into a single call so that
//! hooks and tests do not have to wire the pieces together themselves.

use crate::config::FilterDefinition;
use crate::engine::FilterEngine;
use crate::engines::pipeline::PipelineEngine;
use crate::matcher::match_filter;
use crate::stats::RunRecord;

/// Result of filtering one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Name of the selected filter, `None` for passthrough.
    pub filter_name: Option<String>,
    pub output: String,
}

impl FilterOutcome {
    /// The statistics record for this outcome.
    pub fn record(&self, command_line: &str, raw: &str, exit_code: i32) -> RunRecord {
        RunRecord::new(
            self.filter_name.as_deref(),
            command_line,
            raw,
            &self.output,
            exit_code,
        )
    }
}

/// Selects a filter for `command_line` and applies it with `engine`.
///
/// When nothing matches, `raw` is returned unchanged.
pub fn filter_with_engine(
    engine: &dyn FilterEngine,
    filters: &[FilterDefinition],
    command_line: &str,
    raw: &str,
    exit_code: i32,
) -> FilterOutcome {
    match match_filter(filters, command_line) {
        Some(filter) => FilterOutcome {
            filter_name: Some(filter.name.clone()),
            output: engine.apply(filter, raw, exit_code),
        },
        None => FilterOutcome {
            filter_name: None,
            output: raw.to_string(),
        },
    }
}

/// Like [`filter_with_engine`], using a fresh [`PipelineEngine`].
pub fn headless_filter(
    filters: &[FilterDefinition],
    command_line: &str,
    raw: &str,
    exit_code: i32,
) -> FilterOutcome {
    filter_with_engine(&PipelineEngine::new(), filters, command_line, raw, exit_code)
}
