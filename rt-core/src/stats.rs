// rt-core/src/stats.rs
//! Per-run usage records and the sink they are reported to.
//!
//! The core never decides where records go; the binary supplies a
//! [`StatsSink`]. Recording is best-effort and must never change the output or
//! exit status of a run.

use serde::Serialize;

/// Filter name recorded when no filter matched the command.
pub const PASSTHROUGH: &str = "passthrough";

/// Rough token count for `text`: one token per four bytes, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub filter_name: String,
    pub command: String,
    pub raw_bytes: usize,
    pub filtered_bytes: usize,
    pub raw_tokens: usize,
    pub filtered_tokens: usize,
    pub exit_code: i32,
}

impl RunRecord {
    pub fn new(
        filter_name: Option<&str>,
        command: &str,
        raw: &str,
        filtered: &str,
        exit_code: i32,
    ) -> Self {
        Self {
            filter_name: filter_name.unwrap_or(PASSTHROUGH).to_string(),
            command: command.to_string(),
            raw_bytes: raw.len(),
            filtered_bytes: filtered.len(),
            raw_tokens: estimate_tokens(raw),
            filtered_tokens: estimate_tokens(filtered),
            exit_code,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.filter_name == PASSTHROUGH
    }

    /// Estimated tokens saved by filtering; zero when output grew.
    pub fn saved_tokens(&self) -> usize {
        self.raw_tokens.saturating_sub(self.filtered_tokens)
    }

    /// Percentage of tokens saved, `0.0` for empty raw output.
    pub fn savings_percent(&self) -> f64 {
        if self.raw_tokens == 0 {
            return 0.0;
        }
        self.saved_tokens() as f64 * 100.0 / self.raw_tokens as f64
    }
}

/// Destination for run records.
pub trait StatsSink {
    /// Must not panic. Failures are the sink's own business.
    fn record(&self, record: &RunRecord);
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatsSink for NullSink {
    fn record(&self, _record: &RunRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_passthrough_record() {
        let record = RunRecord::new(None, "ls -la", "abcdefgh", "abcdefgh", 0);
        assert!(record.is_passthrough());
        assert_eq!(record.saved_tokens(), 0);
        assert_eq!(record.savings_percent(), 0.0);
    }

    #[test]
    fn test_savings() {
        let raw = "x".repeat(400);
        let record = RunRecord::new(Some("git/status"), "git status", &raw, "ok", 1);
        assert_eq!(record.filter_name, "git/status");
        assert_eq!(record.raw_tokens, 100);
        assert_eq!(record.filtered_tokens, 1);
        assert_eq!(record.saved_tokens(), 99);
        assert!((record.savings_percent() - 99.0).abs() < f64::EPSILON);
        assert_eq!(record.exit_code, 1);
    }

    #[test]
    fn test_grown_output_saves_nothing() {
        let record = RunRecord::new(Some("f"), "c", "a", "much longer output", 0);
        assert_eq!(record.saved_tokens(), 0);
    }
}
