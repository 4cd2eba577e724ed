//! compiler.rs - Compilation and caching of filter regular expressions.
//!
//! Every skip, keep, replace, match_output and start_at pattern goes through a
//! [`RegexCache`]. The cache is keyed by the pattern source text and shared by
//! all stages of the pipeline, so a pattern used by several filters (or by the
//! same filter on every invocation of a long-lived host) is compiled once.
//!
//! License: MIT OR APACHE 2.0

use log::warn;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::errors::PatternError;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 1024;

/// Upper bound on the size of a single compiled program.
const COMPILED_SIZE_LIMIT: usize = 10 * (1 << 20);

type CacheEntry = Result<Arc<Regex>, PatternError>;

/// A thread-safe memo of compiled patterns.
///
/// Failures are memoized alongside successes: a malformed pattern is reported
/// once and then stays inert for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct RegexCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl RegexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled form of `pattern`, compiling it on first use.
    pub fn compile(&self, pattern: &str) -> Result<Arc<Regex>, PatternError> {
        // Attempt to acquire a read lock first.
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(pattern) {
                return entry.clone();
            }
        } // Read lock is released here.

        let compiled = compile_pattern(pattern).map(Arc::new);
        if let Err(e) = &compiled {
            warn!("Pattern rejected, its rule will never match: {}", e);
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have won the race; keep whichever landed first so
        // every caller shares one `Arc`.
        entries
            .entry(pattern.to_string())
            .or_insert(compiled)
            .clone()
    }

    /// Compiles every pattern in `patterns`, silently dropping the ones that fail.
    pub fn compile_all<S: AsRef<str>>(&self, patterns: &[S]) -> Vec<Arc<Regex>> {
        patterns
            .iter()
            .filter_map(|p| self.compile(p.as_ref()).ok())
            .collect()
    }

    /// Number of distinct pattern sources seen so far.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compiles a single pattern without touching any cache.
///
/// Used by validation, which wants the error message rather than a memo.
pub fn compile_pattern(pattern: &str) -> Result<Regex, PatternError> {
    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(PatternError::TooLong(pattern.len(), MAX_PATTERN_LENGTH));
    }

    RegexBuilder::new(pattern)
        .size_limit(COMPILED_SIZE_LIMIT)
        .build()
        .map_err(|e| PatternError::Compile {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;

    #[test]
    fn test_compile_is_memoized() {
        let cache = RegexCache::new();
        let a = cache.compile(r"^\d+$").unwrap();
        let b = cache.compile(r"^\d+$").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalid_pattern_is_memoized_as_error() {
        let cache = RegexCache::new();
        assert!(matches!(cache.compile("(unclosed"), Err(PatternError::Compile { .. })));
        assert!(cache.compile("(unclosed").is_err());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overlong_pattern_rejected() {
        let cache = RegexCache::new();
        let long = "a".repeat(MAX_PATTERN_LENGTH + 1);
        assert_eq!(
            cache.compile(&long).unwrap_err(),
            PatternError::TooLong(MAX_PATTERN_LENGTH + 1, MAX_PATTERN_LENGTH)
        );
    }

    #[test]
    fn test_compile_all_drops_failures() {
        let cache = RegexCache::new();
        let compiled = cache.compile_all(&["^ok", "[", "done$"]);
        assert_eq!(compiled.len(), 2);
        assert!(compiled[0].is_match("ok then"));
        assert!(compiled[1].is_match("all done"));
    }

    #[test]
    fn test_concurrent_access_shares_one_regex() {
        let cache = Arc::new(RegexCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.compile(r"warning: (\w+)").unwrap())
            })
            .collect();

        let compiled: Vec<Arc<Regex>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for re in &compiled[1..] {
            assert!(Arc::ptr_eq(&compiled[0], re));
        }
        assert_eq!(cache.len(), 1);
    }

    struct CapturingLogger(Mutex<Vec<(log::Level, String)>>);

    impl log::Log for CapturingLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            let mut seen = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            seen.push((record.level(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    static LOGGER: CapturingLogger = CapturingLogger(Mutex::new(Vec::new()));

    #[test]
    fn test_overlong_pattern_is_reported_as_warning() {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);

        let long = format!("(x{})", "y".repeat(MAX_PATTERN_LENGTH));
        let cache = RegexCache::new();
        assert!(cache.compile(&long).is_err());
        assert!(cache.compile(&long).is_err());

        let seen = LOGGER.0.lock().unwrap();
        let reports: Vec<_> = seen
            .iter()
            .filter(|(_, msg)| msg.contains("exceeds maximum allowed"))
            .collect();
        assert_eq!(reports.len(), 1, "rejection is logged once per pattern");
        assert_eq!(reports[0].0, log::Level::Warn);
    }
}
