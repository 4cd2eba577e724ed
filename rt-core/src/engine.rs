// rt-core/src/engine.rs
//! Defines the `FilterEngine` trait.
//!
//! An engine turns the captured output of one command into the text that is
//! shown to the agent. Implementations must be pure with respect to their
//! three inputs and must never fail: a malformed rule degrades to a rule that
//! never matches.
//!
//! License: MIT OR APACHE 2.0

use crate::config::FilterDefinition;
use crate::patterns::compiler::RegexCache;

pub trait FilterEngine: Send + Sync {
    /// Runs `filter` over `raw`, the combined output of a command that exited
    /// with `exit_code`, and returns the text to display.
    fn apply(&self, filter: &FilterDefinition, raw: &str, exit_code: i32) -> String;

    /// The compiled-pattern cache the engine evaluates rules with.
    fn regex_cache(&self) -> &RegexCache;
}
