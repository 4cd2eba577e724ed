// rt-core/src/matcher.rs
//! Best-match filter selection.
//!
//! A command pattern is a whitespace-tokenized template in which `*` stands for
//! exactly one word. Literal words are worth 10 points and wildcards 1, so the
//! most literal pattern wins: `git status` (20) beats `git *` (11) for
//! `git status -v`. Extra trailing words in the command line are allowed.
//!
//! Ties keep the first candidate in repository order, which is ascending by
//! filter name.

use log::debug;

use crate::config::{FilterDefinition, WILDCARD};

const LITERAL_SCORE: u32 = 10;
const WILDCARD_SCORE: u32 = 1;

/// Scores `pattern` against `command_line`, or `None` if it is not eligible.
pub fn score(pattern: &str, command_line: &str) -> Option<u32> {
    let pattern_tokens: Vec<&str> = pattern.split_whitespace().collect();
    let command_tokens: Vec<&str> = command_line.split_whitespace().collect();

    if pattern_tokens.is_empty() || command_tokens.len() < pattern_tokens.len() {
        return None;
    }

    pattern_tokens
        .iter()
        .zip(&command_tokens)
        .try_fold(0, |total, (pat, cmd)| {
            if *pat == WILDCARD {
                Some(total + WILDCARD_SCORE)
            } else if pat == cmd {
                Some(total + LITERAL_SCORE)
            } else {
                None
            }
        })
}

/// Selects the filter whose command pattern best matches `command_line`.
///
/// `filters` is expected in repository order; among equal scores the earliest
/// one is kept. `None` means passthrough.
pub fn match_filter<'a>(filters: &'a [FilterDefinition], command_line: &str) -> Option<&'a FilterDefinition> {
    let mut best: Option<(&FilterDefinition, u32)> = None;

    for filter in filters {
        for pattern in &filter.commands {
            let Some(s) = score(pattern, command_line) else {
                continue;
            };
            if best.map_or(true, |(_, best_score)| s > best_score) {
                best = Some((filter, s));
            }
        }
    }

    match best {
        Some((filter, s)) => {
            debug!("Command '{}' matched filter '{}' (score {}).", command_line, filter.name, s);
            Some(filter)
        }
        None => {
            debug!("Command '{}' matched no filter.", command_line);
            None
        }
    }
}
