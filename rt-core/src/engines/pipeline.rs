// rt-core/src/engines/pipeline.rs
//! The ordered output transformation pipeline.
//!
//! Stages, in order:
//!
//! 1. `match_output`: the first rule that hits the raw text replaces the whole
//!    result and nothing else runs.
//! 2. Split into lines, dropping the empty element left by a trailing newline.
//! 3. `skip`, then `keep`. Keep can only narrow what skip left.
//! 4. `replace`: first matching rule per line rewrites the whole line.
//! 5. `on_success` / `on_failure`, chosen by exit status.
//! 6. Join with `\n`.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::Arc;

use crate::config::{FilterDefinition, MatchOutputRule, OutputBlock, ReplaceRule, OUTPUT_PLACEHOLDER};
use crate::engine::FilterEngine;
use crate::patterns::compiler::RegexCache;

#[derive(Debug, Clone, Default)]
pub struct PipelineEngine {
    regexes: Arc<RegexCache>,
}

impl PipelineEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an engine that shares an existing pattern cache.
    pub fn with_cache(regexes: Arc<RegexCache>) -> Self {
        Self { regexes }
    }

    fn short_circuit<'f>(&self, rules: &'f [MatchOutputRule], raw: &str) -> Option<&'f str> {
        rules.iter().find_map(|rule| {
            let contains = rule
                .contains
                .as_deref()
                .is_some_and(|needle| !needle.is_empty() && raw.contains(needle));
            let matches = || {
                rule.matches
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .and_then(|p| self.regexes.compile(p).ok())
                    .is_some_and(|re| re.is_match(raw))
            };
            (contains || matches()).then_some(rule.output.as_str())
        })
    }

    fn skip_lines<'a>(&self, lines: Vec<Cow<'a, str>>, patterns: &[String]) -> Vec<Cow<'a, str>> {
        let regexes = self.regexes.compile_all(patterns);
        lines
            .into_iter()
            .filter(|line| !regexes.iter().any(|re| re.is_match(line)))
            .collect()
    }

    fn keep_lines<'a>(&self, lines: Vec<Cow<'a, str>>, patterns: &[String]) -> Vec<Cow<'a, str>> {
        let regexes = self.regexes.compile_all(patterns);
        lines
            .into_iter()
            .filter(|line| regexes.iter().any(|re| re.is_match(line)))
            .collect()
    }

    fn replace_lines<'a>(&self, lines: Vec<Cow<'a, str>>, rules: &[ReplaceRule]) -> Vec<Cow<'a, str>> {
        let compiled: Vec<(Arc<Regex>, &str)> = rules
            .iter()
            .filter_map(|rule| {
                self.regexes
                    .compile(&rule.pattern)
                    .ok()
                    .map(|re| (re, rule.output.as_str()))
            })
            .collect();

        lines
            .into_iter()
            .map(|line| {
                compiled
                    .iter()
                    .find_map(|(re, template)| re.captures(&line).map(|caps| expand_template(template, &caps)))
                    .map_or(line, Cow::Owned)
            })
            .collect()
    }

    fn apply_block(&self, block: &OutputBlock, mut lines: Vec<Cow<'_, str>>) -> String {
        if let Some(start_at) = block.start_at.as_deref() {
            if let Ok(re) = self.regexes.compile(start_at) {
                if let Some(first) = lines.iter().position(|line| re.is_match(line)) {
                    lines.drain(..first);
                }
            }
        }
        if !block.skip.is_empty() {
            lines = self.skip_lines(lines, &block.skip);
        }
        if !block.keep.is_empty() {
            lines = self.keep_lines(lines, &block.keep);
        }
        if let Some(tail) = block.tail.filter(|&n| n > 0) {
            if lines.len() > tail {
                lines.drain(..lines.len() - tail);
            }
        }
        if let Some(head) = block.head.filter(|&n| n > 0) {
            lines.truncate(head);
        }

        let joined = lines.join("\n");
        match block.output.as_deref().filter(|t| !t.is_empty()) {
            Some(template) => template.replace(OUTPUT_PLACEHOLDER, &joined),
            None => joined,
        }
    }
}

impl FilterEngine for PipelineEngine {
    fn apply(&self, filter: &FilterDefinition, raw: &str, exit_code: i32) -> String {
        if let Some(output) = self.short_circuit(&filter.match_output, raw) {
            debug!("Filter '{}' short-circuited on match_output.", filter.name);
            return output.to_string();
        }

        let mut lines: Vec<Cow<'_, str>> = raw.split('\n').map(Cow::Borrowed).collect();
        if lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        if !filter.skip.is_empty() {
            lines = self.skip_lines(lines, &filter.skip);
        }
        if !filter.keep.is_empty() {
            lines = self.keep_lines(lines, &filter.keep);
        }
        if !filter.replace.is_empty() {
            lines = self.replace_lines(lines, &filter.replace);
        }

        match filter.block_for(exit_code) {
            Some(block) => self.apply_block(block, lines),
            None => lines.join("\n"),
        }
    }

    fn regex_cache(&self) -> &RegexCache {
        &self.regexes
    }
}

/// Expands `{n}` placeholders in a single pass.
///
/// A group that did not participate expands to nothing; an index past the
/// last group, or anything that is not `{digits}`, is copied literally.
fn expand_template(template: &str, caps: &Captures<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();

        if digits > 0 && after.as_bytes().get(digits) == Some(&b'}') {
            if let Ok(index) = after[..digits].parse::<usize>() {
                if index < caps.len() {
                    out.push_str(caps.get(index).map_or("", |m| m.as_str()));
                    rest = &after[digits + 1..];
                    continue;
                }
            }
        }

        out.push('{');
        rest = after;
    }

    out.push_str(rest);
    out
}
