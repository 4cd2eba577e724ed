//! Filter definition schema for `rt-core`.
//!
//! This module defines the on-disk TOML contract for a filter, the normalized
//! [`FilterDefinition`] the rest of the crate works with, and the validation
//! used when a definition is checked or installed.
//!
//! Loose typing in the file format (`command` may be a string or a list) is
//! resolved here, once; nothing downstream ever sees the raw form.
//!
//! License: MIT OR Apache-2.0

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

use crate::errors::{ConfigError, RtError};
use crate::patterns::compiler::compile_pattern;

/// File extension of a filter definition.
pub const FILTER_EXTENSION: &str = "toml";

/// Token that matches any single word of a command line.
pub const WILDCARD: &str = "*";

/// Placeholder substituted by an output block template.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

static CAPTURE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\d+)\}").expect("placeholder regex is valid"));

/// Which precedence layer a definition was loaded from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterSource {
    #[default]
    Builtin,
    User,
}

impl FilterSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterSource::Builtin => "builtin",
            FilterSource::User => "user",
        }
    }
}

impl fmt::Display for FilterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rewrites a whole line when `pattern` matches it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceRule {
    pub pattern: String,
    /// Template with `{0}`..`{n}` bound to capture groups.
    pub output: String,
}

/// Short-circuits the pipeline with a fixed message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchOutputRule {
    pub contains: Option<String>,
    pub matches: Option<String>,
    pub output: String,
}

/// Post-processing applied on success or on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputBlock {
    /// Template containing `{output}`.
    pub output: Option<String>,
    pub head: Option<usize>,
    pub tail: Option<usize>,
    #[serde(default)]
    pub skip: Vec<String>,
    #[serde(default)]
    pub keep: Vec<String>,
    /// Lines before the first match of this pattern are dropped.
    pub start_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantDetect {
    #[serde(default)]
    pub files: Vec<String>,
}

/// An alternative filter selected by project markers.
///
/// Carried through loading and caching but not interpreted by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub detect: VariantDetect,
    pub filter: String,
}

/// A single, normalized filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDefinition {
    /// Hierarchical id such as `git/status`.
    pub name: String,
    pub source: FilterSource,
    /// Where the definition came from (embedded path or file on disk).
    pub path: String,
    /// Command templates, whitespace tokenized at match time.
    pub commands: Vec<String>,
    /// Replacement command line to execute instead of the invoked one.
    pub run: Option<String>,
    /// Informational only.
    pub strip_ansi: bool,
    pub skip: Vec<String>,
    pub keep: Vec<String>,
    pub replace: Vec<ReplaceRule>,
    pub match_output: Vec<MatchOutputRule>,
    pub on_success: Option<OutputBlock>,
    pub on_failure: Option<OutputBlock>,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommandList {
    One(String),
    Many(Vec<String>),
}

impl From<CommandList> for Vec<String> {
    fn from(list: CommandList) -> Self {
        match list {
            CommandList::One(cmd) => vec![cmd],
            CommandList::Many(cmds) => cmds,
        }
    }
}

/// The TOML document exactly as written on disk.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilterFile {
    command: Option<CommandList>,
    run: Option<String>,
    #[serde(default)]
    strip_ansi: bool,
    #[serde(default)]
    skip: Vec<String>,
    #[serde(default)]
    keep: Vec<String>,
    #[serde(default)]
    replace: Vec<ReplaceRule>,
    #[serde(default)]
    match_output: Vec<MatchOutputRule>,
    on_success: Option<OutputBlock>,
    on_failure: Option<OutputBlock>,
    #[serde(default, rename = "variant")]
    variants: Vec<Variant>,
}

impl FilterDefinition {
    /// Parses a TOML document into a definition with the given identity.
    pub fn from_toml(
        text: &str,
        name: &str,
        source: FilterSource,
        path: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let file: FilterFile = toml::from_str(text).map_err(|e| ConfigError::Parse {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            name: name.to_string(),
            source,
            path: path.into(),
            commands: file.command.map(Vec::from).unwrap_or_default(),
            run: file.run.filter(|r| !r.trim().is_empty()),
            strip_ansi: file.strip_ansi,
            skip: file.skip,
            keep: file.keep,
            replace: file.replace,
            match_output: file.match_output,
            on_success: file.on_success,
            on_failure: file.on_failure,
            variants: file.variants,
        })
    }

    /// Reads and parses a definition file.
    pub fn load_from_file<P: AsRef<Path>>(
        path: P,
        name: &str,
        source: FilterSource,
    ) -> Result<Self, RtError> {
        let path = path.as_ref();
        debug!("Loading filter '{}' from {}", name, path.display());
        let text = std::fs::read_to_string(path).map_err(|e| RtError::SourceIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::from_toml(&text, name, source, path.display().to_string())?)
    }

    /// The output block that applies to a given exit status, if any.
    pub fn block_for(&self, exit_code: i32) -> Option<&OutputBlock> {
        if exit_code == 0 {
            self.on_success.as_ref()
        } else {
            self.on_failure.as_ref()
        }
    }
}

/// Derives a filter name from a path relative to its filter root.
///
/// `git/status.toml` becomes `git/status`. Returns `None` for anything that is
/// not a `.toml` file or that escapes the root.
pub fn filter_name_from_path(relative: &Path) -> Option<String> {
    if relative.extension().and_then(|e| e.to_str()) != Some(FILTER_EXTENSION) {
        return None;
    }

    let stem = relative.with_extension("");
    let mut parts = Vec::new();
    for component in stem.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Checks a definition for every problem that would make a rule inert or the
/// filter unreachable, and reports them together.
pub fn validate_definition(filter: &FilterDefinition) -> Result<(), ConfigError> {
    let mut problems = Vec::new();

    if filter.commands.is_empty() {
        problems.push("No `command` patterns declared.".to_string());
    }
    for (i, cmd) in filter.commands.iter().enumerate() {
        if cmd.split_whitespace().next().is_none() {
            problems.push(format!("Command pattern #{} is empty.", i + 1));
        }
    }

    check_patterns("skip", &filter.skip, &mut problems);
    check_patterns("keep", &filter.keep, &mut problems);

    for (i, rule) in filter.replace.iter().enumerate() {
        let regex = match compile_pattern(&rule.pattern) {
            Ok(regex) => regex,
            Err(e) => {
                problems.push(format!("replace #{}: {}", i + 1, e));
                continue;
            }
        };

        // captures_len() counts the implicit whole-match group.
        let highest = regex.captures_len() - 1;
        for cap in CAPTURE_PLACEHOLDER.captures_iter(&rule.output) {
            if let Ok(group) = cap[1].parse::<usize>() {
                if group > highest {
                    problems.push(format!(
                        "replace #{}: output references non-existent capture group '{{{}}}'.",
                        i + 1,
                        group
                    ));
                }
            }
        }
    }

    for (i, rule) in filter.match_output.iter().enumerate() {
        let contains = rule.contains.as_deref().unwrap_or_default();
        let matches = rule.matches.as_deref().unwrap_or_default();
        if contains.is_empty() && matches.is_empty() {
            problems.push(format!(
                "match_output #{}: needs `contains` or `matches`.",
                i + 1
            ));
        }
        if !matches.is_empty() {
            if let Err(e) = compile_pattern(matches) {
                problems.push(format!("match_output #{}: {}", i + 1, e));
            }
        }
    }

    for (label, block) in [("on_success", &filter.on_success), ("on_failure", &filter.on_failure)] {
        if let Some(block) = block {
            if let Some(start_at) = &block.start_at {
                if let Err(e) = compile_pattern(start_at) {
                    problems.push(format!("{}.start_at: {}", label, e));
                }
            }
            check_patterns(&format!("{}.skip", label), &block.skip, &mut problems);
            check_patterns(&format!("{}.keep", label), &block.keep, &mut problems);
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            name: filter.name.clone(),
            problems,
        })
    }
}

fn check_patterns(label: &str, patterns: &[String], problems: &mut Vec<String>) {
    for (i, pattern) in patterns.iter().enumerate() {
        if let Err(e) = compile_pattern(pattern) {
            problems.push(format!("{} #{}: {}", label, i + 1, e));
        }
    }
}
