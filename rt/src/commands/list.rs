//! `rt ls`: list the merged filter set.

use anyhow::{Context, Result};
use comfy_table::presets::NOTHING;
use comfy_table::{Cell, Table};
use serde::Serialize;
use std::io::Write;

use rt_core::{FilterDefinition, FilterSource};

use crate::ui::theme::{paint, ThemeEntry, ThemeMap};

/// The JSON shape of one listed filter.
#[derive(Debug, Serialize)]
struct FilterSummary<'a> {
    name: &'a str,
    source: FilterSource,
    commands: &'a [String],
    path: &'a str,
}

impl<'a> From<&'a FilterDefinition> for FilterSummary<'a> {
    fn from(def: &'a FilterDefinition) -> Self {
        Self {
            name: &def.name,
            source: def.source,
            commands: &def.commands,
            path: &def.path,
        }
    }
}

/// Writes `filters` as a JSON array.
pub fn write_json<W: Write>(filters: &[FilterDefinition], out: &mut W) -> Result<()> {
    let summaries: Vec<FilterSummary<'_>> = filters.iter().map(FilterSummary::from).collect();
    serde_json::to_writer_pretty(&mut *out, &summaries).context("Failed to serialize filter list")?;
    writeln!(out)?;
    Ok(())
}

/// Writes `filters` as an aligned table, colored from `theme` when
/// `enable_color` is set.
pub fn write_table<W: Write>(
    filters: &[FilterDefinition],
    out: &mut W,
    theme: &ThemeMap,
    enable_color: bool,
) -> Result<()> {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.force_no_tty();

    table.set_header(
        ["NAME", "SOURCE", "COMMANDS"]
            .into_iter()
            .map(|h| Cell::new(paint(h, ThemeEntry::Header, theme, enable_color))),
    );

    for def in filters {
        let source_entry = match def.source {
            FilterSource::Builtin => ThemeEntry::SourceBuiltin,
            FilterSource::User => ThemeEntry::SourceUser,
        };
        table.add_row(vec![
            Cell::new(paint(&def.name, ThemeEntry::FilterName, theme, enable_color)),
            Cell::new(paint(def.source.as_str(), source_entry, theme, enable_color)),
            Cell::new(def.commands.join(", ")),
        ]);
    }

    writeln!(out, "{table}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;

    fn filters() -> Vec<FilterDefinition> {
        vec![
            FilterDefinition {
                name: "cargo/test".to_string(),
                source: FilterSource::Builtin,
                path: "cargo/test.toml".to_string(),
                commands: vec!["cargo test".to_string(), "cargo test *".to_string()],
                ..Default::default()
            },
            FilterDefinition {
                name: "git/status".to_string(),
                source: FilterSource::User,
                path: "/home/u/.config/rt/filters/git/status.toml".to_string(),
                commands: vec!["git status".to_string()],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_json_listing() {
        let mut out = Vec::new();
        write_json(&filters(), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["name"], "cargo/test");
        assert_eq!(value[0]["source"], "builtin");
        assert_eq!(value[1]["source"], "user");
        assert_eq!(value[0]["commands"][1], "cargo test *");
    }

    #[test]
    fn test_plain_table_listing() {
        let mut out = Vec::new();
        write_table(&filters(), &mut out, &ThemeStyle::default_theme_map(), false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("NAME"));
        assert!(text.contains("cargo test, cargo test *"));
        assert!(text.lines().any(|l| l.contains("git/status") && l.contains("user")));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_colored_table_keeps_columns_aligned() {
        let mut out = Vec::new();
        write_table(&filters(), &mut out, &ThemeStyle::default_theme_map(), true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains('\u{1b}'));

        let plain: Vec<String> = text.lines().map(strip_escapes).collect();
        let column = |line: &str| line.find("cargo test").or_else(|| line.find("git status"));
        let starts: Vec<usize> = plain[1..].iter().filter_map(|l| column(l)).collect();
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0], starts[1]);
    }

    fn strip_escapes(line: &str) -> String {
        let mut out = String::new();
        let mut chars = line.chars();
        while let Some(c) = chars.next() {
            if c == '\u{1b}' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }
}
