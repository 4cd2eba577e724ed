//! Module for managing the colors used by the `rt` command-line interface.
//!
//! Each logical part of the output maps to a named 16-color ANSI foreground.
//! Color is only ever applied when the destination stream is a terminal.

use owo_colors::{AnsiColors, OwoColorize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Type alias for the theme map, providing a consistent type definition.
pub type ThemeMap = HashMap<ThemeEntry, ThemeStyle>;

/// The different logical parts of the output that can be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeEntry {
    /// Table headers.
    Header,
    /// General informational messages.
    Info,
    /// Error messages.
    Error,
    /// A filter name in listings.
    FilterName,
    /// The `builtin` source tag.
    SourceBuiltin,
    /// The `user` source tag.
    SourceUser,
}

/// A named ANSI color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeColor(String);

/// Error type for parsing an invalid `ThemeColor` string.
#[derive(Debug, Clone)]
pub struct ParseThemeColorError;

impl fmt::Display for ParseThemeColorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Invalid theme color; expected one of: black, red, green, yellow, blue, \
            magenta, cyan, white, brightblack, brightred, brightgreen, brightyellow, \
            brightblue, brightmagenta, brightcyan, brightwhite."
        )
    }
}

impl std::error::Error for ParseThemeColorError {}

impl FromStr for ThemeColor {
    type Err = ParseThemeColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "black" | "red" | "green" | "yellow" | "blue" | "magenta" | "cyan" | "white" |
            "brightblack" | "brightred" | "brightgreen" | "brightyellow" | "brightblue" |
            "brightmagenta" | "brightcyan" | "brightwhite" => Ok(ThemeColor(lower)),
            _ => Err(ParseThemeColorError),
        }
    }
}

impl ThemeColor {
    fn named(name: &str) -> Self {
        ThemeColor(name.to_string())
    }

    /// Converts the color name into its `owo_colors::AnsiColors` value.
    pub fn to_ansi_color(&self) -> AnsiColors {
        match self.0.as_str() {
            "black" => AnsiColors::Black,
            "red" => AnsiColors::Red,
            "green" => AnsiColors::Green,
            "yellow" => AnsiColors::Yellow,
            "blue" => AnsiColors::Blue,
            "magenta" => AnsiColors::Magenta,
            "cyan" => AnsiColors::Cyan,
            "white" => AnsiColors::White,
            "brightblack" => AnsiColors::BrightBlack,
            "brightred" => AnsiColors::BrightRed,
            "brightgreen" => AnsiColors::BrightGreen,
            "brightyellow" => AnsiColors::BrightYellow,
            "brightblue" => AnsiColors::BrightBlue,
            "brightmagenta" => AnsiColors::BrightMagenta,
            "brightcyan" => AnsiColors::BrightCyan,
            "brightwhite" => AnsiColors::BrightWhite,
            _ => AnsiColors::White,
        }
    }
}

/// Represents the style configuration for a specific `ThemeEntry`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeStyle {
    pub fg: Option<ThemeColor>,
}

impl ThemeStyle {
    /// Returns the default theme map.
    pub fn default_theme_map() -> ThemeMap {
        [
            (ThemeEntry::Header, "brightwhite"),
            (ThemeEntry::Info, "cyan"),
            (ThemeEntry::Error, "red"),
            (ThemeEntry::FilterName, "brightcyan"),
            (ThemeEntry::SourceBuiltin, "brightblack"),
            (ThemeEntry::SourceUser, "magenta"),
        ]
        .into_iter()
        .map(|(entry, color)| (entry, ThemeStyle { fg: Some(ThemeColor::named(color)) }))
        .collect()
    }
}

/// Applies the style for `entry` to `text` when `enable_color` is set.
pub fn paint(text: &str, entry: ThemeEntry, theme: &ThemeMap, enable_color: bool) -> String {
    if !enable_color {
        return text.to_string();
    }
    match theme.get(&entry).and_then(|style| style.fg.as_ref()) {
        Some(color) => text.color(color.to_ansi_color()).to_string(),
        None => text.to_string(),
    }
}
