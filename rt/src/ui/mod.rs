//! Terminal presentation: colors and status messages.

pub mod output_format;
pub mod theme;
