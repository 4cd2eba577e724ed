//! Status messages written to stderr (or any writer) with an `rt:` prefix.

use std::io::{self, Write};

use crate::ui::theme::{paint, ThemeEntry, ThemeMap};

const PREFIX: &str = "rt:";

fn print_message<W: Write>(
    writer: &mut W,
    msg: &str,
    entry: ThemeEntry,
    theme: &ThemeMap,
    enable_color: bool,
) -> io::Result<()> {
    writeln!(writer, "{} {}", paint(PREFIX, entry, theme, enable_color), msg)
}

pub fn print_info_message<W: Write>(writer: &mut W, msg: &str, theme: &ThemeMap, enable_color: bool) -> io::Result<()> {
    print_message(writer, msg, ThemeEntry::Info, theme, enable_color)
}

pub fn print_error_message<W: Write>(writer: &mut W, msg: &str, theme: &ThemeMap, enable_color: bool) -> io::Result<()> {
    print_message(writer, msg, ThemeEntry::Error, theme, enable_color)
}
