// rt/src/main.rs
//! rt entry point.
//!
//! Parses the command line, installs the logger and hands off to
//! [`rt::dispatch`]. The process exits with the status `dispatch` returns, which
//! for `rt run` is the wrapped command's own exit code.

use clap::Parser;
use std::process::ExitCode;

use rt::cli::{normalize_args, Cli};
use rt::commands::error_msg;
use rt::logger;
use rt::ui::theme::ThemeStyle;

fn main() -> ExitCode {
    // A `.env` in the working directory may carry RT_FILTER_DIR / RT_CACHE_FILE.
    dotenvy::dotenv().ok();

    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    logger::init_logger(logger::level_from_flags(cli.debug, cli.quiet));

    match rt::dispatch(cli) {
        Ok(code) => ExitCode::from(exit_byte(code)),
        Err(e) => {
            error_msg(format!("{:#}", e), &ThemeStyle::default_theme_map());
            ExitCode::FAILURE
        }
    }
}

/// Clamps a child's exit status into the range a process can report.
fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
