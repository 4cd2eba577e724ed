// rt/src/runner.rs
//! Subprocess execution for `rt run`.
//!
//! Stdout and stderr share one pipe so the captured text keeps the order in
//! which the child wrote it. Stdin and the environment are inherited.

use log::{debug, error};
use std::io::{self, Read};
use std::process::{Command, Stdio};

/// Exit status reported when the child could not be started or waited on.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 1;

const SHELL: &str = "sh";

/// Combined output and exit status of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub output: String,
    pub exit_code: i32,
}

/// How a command line is handed to the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation<'a> {
    /// `sh -c <line>`: pipes, redirections and `&&` keep working.
    Shell(&'a str),
    /// The first element is the program, the rest are its arguments.
    Argv(&'a [String]),
}

/// Runs `invocation` to completion. Never fails: a command that cannot be
/// started yields empty output and [`SPAWN_FAILURE_EXIT_CODE`].
pub fn run(invocation: Invocation<'_>) -> RunOutput {
    let Some(command) = build_command(invocation) else {
        return RunOutput {
            output: String::new(),
            exit_code: SPAWN_FAILURE_EXIT_CODE,
        };
    };

    debug!("Executing {:?}", command);
    match capture(command) {
        Ok(out) => out,
        Err(e) => {
            error!("Failed to run {:?}: {}", invocation, e);
            RunOutput {
                output: String::new(),
                exit_code: SPAWN_FAILURE_EXIT_CODE,
            }
        }
    }
}

fn build_command(invocation: Invocation<'_>) -> Option<Command> {
    match invocation {
        Invocation::Shell(line) => {
            if line.trim().is_empty() {
                return None;
            }
            let mut command = Command::new(SHELL);
            command.arg("-c").arg(line);
            Some(command)
        }
        Invocation::Argv(args) => {
            let (program, rest) = args.split_first()?;
            let mut command = Command::new(program);
            command.args(rest);
            Some(command)
        }
    }
}

fn capture(mut command: Command) -> io::Result<RunOutput> {
    let (mut reader, writer) = io::pipe()?;
    command
        .stdin(Stdio::inherit())
        .stdout(writer.try_clone()?)
        .stderr(writer);

    let mut child = command.spawn()?;
    // The command still holds the write ends; the read below only sees EOF
    // once they are closed.
    drop(command);

    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let status = child.wait()?;

    Ok(RunOutput {
        output: String::from_utf8_lossy(&bytes).into_owned(),
        exit_code: status.code().unwrap_or(SPAWN_FAILURE_EXIT_CODE),
    })
}
