//! Narrow seam over external process invocation.
//!
//! Everything that shells out (git, nvidia-smi) goes through [`CommandRunner`]
//! so the callers can be driven by scripted fakes in tests.

use std::io;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{PullwatchError, Result};

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Turn a non-zero exit into [`PullwatchError::CommandFailed`].
    pub fn check(self, command: &str) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(PullwatchError::CommandFailed {
            command: command.to_string(),
            code: self
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            stderr: self.stderr.trim().to_string(),
        })
    }
}

pub trait CommandRunner: Send + Sync {
    /// Run `program` to completion. `Err` means the process could not be started;
    /// a non-zero exit is reported through [`CommandOutput::code`].
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> io::Result<CommandOutput>;
}

/// Runs commands on the host via `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> io::Result<CommandOutput> {
        debug!(program, ?args, ?cwd, "running command");

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let out = cmd.output()?;
        Ok(CommandOutput {
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        })
    }
}

/// Run a command and fail on spawn errors or non-zero exits.
pub fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<CommandOutput> {
    let command = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");

    runner
        .run(program, args, cwd)
        .map_err(|source| PullwatchError::Spawn {
            program: program.to_string(),
            source,
        })?
        .check(&command)
}
