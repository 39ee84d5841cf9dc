//! Bounded execution of external commands
//!
//! Every call to the version-control tool goes through [`ProcessRunner`]. A
//! command either completes (successfully or not) within the configured
//! timeout, or is reported as failed and its child process killed.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};

/// Default upper bound on a single external command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Outcome of one external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs external commands with a wall-clock bound
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `command` in `working_dir` and fold every failure into a [`CommandResult`]
    ///
    /// A timeout yields an empty stdout and a stderr naming the timeout; a
    /// command that cannot be spawned yields the spawn error as stderr.
    pub async fn run<S: AsRef<str>>(&self, command: &[S], working_dir: &Path) -> CommandResult {
        match self.execute(command, working_dir).await {
            Ok(result) => result,
            Err(e) => CommandResult::failed(e.to_string()),
        }
    }

    /// Run `command` and return its trimmed stdout, or the failure as a [`SyncError`]
    pub async fn run_checked<S: AsRef<str>>(
        &self,
        command: &[S],
        working_dir: &Path,
    ) -> Result<String> {
        let result = self.execute(command, working_dir).await?;
        if result.success {
            Ok(result.stdout)
        } else {
            Err(SyncError::CommandFailure {
                command: display_command(command),
                stderr: result.stderr,
            })
        }
    }

    /// Spawn the command and wait for it, distinguishing "ran and failed" from
    /// "could not run" and "ran too long"
    pub async fn execute<S: AsRef<str>>(
        &self,
        command: &[S],
        working_dir: &Path,
    ) -> Result<CommandResult> {
        let command_line = display_command(command);
        let (program, args) = command.split_first().ok_or_else(|| SyncError::ProcessExecution {
            command: command_line.clone(),
            message: "empty command".to_string(),
        })?;

        debug!("Running command: {} in {}", command_line, working_dir.display());

        let child = AsyncCommand::new(program.as_ref())
            .args(args.iter().map(|a| a.as_ref()))
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Error running command `{}`: {}", command_line, e);
                return Err(SyncError::ProcessExecution {
                    command: command_line,
                    message: e.to_string(),
                });
            }
            Err(_) => {
                warn!("Command timed out: {}", command_line);
                return Err(SyncError::ProcessTimeout {
                    command: command_line,
                    timeout: self.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        let success = output.status.success();

        if !success {
            match output.status.code() {
                Some(code) => warn!("Command `{}` failed with return code {}", command_line, code),
                None => warn!("Command `{}` terminated by signal", command_line),
            }
            if !stderr.is_empty() {
                debug!("Stderr: {}", stderr);
            }
        }

        Ok(CommandResult {
            success,
            stdout,
            stderr,
        })
    }
}

pub(crate) fn display_command<S: AsRef<str>>(command: &[S]) -> String {
    command
        .iter()
        .map(|part| part.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}
