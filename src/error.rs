//! Error taxonomy for submodule synchronization
//!
//! Component contracts (`inspect`, `update`, `commit`, `push`) report failure
//! through their return value and a log line. `SyncError` is what flows
//! underneath them: every version-control operation returns
//! `Result<String, SyncError>` so callers can decide per failure class
//! whether to continue or abort.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while synchronizing submodules
#[derive(Debug, Error)]
pub enum SyncError {
    /// The external command did not finish within the configured bound
    #[error("Command timed out after {}s: {command}", timeout.as_secs())]
    ProcessTimeout { command: String, timeout: Duration },

    /// The external command could not be started at all (e.g. binary not found)
    #[error("Failed to execute `{command}`: {message}")]
    ProcessExecution { command: String, message: String },

    /// The external command ran but exited unsuccessfully
    #[error("`{command}` failed: {stderr}")]
    CommandFailure { command: String, stderr: String },

    #[error("Declaration file not found: {}", .0.display())]
    MissingDeclarationFile(PathBuf),

    #[error("Submodule directory does not exist: {}", .0.display())]
    MissingSubmoduleDirectory(PathBuf),

    /// Current or remote state of a submodule could not be determined
    #[error("Cannot determine status of {}: {reason}", path.display())]
    UnresolvableStatus { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Short failure class used in log lines and summaries
    pub fn category(&self) -> &'static str {
        match self {
            Self::ProcessTimeout { .. } => "timeout",
            Self::ProcessExecution { .. } => "execution",
            Self::CommandFailure { .. } => "command",
            Self::MissingDeclarationFile(_) => "declarations",
            Self::MissingSubmoduleDirectory(_) => "missing",
            Self::UnresolvableStatus { .. } => "status",
            Self::Io(_) => "io",
        }
    }

    /// Diagnostic text reported by the failing tool, if any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailure { stderr, .. } => Some(stderr),
            Self::ProcessExecution { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Tool stderr when there is one, otherwise the full error message
    pub fn detail(&self) -> String {
        self.stderr()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_command_and_bound() {
        let err = SyncError::ProcessTimeout {
            command: "git fetch origin".to_string(),
            timeout: Duration::from_secs(300),
        };
        let msg = err.to_string();
        assert!(msg.contains("300s"));
        assert!(msg.contains("git fetch origin"));
        assert_eq!(err.category(), "timeout");
    }

    #[test]
    fn test_stderr_accessor() {
        let err = SyncError::CommandFailure {
            command: "git pull origin main".to_string(),
            stderr: "fatal: not possible to fast-forward".to_string(),
        };
        assert_eq!(err.stderr(), Some("fatal: not possible to fast-forward"));
        assert_eq!(err.detail(), "fatal: not possible to fast-forward");

        let err = SyncError::MissingDeclarationFile(PathBuf::from(".gitmodules"));
        assert_eq!(err.stderr(), None);
        assert_eq!(err.detail(), "Declaration file not found: .gitmodules");
    }
}
