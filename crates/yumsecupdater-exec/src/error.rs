//! Error types for yumsecupdater-exec

use thiserror::Error;

/// Errors that prevent a command from running to completion
///
/// A non-zero exit status is not an error at this level, it is reported
/// through [`CommandResult::status`](crate::result::CommandResult).
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Binary could not be found
    #[error("command not found: {program}")]
    NotFound {
        /// Program that was looked up
        program: String,
    },

    /// Binary exists but may not be executed
    #[error("permission denied: {program}")]
    PermissionDenied {
        /// Program that was refused
        program: String,
    },

    /// Process spawn error
    #[error("failed to spawn {program}: {reason}")]
    SpawnError {
        /// Program that failed to start
        program: String,
        /// Underlying error
        reason: String,
    },

    /// I/O error while waiting for the process
    #[error("I/O error: {0}")]
    IoError(String),
}

impl ExecError {
    /// Build a launch error from the `io::Error` returned by `spawn`
    #[must_use]
    pub fn from_spawn(program: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ExecError::NotFound {
                program: program.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => ExecError::PermissionDenied {
                program: program.to_string(),
            },
            _ => ExecError::SpawnError {
                program: program.to_string(),
                reason: err.to_string(),
            },
        }
    }

    /// Check if the process never started
    #[must_use]
    pub fn is_launch_failure(&self) -> bool {
        !matches!(self, ExecError::IoError(_))
    }
}
