//! Error types for yumsecupdater-pkg

use thiserror::Error;

/// Errors that can occur during package operations
#[derive(Error, Debug, Clone)]
pub enum PackageError {
    /// Command exited with an unexpected status
    #[error("{command} did not run successfully: exit status {status}")]
    CommandFailed {
        /// Command name, e.g. `yum-update`
        command: String,
        /// Exit status
        status: i32,
    },

    /// Command could not be run at all
    #[error("{command} could not be executed: {message}")]
    ExecutionError {
        /// Command name
        command: String,
        /// Launch or I/O error
        message: String,
    },

    /// Failed to parse command output
    #[error("parse error: {0}")]
    ParseError(String),

    /// Severity outside the values yum understands
    #[error("invalid severity: {0}")]
    InvalidSeverity(String),
}
