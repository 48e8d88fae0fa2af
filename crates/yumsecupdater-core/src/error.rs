//! Core error types for yumsecupdater-core

use thiserror::Error;

/// Errors that can occur in the update and metrics cycles
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// yum check-update failed
    #[error("check for updates failed: {0}")]
    CheckFailed(String),

    /// yum update failed
    #[error("update failed: {0}")]
    UpdateFailed(String),

    /// needs-restarting failed
    #[error("reboot check failed: {0}")]
    RebootCheckFailed(String),

    /// Sentinel file could not be created
    #[error("create sentinel failed: {0}")]
    SentinelFailed(String),

    /// yum still holds its pid file
    #[error("yum is running")]
    PackageManagerBusy,

    /// Metric registration or encoding failed
    #[error("metrics error: {0}")]
    MetricsError(String),

    /// Signal handler could not be installed
    #[error("signal handler error: {0}")]
    SignalError(String),
}

impl From<prometheus::Error> for CoreError {
    fn from(err: prometheus::Error) -> Self {
        CoreError::MetricsError(err.to_string())
    }
}
