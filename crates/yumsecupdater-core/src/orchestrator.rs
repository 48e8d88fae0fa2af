//! `UpdateOrchestrator`: one security update cycle
//!
//! check-update, update (unless dry-run), needs-restarting, then the reboot
//! sentinel. Any step failing aborts the rest of the cycle.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};
use yumsecupdater_pkg::PackageManager;

use crate::config::RunConfiguration;
use crate::error::CoreError;
use crate::retry::RetryPolicy;

/// Result of one update cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing to install and no reboot pending
    NoUpdatesNoReboot,
    /// Updates installed, no reboot needed
    UpdatesApplied,
    /// Reboot required, sentinel file written
    RebootRequired,
    /// Dry-run: stopped after the check step
    DryRun { updates_available: bool },
    /// Retries exhausted or cancelled
    Failed(CoreError),
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::NoUpdatesNoReboot => write!(f, "no updates, no reboot"),
            CycleOutcome::UpdatesApplied => write!(f, "updates applied"),
            CycleOutcome::RebootRequired => write!(f, "reboot required"),
            CycleOutcome::DryRun { updates_available } => {
                write!(f, "dry-run, updates available: {updates_available}")
            }
            CycleOutcome::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// Drives the update cycle against a package manager
pub struct UpdateOrchestrator {
    package_manager: Arc<dyn PackageManager>,
    config: Arc<RunConfiguration>,
    retry: RetryPolicy,
}

impl UpdateOrchestrator {
    /// Create an orchestrator using the cycle retry policy
    pub fn new(package_manager: Arc<dyn PackageManager>, config: Arc<RunConfiguration>) -> Self {
        Self {
            package_manager,
            config,
            retry: RetryPolicy::CYCLE_RETRY,
        }
    }

    /// Override the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run a single cycle without retrying
    ///
    /// # Errors
    /// Returns the first step that failed
    #[instrument(skip(self), fields(dry_run = self.config.dry_run))]
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CoreError> {
        let filter = &self.config.filter;

        let updates_available = self
            .package_manager
            .check_updates(filter)
            .await
            .found()
            .map_err(CoreError::CheckFailed)?;

        if self.config.dry_run {
            info!("dry-run mode enabled, do not update");
            return Ok(CycleOutcome::DryRun { updates_available });
        }

        if updates_available {
            self.package_manager
                .apply_updates(filter)
                .await
                .map_err(|e| CoreError::UpdateFailed(e.to_string()))?;
        }

        // A reboot may be pending from an earlier run even without updates.
        let reboot_required = self
            .package_manager
            .reboot_required()
            .await
            .found()
            .map_err(CoreError::RebootCheckFailed)?;

        if !reboot_required {
            return Ok(if updates_available {
                CycleOutcome::UpdatesApplied
            } else {
                CycleOutcome::NoUpdatesNoReboot
            });
        }

        self.package_manager
            .create_sentinel()
            .await
            .map_err(|e| CoreError::SentinelFailed(e.to_string()))?;

        Ok(CycleOutcome::RebootRequired)
    }

    /// Run the cycle under the retry policy
    ///
    /// Never fails: exhaustion is logged and reported as
    /// [`CycleOutcome::Failed`]. `cancel` cuts the pause between attempts
    /// short: a shutdown drops the remaining retries of the current cycle and
    /// reports the last failure. An attempt already running always finishes.
    pub async fn run_with_retry(&self, cancel: &CancellationToken) -> CycleOutcome {
        match self
            .retry
            .retry_until_cancelled(cancel, move || self.run_cycle())
            .await
        {
            Ok(outcome) => {
                info!(outcome = %outcome, "update cycle finished");
                outcome
            }
            Err(e) => {
                error!(error = %e, "update cycle failed");
                CycleOutcome::Failed(e)
            }
        }
    }
}
