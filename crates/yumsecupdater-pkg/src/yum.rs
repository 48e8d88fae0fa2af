//! yum package manager (RHEL/CentOS 7)
//!
//! Every command runs in the host mount namespace through the shared
//! executor, which is expected to serialize invocations.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};
use yumsecupdater_exec::{CommandExecutor, CommandResult, CommandSpec};

use crate::error::PackageError;
use crate::parser::parse_updates_available;
use crate::traits::PackageManager;
use crate::types::{Detection, UpdateFilter, UpdateRecord};

/// `yum check-update` exit status when updates are available
pub const YUM_NEED_UPDATE_EXIT_CODE: i32 = 100;

/// `needs-restarting -r` exit status when a reboot is required
pub const REQUIRE_REBOOT_EXIT_CODE: i32 = 1;

/// Written by yum while it holds the rpm database lock
pub const DEFAULT_YUM_PID_FILE: &str = "/var/run/yum.pid";

/// Sentinel file watched by kured
pub const DEFAULT_SENTINEL_FILE: &str = "/var/run/reboot-required";

/// Action passed to yum after the common flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YumAction {
    CheckUpdate,
    Update,
}

impl YumAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            YumAction::CheckUpdate => "check-update",
            YumAction::Update => "update",
        }
    }
}

/// yum package manager implementation
pub struct YumManager {
    executor: Arc<dyn CommandExecutor>,
    pid_file: PathBuf,
    sentinel_file: PathBuf,
}

impl YumManager {
    /// Create a manager using the default pid and sentinel paths
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            pid_file: PathBuf::from(DEFAULT_YUM_PID_FILE),
            sentinel_file: PathBuf::from(DEFAULT_SENTINEL_FILE),
        }
    }

    /// Set the file whose existence means yum is running
    #[must_use]
    pub fn with_pid_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pid_file = path.into();
        self
    }

    /// Set the reboot sentinel path
    #[must_use]
    pub fn with_sentinel_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sentinel_file = path.into();
        self
    }

    /// Base yum invocation shared by every action
    fn base_command() -> CommandSpec {
        CommandSpec::new("yum").args(["-y", "-q"])
    }

    /// Build the check or update command for `filter`
    #[must_use]
    pub fn updates_command(action: YumAction, filter: &UpdateFilter) -> CommandSpec {
        Self::base_command()
            .args([action.as_str(), "--security"])
            .args(
                filter
                    .exclude_packages
                    .iter()
                    .map(|pkg| format!("--exclude={pkg}")),
            )
            .args(
                filter
                    .severities
                    .iter()
                    .map(|severity| format!("--sec-severity={severity}")),
            )
            .args(filter.update_packages.iter().cloned())
            .on_host()
    }

    #[must_use]
    pub fn reboot_required_command() -> CommandSpec {
        CommandSpec::new("needs-restarting").arg("-r").on_host()
    }

    #[must_use]
    pub fn sentinel_command(&self) -> CommandSpec {
        CommandSpec::new("touch")
            .arg(self.sentinel_file.to_string_lossy())
            .on_host()
    }

    /// Forward captured output to the log, stdout at info and stderr at warn
    fn log_output(name: &str, result: &CommandResult) {
        for line in result.stdout.lines().filter(|l| !l.trim().is_empty()) {
            info!(cmd = name, stream = "out", "{line}");
        }
        for line in result.stderr.lines().filter(|l| !l.trim().is_empty()) {
            warn!(cmd = name, stream = "err", "{line}");
        }
    }

    /// Run a command whose exit status carries a boolean
    async fn detect(&self, name: &str, cmd: &CommandSpec, found_code: i32) -> Detection {
        match self.executor.run(cmd).await {
            Ok(result) => {
                Self::log_output(name, &result);
                Detection::from_status(name, result.status, found_code)
            }
            Err(e) => Detection::HardFailure(
                PackageError::ExecutionError {
                    command: name.to_string(),
                    message: e.to_string(),
                }
                .to_string(),
            ),
        }
    }

    /// Run a command that must exit 0
    async fn run_checked(&self, name: &str, cmd: &CommandSpec) -> Result<(), PackageError> {
        let result = self
            .executor
            .run(cmd)
            .await
            .map_err(|e| PackageError::ExecutionError {
                command: name.to_string(),
                message: e.to_string(),
            })?;

        Self::log_output(name, &result);

        if !result.success() {
            return Err(PackageError::CommandFailed {
                command: name.to_string(),
                status: result.status,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PackageManager for YumManager {
    #[instrument(skip_all)]
    async fn check_updates(&self, filter: &UpdateFilter) -> Detection {
        info!("check if updates are available");

        let cmd = Self::updates_command(YumAction::CheckUpdate, filter);
        let detection = self
            .detect("yum-check-update", &cmd, YUM_NEED_UPDATE_EXIT_CODE)
            .await;

        match &detection {
            Detection::Found => info!("updates available"),
            Detection::NoneFound => info!("no updates available"),
            Detection::HardFailure(_) => {}
        }
        detection
    }

    #[instrument(skip_all, fields(component = "metrics"))]
    async fn list_updates(&self, filter: &UpdateFilter) -> Result<Vec<UpdateRecord>, PackageError> {
        info!("check if updates are available");

        let cmd = Self::updates_command(YumAction::CheckUpdate, filter);
        let result = self
            .executor
            .run(&cmd)
            .await
            .map_err(|e| PackageError::ExecutionError {
                command: "yum-check-update".to_string(),
                message: e.to_string(),
            })?;

        if result.status != YUM_NEED_UPDATE_EXIT_CODE {
            debug!(status = result.status, "no updates to report");
            return Ok(Vec::new());
        }

        info!("updates available");
        parse_updates_available(result.combined_output().as_bytes())
    }

    #[instrument(skip_all)]
    async fn apply_updates(&self, filter: &UpdateFilter) -> Result<(), PackageError> {
        info!("update security packages");

        let cmd = Self::updates_command(YumAction::Update, filter);
        self.run_checked("yum-update", &cmd).await?;

        info!("yum-update ran successfully");
        Ok(())
    }

    #[instrument(skip_all)]
    async fn reboot_required(&self) -> Detection {
        info!("check if reboot is required");

        let cmd = Self::reboot_required_command();
        let detection = self
            .detect("needs-restarting", &cmd, REQUIRE_REBOOT_EXIT_CODE)
            .await;

        match &detection {
            Detection::Found => info!("reboot required"),
            Detection::NoneFound => info!("no reboot required"),
            Detection::HardFailure(_) => {}
        }
        detection
    }

    #[instrument(skip_all, fields(path = %self.sentinel_file.display()))]
    async fn create_sentinel(&self) -> Result<(), PackageError> {
        info!("create sentinel file");

        let cmd = self.sentinel_command();
        self.run_checked("touch-sentinel", &cmd).await?;

        info!("sentinel file created successfully");
        Ok(())
    }

    async fn is_running(&self) -> bool {
        tokio::fs::try_exists(&self.pid_file).await.unwrap_or(false)
    }
}
