//! Package manager trait

use async_trait::async_trait;

use crate::error::PackageError;
use crate::types::{Detection, UpdateFilter, UpdateRecord};

#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Check whether security updates matching `filter` are available
    async fn check_updates(&self, filter: &UpdateFilter) -> Detection;

    /// Run the check and parse its output into records
    ///
    /// Any outcome other than "updates available" yields an empty list.
    async fn list_updates(&self, filter: &UpdateFilter) -> Result<Vec<UpdateRecord>, PackageError>;

    /// Install security updates matching `filter`
    async fn apply_updates(&self, filter: &UpdateFilter) -> Result<(), PackageError>;

    /// Check whether the host needs a reboot
    async fn reboot_required(&self) -> Detection;

    /// Create the sentinel file watched by the reboot daemon
    async fn create_sentinel(&self) -> Result<(), PackageError>;

    /// Whether the package manager is currently running on the host
    async fn is_running(&self) -> bool;
}
