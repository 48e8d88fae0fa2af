//! Run configuration shared by every cycle

use yumsecupdater_pkg::{Severity, UpdateFilter};

/// Immutable settings consumed by the update and metrics cycles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    /// Only detect, never install or signal a reboot
    pub dry_run: bool,
    /// Package selection for yum
    pub filter: UpdateFilter,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            dry_run: false,
            filter: UpdateFilter {
                severities: vec![Severity::Important, Severity::Critical],
                ..UpdateFilter::default()
            },
        }
    }
}
