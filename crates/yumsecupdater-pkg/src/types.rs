//! Type definitions for package management

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PackageError;

/// A package with a pending security update, one line of
/// `yum check-update` output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// Package name
    pub name: String,
    /// Package architecture
    pub arch: String,
    /// Available version, including the epoch when present
    pub version: String,
    /// Repository providing the update
    pub repo: String,
}

/// Security severity as understood by `yum --sec-severity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Moderate,
    Medium,
    Important,
    Critical,
}

impl Severity {
    /// All accepted severities
    pub const ALL: [Severity; 5] = [
        Severity::Low,
        Severity::Moderate,
        Severity::Medium,
        Severity::Important,
        Severity::Critical,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::Medium => "Medium",
            Severity::Important => "Important",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = PackageError;

    /// Case-sensitive, yum rejects `low`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|severity| severity.as_str() == s)
            .ok_or_else(|| PackageError::InvalidSeverity(s.to_string()))
    }
}

/// Package selection passed to every yum invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateFilter {
    /// Packages passed as `--exclude=<name>`
    pub exclude_packages: Vec<String>,
    /// Packages to update; empty means every eligible package
    pub update_packages: Vec<String>,
    /// Severities passed as `--sec-severity=<level>`
    pub severities: Vec<Severity>,
}

/// Interpretation of a command whose exit status doubles as a boolean
///
/// Built once where the status is read so callers never look at raw exit
/// codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Command exited 0
    NoneFound,
    /// Command exited with its documented "condition true" status
    Found,
    /// Any other status, or the command could not run
    HardFailure(String),
}

impl Detection {
    /// Interpret an exit status against the command's sentinel code
    #[must_use]
    pub fn from_status(command: &str, status: i32, found_code: i32) -> Self {
        match status {
            0 => Detection::NoneFound,
            s if s == found_code => Detection::Found,
            s => Detection::HardFailure(
                PackageError::CommandFailed {
                    command: command.to_string(),
                    status: s,
                }
                .to_string(),
            ),
        }
    }

    /// `Ok(true)` for `Found`, `Ok(false)` for `NoneFound`
    ///
    /// # Errors
    /// Returns the failure detail for `HardFailure`
    pub fn found(self) -> Result<bool, String> {
        match self {
            Detection::NoneFound => Ok(false),
            Detection::Found => Ok(true),
            Detection::HardFailure(detail) => Err(detail),
        }
    }
}
