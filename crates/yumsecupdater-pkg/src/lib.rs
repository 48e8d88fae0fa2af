//! yumsecupdater-pkg: yum security updates
//!
//! Builds yum and needs-restarting invocations, interprets their exit
//! statuses and parses `yum check-update` output into update records.

pub mod error;
pub mod parser;
pub mod traits;
pub mod types;
pub mod yum;

pub use error::PackageError;
pub use parser::parse_updates_available;
pub use traits::PackageManager;
pub use types::{Detection, Severity, UpdateFilter, UpdateRecord};
pub use yum::YumManager;
