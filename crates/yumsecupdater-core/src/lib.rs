//! yumsecupdater-core: Update orchestration and reporting
//!
//! Runs the periodic security update cycle, samples pending updates into
//! Prometheus metrics and coordinates graceful shutdown. All external
//! commands go through one serializing executor shared by both loops.

pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod retry;
pub mod schedule;
pub mod shutdown;

pub use config::RunConfiguration;
pub use error::CoreError;
pub use metrics::{MetricsSampler, MetricsSnapshot, UpdateMetrics};
pub use orchestrator::{CycleOutcome, UpdateOrchestrator};
pub use retry::RetryPolicy;
pub use schedule::{run_metrics_loop, run_update_loop};
pub use shutdown::{ShutdownCoordinator, ShutdownState};
