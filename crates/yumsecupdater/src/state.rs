//! Application state shared across HTTP handlers

use tokio::sync::watch;
use yumsecupdater_core::{MetricsSnapshot, UpdateMetrics};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Metric families written by the sampler, only gathered here
    pub metrics: UpdateMetrics,
    /// Latest published snapshot
    pub latest: watch::Receiver<Option<MetricsSnapshot>>,
}

impl AppState {
    pub fn new(metrics: UpdateMetrics, latest: watch::Receiver<Option<MetricsSnapshot>>) -> Self {
        Self { metrics, latest }
    }
}
