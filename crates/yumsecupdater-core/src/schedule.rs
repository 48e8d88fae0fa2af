//! Periodic update and metrics loops

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeDelta};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::metrics::MetricsSampler;
use crate::orchestrator::UpdateOrchestrator;

/// Wait one interval, returns `false` if cancelled first
async fn next_tick(interval: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(interval) => true,
    }
}

fn next_run_at(interval: Duration) -> String {
    TimeDelta::from_std(interval)
        .ok()
        .and_then(|delta| Local::now().checked_add_signed(delta))
        .map_or_else(
            || "never".to_string(),
            |at| at.format("%Y-%m-%d %H:%M:%S").to_string(),
        )
}

/// Run an update cycle now and then once per `interval`
///
/// After every cycle the metrics are re-sampled so the published state
/// reflects what was just installed.
pub async fn run_update_loop(
    orchestrator: Arc<UpdateOrchestrator>,
    sampler: Option<Arc<MetricsSampler>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    while !cancel.is_cancelled() {
        orchestrator.run_with_retry(&cancel).await;
        if let Some(sampler) = &sampler {
            sampler.sample().await;
        }

        info!(next = %next_run_at(interval), "done, next update check");

        if !next_tick(interval, &cancel).await {
            break;
        }
    }
    info!("update loop stopped");
}

/// Sample metrics once per `interval`
///
/// The first sample is expected to be taken by the caller before the loop
/// starts.
pub async fn run_metrics_loop(
    sampler: Arc<MetricsSampler>,
    interval: Duration,
    cancel: CancellationToken,
) {
    while next_tick(interval, &cancel).await {
        sampler.sample().await;
    }
    info!(component = "metrics", "metrics loop stopped");
}
