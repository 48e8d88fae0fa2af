//! Prometheus metrics for pending security updates
//!
//! [`MetricsSampler`] is the only writer of [`UpdateMetrics`]. The HTTP
//! endpoint only gathers from the registry. A publish replaces the gauge and
//! every counter label as one step, so a scrape never sees a gauge that
//! disagrees with the label sets.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use prometheus::{
    CounterVec, Encoder, GaugeVec, Registry, TextEncoder, register_counter_vec_with_registry,
    register_gauge_vec_with_registry,
};
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::{error, info, instrument};
use yumsecupdater_pkg::{PackageManager, UpdateRecord};

use crate::config::RunConfiguration;
use crate::error::CoreError;

pub const PACKAGES_WITH_UPDATE_TOTAL: &str = "yumsecupdater_packages_with_update_total";
pub const PACKAGE_WITH_UPDATE: &str = "yumsecupdater_package_with_update";

/// Gauge and per-package counter for one node
#[derive(Clone)]
pub struct UpdateMetrics {
    node: String,
    registry: Registry,
    packages_with_update_total: GaugeVec,
    package_with_update: CounterVec,
    /// Held for a whole publish and for gathering
    publish_lock: Arc<Mutex<()>>,
}

impl UpdateMetrics {
    /// Register both metric families in a dedicated registry
    ///
    /// # Errors
    /// Returns error if registration fails
    pub fn new(node: impl Into<String>) -> Result<Self, CoreError> {
        let registry = Registry::new();

        let packages_with_update_total = register_gauge_vec_with_registry!(
            PACKAGES_WITH_UPDATE_TOTAL,
            "Total packages with security updates.",
            &["node"],
            registry
        )?;

        let package_with_update = register_counter_vec_with_registry!(
            PACKAGE_WITH_UPDATE,
            "Package with security update.",
            &["node", "name", "arch", "version", "repo"],
            registry
        )?;

        Ok(Self {
            node: node.into(),
            registry,
            packages_with_update_total,
            package_with_update,
            publish_lock: Arc::new(Mutex::new(())),
        })
    }

    #[must_use]
    pub fn node(&self) -> &str {
        &self.node
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Replace the published state with `records`
    pub fn publish(&self, records: &[UpdateRecord]) {
        let _guard = self.publish_lock.lock().unwrap_or_else(PoisonError::into_inner);

        #[allow(clippy::cast_precision_loss)]
        self.packages_with_update_total
            .with_label_values(&[self.node.as_str()])
            .set(records.len() as f64);

        // Drop labels of packages that were updated since the last sample.
        self.package_with_update.reset();
        for record in records {
            self.package_with_update
                .with_label_values(&[
                    self.node.as_str(),
                    record.name.as_str(),
                    record.arch.as_str(),
                    record.version.as_str(),
                    record.repo.as_str(),
                ])
                .inc();
        }
    }

    /// Render the registry in the Prometheus text format
    ///
    /// # Errors
    /// Returns error if encoding fails
    pub fn encode(&self) -> Result<String, CoreError> {
        let families = {
            let _guard = self.publish_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.registry.gather()
        };
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| CoreError::MetricsError(e.to_string()))
    }
}

/// State published by one sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub pending_updates: usize,
    pub records: Vec<UpdateRecord>,
    pub sampled_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    fn new(records: Vec<UpdateRecord>) -> Self {
        Self {
            pending_updates: records.len(),
            records,
            sampled_at: Utc::now(),
        }
    }
}

/// Samples pending updates into [`UpdateMetrics`]
pub struct MetricsSampler {
    package_manager: Arc<dyn PackageManager>,
    config: Arc<RunConfiguration>,
    metrics: UpdateMetrics,
    latest: watch::Sender<Option<MetricsSnapshot>>,
    /// Orders list, publish and snapshot of concurrent samples
    sampling: AsyncMutex<()>,
}

impl MetricsSampler {
    pub fn new(
        package_manager: Arc<dyn PackageManager>,
        config: Arc<RunConfiguration>,
        metrics: UpdateMetrics,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            package_manager,
            config,
            metrics,
            latest,
            sampling: AsyncMutex::new(()),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> &UpdateMetrics {
        &self.metrics
    }

    /// Receiver for the most recent snapshot, `None` until the first sample
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<MetricsSnapshot>> {
        self.latest.subscribe()
    }

    /// Query yum and republish the metrics
    ///
    /// Errors are logged and published as an empty snapshot. Concurrent
    /// calls from the update and metrics loops publish one after the other.
    #[instrument(skip(self), fields(component = "metrics", node = %self.metrics.node))]
    pub async fn sample(&self) -> MetricsSnapshot {
        let _sampling = self.sampling.lock().await;

        let records = match self.package_manager.list_updates(&self.config.filter).await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "failed to list packages with updates");
                Vec::new()
            }
        };

        self.metrics.publish(&records);
        info!(pending_updates = records.len(), "metrics updated");

        let snapshot = MetricsSnapshot::new(records);
        self.latest.send_replace(Some(snapshot.clone()));
        snapshot
    }
}
