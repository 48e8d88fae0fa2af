//! Graceful shutdown on SIGINT and SIGTERM
//!
//! Stops both loops from taking new ticks, then waits for yum to release its
//! pid file so the pod is not killed halfway through a transaction.

use std::sync::Arc;

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use yumsecupdater_pkg::PackageManager;

use crate::error::CoreError;
use crate::retry::RetryPolicy;

/// Lifecycle of the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Draining,
    Stopped,
}

/// Owns the cancellation token of each periodic loop
pub struct ShutdownCoordinator {
    update: CancellationToken,
    metrics: CancellationToken,
    package_manager: Arc<dyn PackageManager>,
    idle_wait: RetryPolicy,
    state: watch::Sender<ShutdownState>,
}

impl ShutdownCoordinator {
    pub fn new(package_manager: Arc<dyn PackageManager>) -> Self {
        let (state, _) = watch::channel(ShutdownState::Running);
        Self {
            update: CancellationToken::new(),
            metrics: CancellationToken::new(),
            package_manager,
            idle_wait: RetryPolicy::IDLE_WAIT,
            state,
        }
    }

    /// Override the idle-wait policy
    #[must_use]
    pub fn with_idle_wait(mut self, idle_wait: RetryPolicy) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    /// Token observed by the update loop
    #[must_use]
    pub fn update_token(&self) -> CancellationToken {
        self.update.clone()
    }

    /// Token observed by the metrics loop and HTTP server
    #[must_use]
    pub fn metrics_token(&self) -> CancellationToken {
        self.metrics.clone()
    }

    #[must_use]
    pub fn state(&self) -> ShutdownState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.state.subscribe()
    }

    /// Install the signal handlers and drain when one fires
    ///
    /// # Errors
    /// Returns error if a handler cannot be installed
    pub fn listen(self: &Arc<Self>) -> Result<JoinHandle<()>, CoreError> {
        let mut sigint =
            signal(SignalKind::interrupt()).map_err(|e| CoreError::SignalError(e.to_string()))?;
        let mut sigterm =
            signal(SignalKind::terminate()).map_err(|e| CoreError::SignalError(e.to_string()))?;

        let coordinator = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let name = tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            };
            coordinator.drain(name).await;
        }))
    }

    /// Cancel both loops and wait for yum to become idle
    ///
    /// Returns whether yum was confirmed idle. A timeout is logged and does
    /// not prevent exit.
    pub async fn drain(&self, signal: &str) -> bool {
        info!(signal, "graceful shutdown");
        self.state.send_replace(ShutdownState::Draining);

        self.update.cancel();
        self.metrics.cancel();

        let package_manager = &self.package_manager;
        let idle = self
            .idle_wait
            .retry(move || async move {
                if package_manager.is_running().await {
                    info!(delay = ?self.idle_wait.delay, "yum is currently running, waiting");
                    return Err(CoreError::PackageManagerBusy);
                }
                Ok(())
            })
            .await;

        match idle {
            Ok(()) => {
                info!("yum is not running");
                true
            }
            Err(e) => {
                error!(error = %e, attempts = self.idle_wait.attempts, "gave up waiting for yum");
                false
            }
        }
    }

    /// Record that every loop has exited
    pub fn mark_stopped(&self) {
        self.state.send_replace(ShutdownState::Stopped);
    }
}
