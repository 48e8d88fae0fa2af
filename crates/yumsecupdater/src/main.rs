//! yumsecupdater daemon
//!
//! Applies yum security updates on a schedule, writes the kured reboot
//! sentinel when needed and exports pending updates as Prometheus metrics.

use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use eyre::WrapErr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use yumsecupdater_core::{
    MetricsSampler, ShutdownCoordinator, UpdateMetrics, UpdateOrchestrator, run_metrics_loop,
    run_update_loop,
};
use yumsecupdater_exec::{LocalExecutor, SerialExecutor};
use yumsecupdater_pkg::{PackageManager, YumManager};

mod api;
mod config;
mod router;
mod server;
mod state;

use config::{Cli, LogFormat, NODE_ID_ENV, Settings};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    let settings = Settings::from_cli(&cli, std::env::var(NODE_ID_ENV).ok())?;
    run(settings).await
}

fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).wrap_err_with(|| format!("invalid log level: {level}"))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

async fn run(settings: Settings) -> Result<()> {
    info!(
        node = %settings.node_id,
        dry_run = settings.run.dry_run,
        interval = %humantime::format_duration(settings.update_interval),
        "starting yumsecupdater"
    );

    let executor = SerialExecutor::new(Arc::new(LocalExecutor::new()));
    let package_manager: Arc<dyn PackageManager> = Arc::new(YumManager::new(Arc::new(executor)));
    let run_config = Arc::new(settings.run);

    let coordinator = Arc::new(ShutdownCoordinator::new(package_manager.clone()));
    let signals = coordinator.listen()?;

    let mut loops = Vec::new();
    let mut server = None;

    let sampler = match settings.metrics {
        Some(metrics_settings) => {
            let metrics = UpdateMetrics::new(settings.node_id.as_str())?;
            let sampler = Arc::new(MetricsSampler::new(
                package_manager.clone(),
                run_config.clone(),
                metrics,
            ));

            let listener = TcpListener::bind(metrics_settings.bind)
                .await
                .wrap_err_with(|| format!("failed to bind metrics server on {}", metrics_settings.bind))?;
            let state = Arc::new(AppState::new(sampler.metrics().clone(), sampler.subscribe()));
            server = Some(tokio::spawn(server::serve(
                listener,
                state,
                coordinator.metrics_token(),
            )));

            sampler.sample().await;
            loops.push(tokio::spawn(run_metrics_loop(
                sampler.clone(),
                metrics_settings.interval,
                coordinator.metrics_token(),
            )));
            Some(sampler)
        }
        None => None,
    };

    let orchestrator = Arc::new(UpdateOrchestrator::new(package_manager, run_config));
    loops.push(tokio::spawn(run_update_loop(
        orchestrator,
        sampler,
        settings.update_interval,
        coordinator.update_token(),
    )));

    for handle in loops {
        handle.await.wrap_err("periodic loop panicked")?;
    }
    if let Some(server) = server {
        server.await.wrap_err("metrics server panicked")?;
    }
    signals.await.wrap_err("signal handler panicked")?;

    coordinator.mark_stopped();
    info!("exit");
    Ok(())
}
