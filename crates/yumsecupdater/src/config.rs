//! Command-line configuration
//!
//! Flags are parsed with clap and validated into [`Settings`] before any
//! loop starts. Every validation failure is fatal.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use eyre::{WrapErr, eyre};
use yumsecupdater_core::RunConfiguration;
use yumsecupdater_pkg::{Severity, UpdateFilter};

/// Environment variable holding the node name used as metric label
pub const NODE_ID_ENV: &str = "YUMSECUPDATER_NODE_ID";

/// Apply yum security updates and flag required reboots for kured
#[derive(Debug, Parser)]
#[command(name = "yumsecupdater", version)]
pub struct Cli {
    /// Names of packages to exclude separated with a comma
    #[arg(long, default_value = "")]
    pub exclude_packages: String,

    /// Names of packages to specifically update separated with a comma, default to all
    #[arg(long, default_value = "")]
    pub update_packages: String,

    /// Security severities to include separated with a comma, allowed values: Low,Moderate,Medium,Important,Critical
    #[arg(long, default_value = "Important,Critical")]
    pub severities: String,

    /// Interval between updates
    #[arg(long, default_value = "24h")]
    pub interval: String,

    /// Enable metrics exporter
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub metrics: bool,

    /// IP Address to expose the http metrics
    #[arg(long, default_value = "0.0.0.0")]
    pub metrics_addr: String,

    /// Port to expose the http metrics
    #[arg(long, default_value_t = 9080)]
    pub metrics_port: u16,

    /// Interval between metrics checks
    #[arg(long, default_value = "1h")]
    pub metrics_interval: String,

    /// Enable dry-run mode, do not run any update
    #[arg(
        long,
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub dry_run: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Metrics endpoint settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSettings {
    pub bind: SocketAddr,
    pub interval: Duration,
}

/// Validated daemon settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub node_id: String,
    pub run: RunConfiguration,
    pub update_interval: Duration,
    /// `None` when the exporter is disabled
    pub metrics: Option<MetricsSettings>,
}

impl Settings {
    /// Validate parsed flags together with the node id from the environment
    ///
    /// # Errors
    /// Returns error on an invalid severity, duration or bind address, or a
    /// missing node id
    pub fn from_cli(cli: &Cli, node_id: Option<String>) -> eyre::Result<Self> {
        let run = RunConfiguration {
            dry_run: cli.dry_run,
            filter: UpdateFilter {
                exclude_packages: parse_comma_separated(&cli.exclude_packages),
                update_packages: parse_comma_separated(&cli.update_packages),
                severities: parse_severities(&cli.severities)?,
            },
        };

        let update_interval = parse_duration(&cli.interval)?;

        let metrics = if cli.metrics {
            let ip: IpAddr = cli
                .metrics_addr
                .parse()
                .wrap_err_with(|| format!("invalid metrics address: {}", cli.metrics_addr))?;
            Some(MetricsSettings {
                bind: SocketAddr::new(ip, cli.metrics_port),
                interval: parse_duration(&cli.metrics_interval)?,
            })
        } else {
            None
        };

        let node_id = node_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| eyre!("Environment variable {NODE_ID_ENV} not found."))?;

        Ok(Self {
            node_id,
            run,
            update_interval,
            metrics,
        })
    }
}

/// Split a comma separated flag value, empty input gives an empty list
#[must_use]
pub fn parse_comma_separated(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(str::to_string).collect()
}

/// Parse severities keeping their order
///
/// # Errors
/// Returns error on the first unknown severity
pub fn parse_severities(value: &str) -> eyre::Result<Vec<Severity>> {
    parse_comma_separated(value)
        .iter()
        .map(|s| s.parse::<Severity>().map_err(eyre::Report::from))
        .collect()
}

/// Parse a duration such as `24h`, `15m` or `1h 30m`
///
/// # Errors
/// Returns error for values without a unit or otherwise unparseable
pub fn parse_duration(value: &str) -> eyre::Result<Duration> {
    humantime::parse_duration(value).wrap_err_with(|| format!("interval invalid: {value}"))
}
