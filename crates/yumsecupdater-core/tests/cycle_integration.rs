use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use yumsecupdater_core::*;
use yumsecupdater_exec::command::HOST_NAMESPACE_PREFIX;
use yumsecupdater_exec::{CommandExecutor, CommandResult, CommandSpec, ExecError, SerialExecutor};
use yumsecupdater_pkg::{Severity, UpdateFilter, YumManager};

const CHECK_UPDATE_OUTPUT: &str = "\
Loaded plugins: product-id, search-disabled-repos, subscription-manager

openssl.x86_64                1:1.0.2k-21.el7_9          rhel-7-server-rpms
openssl-libs.x86_64           1:1.0.2k-21.el7_9          rhel-7-server-rpms
sudo.x86_64                   1.8.23-10.el7_9.1          rhel-7-server-rpms
";

/// Emulates the host binaries behind nsenter
///
/// Every command sleeps for `latency` so overlapping callers would be
/// visible in `max_in_flight`.
struct FakeHost {
    check_status: i32,
    reboot_status: i32,
    latency: Duration,
    calls: Mutex<Vec<Vec<String>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeHost {
    fn new(check_status: i32, reboot_status: i32) -> Self {
        Self {
            check_status,
            reboot_status,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Host commands with the nsenter prefix removed, e.g. `yum check-update`
    fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|argv| match argv[0].as_str() {
                "yum" => format!("yum {}", argv[3]),
                _ => argv.join(" "),
            })
            .collect()
    }

    fn reply(&self, argv: &[String]) -> (i32, String) {
        match argv[0].as_str() {
            "yum" if argv[3] == "check-update" => {
                let stdout = if self.check_status == 100 {
                    CHECK_UPDATE_OUTPUT.to_string()
                } else {
                    String::new()
                };
                (self.check_status, stdout)
            }
            "yum" => (0, "Complete!\n".to_string()),
            "needs-restarting" => (self.reboot_status, String::new()),
            "touch" => match std::fs::write(&argv[1], "") {
                Ok(()) => (0, String::new()),
                Err(_) => (1, String::new()),
            },
            _ => (127, String::new()),
        }
    }
}

#[async_trait]
impl CommandExecutor for FakeHost {
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandResult, ExecError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        assert_eq!(&cmd.argv()[..3], HOST_NAMESPACE_PREFIX);
        let argv = cmd.argv()[3..].to_vec();
        let (status, stdout) = self.reply(&argv);
        self.calls.lock().unwrap().push(argv);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(CommandResult {
            status,
            stdout,
            stderr: String::new(),
            duration: self.latency,
        })
    }
}

struct Harness {
    host: Arc<FakeHost>,
    yum: Arc<YumManager>,
    sentinel: PathBuf,
    _dir: tempfile::TempDir,
}

fn harness(host: FakeHost) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let sentinel = dir.path().join("reboot-required");
    let host = Arc::new(host);
    let serial = SerialExecutor::new(host.clone());
    let yum = YumManager::new(Arc::new(serial))
        .with_sentinel_file(&sentinel)
        .with_pid_file(dir.path().join("yum.pid"));

    Harness {
        host,
        yum: Arc::new(yum),
        sentinel,
        _dir: dir,
    }
}

fn config(dry_run: bool) -> Arc<RunConfiguration> {
    Arc::new(RunConfiguration {
        dry_run,
        filter: UpdateFilter {
            exclude_packages: vec!["kernel*".to_string()],
            update_packages: Vec::new(),
            severities: vec![Severity::Important, Severity::Critical],
        },
    })
}

#[tokio::test]
async fn test_full_cycle_writes_sentinel() {
    let h = harness(FakeHost::new(100, 1));
    let orchestrator = UpdateOrchestrator::new(h.yum.clone(), config(false));

    let outcome = orchestrator.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::RebootRequired);
    assert_eq!(
        h.host.commands(),
        [
            "yum check-update".to_string(),
            "yum update".to_string(),
            "needs-restarting -r".to_string(),
            format!("touch {}", h.sentinel.display()),
        ]
    );
    assert!(h.sentinel.exists());

    let calls = h.host.calls.lock().unwrap();
    assert_eq!(
        calls[0],
        [
            "yum",
            "-y",
            "-q",
            "check-update",
            "--security",
            "--exclude=kernel*",
            "--sec-severity=Important",
            "--sec-severity=Critical",
        ]
    );
}

#[tokio::test]
async fn test_no_reboot_leaves_sentinel_untouched() {
    let h = harness(FakeHost::new(0, 0));
    let orchestrator = UpdateOrchestrator::new(h.yum.clone(), config(false));

    let outcome = orchestrator.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::NoUpdatesNoReboot);
    assert_eq!(h.host.commands(), ["yum check-update", "needs-restarting -r"]);
    assert!(!h.sentinel.exists());
}

#[tokio::test]
async fn test_dry_run_only_checks() {
    let h = harness(FakeHost::new(100, 1));
    let orchestrator = UpdateOrchestrator::new(h.yum.clone(), config(true));

    let outcome = orchestrator.run_cycle().await.unwrap();

    assert_eq!(
        outcome,
        CycleOutcome::DryRun {
            updates_available: true
        }
    );
    assert_eq!(h.host.commands(), ["yum check-update"]);
    assert!(!h.sentinel.exists());
}

#[tokio::test]
async fn test_unexpected_check_status_fails_cycle() {
    let h = harness(FakeHost::new(1, 0));
    let orchestrator = UpdateOrchestrator::new(h.yum.clone(), config(false));

    let err = orchestrator.run_cycle().await.unwrap_err();

    assert!(matches!(err, CoreError::CheckFailed(detail) if detail.contains("exit status 1")));
    assert_eq!(h.host.commands(), ["yum check-update"]);
}

#[tokio::test]
async fn test_metrics_sample_from_check_output() {
    let h = harness(FakeHost::new(100, 0));
    let metrics = UpdateMetrics::new("node-1").unwrap();
    let sampler = MetricsSampler::new(h.yum.clone(), config(false), metrics.clone());

    let snapshot = sampler.sample().await;

    assert_eq!(snapshot.pending_updates, 3);
    let names: Vec<&str> = snapshot.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["openssl", "openssl-libs", "sudo"]);

    let text = metrics.encode().unwrap();
    assert!(text.contains("yumsecupdater_packages_with_update_total{node=\"node-1\"} 3"));
    assert_eq!(
        text.lines()
            .filter(|l| l.starts_with("yumsecupdater_package_with_update{"))
            .count(),
        3
    );
}

#[tokio::test(start_paused = true)]
async fn test_loops_never_run_yum_concurrently() {
    let h = harness(FakeHost::new(100, 1).with_latency(Duration::from_secs(20)));
    let config = config(false);
    let orchestrator = Arc::new(
        UpdateOrchestrator::new(h.yum.clone(), config.clone())
            .with_retry_policy(RetryPolicy::new(Duration::from_secs(30), 2)),
    );
    let sampler = Arc::new(MetricsSampler::new(
        h.yum.clone(),
        config,
        UpdateMetrics::new("node-1").unwrap(),
    ));

    let update_cancel = CancellationToken::new();
    let metrics_cancel = CancellationToken::new();
    let update = tokio::spawn(run_update_loop(
        orchestrator,
        Some(sampler.clone()),
        Duration::from_secs(60),
        update_cancel.clone(),
    ));
    let metrics = tokio::spawn(run_metrics_loop(
        sampler,
        Duration::from_secs(45),
        metrics_cancel.clone(),
    ));

    tokio::time::sleep(Duration::from_secs(600)).await;
    update_cancel.cancel();
    metrics_cancel.cancel();
    update.await.unwrap();
    metrics.await.unwrap();

    assert!(h.host.commands().len() > 10);
    assert_eq!(h.host.max_in_flight.load(Ordering::SeqCst), 1);
}
