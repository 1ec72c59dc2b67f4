// ── Coordinator ──
//
// Owns the full monitoring lifecycle for one router: the periodic poll,
// manual command execution, the write-once version cache, and snapshot
// publishing to presentation consumers. Each operation opens its own
// single-use session and always releases it, whatever branch it takes.

use std::sync::{Arc, LazyLock, OnceLock};
use std::time::Duration;

use regex::Regex;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use nfqly_ssh::{
    CONNECTION_ERROR_MARKER, RemoteShell, SessionFactory, SshSessionFactory, SshSettings,
};

use crate::command::{Action, resolve_command, version_command};
use crate::config::ServiceConfig;
use crate::error::CoreError;
use crate::model::{DeviceIdentity, ServiceStatus, Snapshot, VERSION_UNKNOWN};

/// Timeout for the status command.
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for start/stop/restart and the version lookup.
const EXEC_TIMEOUT: Duration = Duration::from_secs(30);

/// Matches the `Version:` label in `opkg info` output, capturing the first
/// whitespace-delimited token (with or without a space after the colon).
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version:\s*(\S+)").unwrap_or_else(|_| unreachable!()));

/// Extract the package version from `opkg info` stdout.
pub(crate) fn parse_version(stdout: &str) -> Option<String> {
    VERSION_RE
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

// ── Coordinator ─────────────────────────────────────────────────────

/// Polls the router and executes service commands over single-use SSH
/// sessions.
///
/// Cheaply cloneable via `Arc` — clones share the version cache and the
/// snapshot channel. Neither [`poll`](Self::poll) nor
/// [`execute`](Self::execute) ever returns an error: every failure path
/// degrades to an error-status [`Snapshot`] or `false`, and the next
/// scheduled tick is the retry mechanism.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: ServiceConfig,
    identity: DeviceIdentity,
    sessions: Arc<dyn SessionFactory>,
    /// Write-once-then-sticky: once resolved the version lookup is never
    /// reissued for the lifetime of this instance.
    version: OnceLock<String>,
    snapshot_tx: watch::Sender<Option<Snapshot>>,
}

impl Coordinator {
    /// Build a coordinator over an arbitrary session source (tests inject
    /// mocks here).
    pub fn new(config: ServiceConfig, sessions: Arc<dyn SessionFactory>) -> Self {
        let identity = DeviceIdentity::derive(&config.host, config.firmware, config.legacy);
        let (snapshot_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                identity,
                sessions,
                version: OnceLock::new(),
                snapshot_tx,
            }),
        }
    }

    /// Build a coordinator backed by real SSH sessions.
    pub fn with_ssh(config: ServiceConfig) -> Self {
        let settings = SshSettings {
            host: config.host.clone(),
            port: config.ssh_port,
            username: config.username.clone(),
            password: config.password.clone(),
        };
        Self::new(config, Arc::new(SshSessionFactory::new(settings)))
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.inner.identity
    }

    /// Last resolved service version, or `"unknown"`.
    pub fn version(&self) -> String {
        self.inner
            .version
            .get()
            .cloned()
            .unwrap_or_else(|| VERSION_UNKNOWN.to_owned())
    }

    /// Subscribe to snapshot updates. The channel holds `None` until the
    /// first poll completes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Latest published snapshot, if any poll has completed.
    pub fn latest(&self) -> Option<Snapshot> {
        self.inner.snapshot_tx.borrow().clone()
    }

    // ── Polling ─────────────────────────────────────────────────────

    /// One blocking poll cycle: connect, run the status command, resolve
    /// the version if still unknown, disconnect. Never panics or errors —
    /// all failures degrade to a snapshot value.
    pub fn poll_blocking(&self) -> Snapshot {
        let mut session = self.inner.sessions.open();
        let snapshot = self.poll_session(session.as_mut());
        // Guaranteed cleanup: the one disconnect for every branch above.
        session.disconnect();
        self.publish(snapshot.clone());
        snapshot
    }

    fn poll_session(&self, session: &mut (dyn RemoteShell + Send)) -> Snapshot {
        let identity = &self.inner.identity;

        if !session.connect() {
            warn!(host = %self.inner.config.host, "failed to connect to router");
            return Snapshot::degraded(ServiceStatus::ConnectionError, identity, self.version());
        }

        let status_cmd = resolve_command(
            self.inner.config.firmware,
            self.inner.config.legacy,
            Action::Status,
        );
        let (stdout, stderr) = session.run(status_cmd, STATUS_TIMEOUT);

        // The session dropped mid-poll and could not be re-established.
        if stderr.contains(CONNECTION_ERROR_MARKER) {
            warn!(host = %self.inner.config.host, "session lost during status check");
            return Snapshot::degraded(ServiceStatus::Error, identity, self.version());
        }
        if !stderr.is_empty() {
            warn!(%stderr, "status command wrote to stderr");
        }

        let status = ServiceStatus::classify(Some(&stdout));

        if self.inner.version.get().is_none() {
            self.resolve_version(session);
        }

        Snapshot::observed(status, identity, self.version())
    }

    /// Run the package-metadata query and commit the parsed version to the
    /// cache. A miss is non-fatal: the version stays unknown and the next
    /// poll retries.
    fn resolve_version(&self, session: &mut (dyn RemoteShell + Send)) {
        let cmd = version_command(self.inner.config.firmware, self.inner.config.legacy);
        let (stdout, stderr) = session.run(&cmd, EXEC_TIMEOUT);

        match parse_version(&stdout) {
            Some(version) => {
                info!(%version, "resolved service version");
                let _ = self.inner.version.set(version);
            }
            None => {
                debug!(%stderr, "could not extract version from opkg output");
            }
        }
    }

    /// Poll off the async runtime. The blocking connect/run/disconnect
    /// sequence runs on the blocking pool; the result is published to
    /// subscribers before being returned.
    pub async fn poll(&self) -> Snapshot {
        let this = self.clone();
        match tokio::task::spawn_blocking(move || this.poll_blocking()).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(error = %err, "poll task failed");
                let snapshot = Snapshot::degraded(
                    ServiceStatus::Error,
                    &self.inner.identity,
                    self.version(),
                );
                self.publish(snapshot.clone());
                snapshot
            }
        }
    }

    fn publish(&self, snapshot: Snapshot) {
        self.inner.snapshot_tx.send_replace(Some(snapshot));
    }

    // ── Command execution ───────────────────────────────────────────

    /// Execute one service action over a fresh session, blocking.
    ///
    /// Success is inferred from stderr alone: the command failed iff
    /// stderr is non-empty and contains the case-insensitive token
    /// `"error"`. The remote exit code is never inspected — a weak signal
    /// inherited from the deployment scripts, kept as-is.
    pub fn execute_blocking(&self, action: Action) -> bool {
        let command = resolve_command(
            self.inner.config.firmware,
            self.inner.config.legacy,
            action,
        );

        let mut session = self.inner.sessions.open();
        let (_stdout, stderr) = session.run(command, EXEC_TIMEOUT);
        session.disconnect();

        if !stderr.is_empty() && stderr.to_lowercase().contains("error") {
            error!(%command, %stderr, "command execution failed");
            return false;
        }
        info!(%command, "command executed");
        true
    }

    /// Execute an action given as free-form text. An unrecognized action
    /// fails immediately without opening a session.
    pub fn execute_named_blocking(&self, action: &str) -> bool {
        match action.parse::<Action>() {
            Ok(action) => self.execute_blocking(action),
            Err(_) => {
                warn!(%action, "unknown action");
                false
            }
        }
    }

    /// Execute an action off the async runtime. With `refresh`, a
    /// successful execution is followed by an immediate re-poll so the
    /// published snapshot reflects the new service state.
    pub async fn execute(&self, action: Action, refresh: bool) -> bool {
        let this = self.clone();
        let ok = tokio::task::spawn_blocking(move || this.execute_blocking(action))
            .await
            .unwrap_or_else(|err| {
                error!(error = %err, "execute task failed");
                false
            });
        if ok && refresh {
            self.poll().await;
        }
        ok
    }

    // ── Setup validation ────────────────────────────────────────────

    /// One connect/disconnect round-trip used at setup time. The single
    /// place a failure surfaces as an error — mapped to
    /// [`CoreError::NotReady`] so the caller can retry later.
    pub async fn verify_connection(&self) -> Result<(), CoreError> {
        let this = self.clone();
        let ok = tokio::task::spawn_blocking(move || {
            let mut session = this.inner.sessions.open();
            let ok = session.connect();
            session.disconnect();
            ok
        })
        .await
        .map_err(|err| CoreError::TaskFailed(err.to_string()))?;

        if ok {
            Ok(())
        } else {
            Err(CoreError::NotReady {
                host: self.inner.config.host.clone(),
                port: self.inner.config.ssh_port,
            })
        }
    }

    // ── Poll loop ───────────────────────────────────────────────────

    /// Poll at the configured cadence until cancelled. Ticks are never
    /// queued: a poll that overruns the interval simply delays the next
    /// tick instead of piling up concurrent sessions against the router.
    pub async fn run(&self, cancel: CancellationToken) {
        let period = self.inner.config.effective_poll_interval();
        info!(
            host = %self.inner.config.host,
            interval_secs = period.as_secs(),
            "starting poll loop"
        );

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("poll loop cancelled");
                    return;
                }
                _ = interval.tick() => {
                    self.poll().await;
                }
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
