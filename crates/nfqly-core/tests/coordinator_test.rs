// Coordinator tests against a scripted mock session factory.
//
// The mocks record every connect / run / disconnect so the tests can
// assert the session lifecycle contract: one session per operation,
// released exactly once on every branch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;

use nfqly_core::{Action, Coordinator, Firmware, ServiceConfig, ServiceStatus, VERSION_UNKNOWN};
use nfqly_ssh::{CONNECTION_ERROR_MARKER, RemoteShell, SessionFactory};

// ── Mock session plumbing ───────────────────────────────────────────

#[derive(Default)]
struct Log {
    opens: usize,
    commands: Vec<String>,
    disconnects: usize,
}

struct MockFactory {
    connect_ok: bool,
    responses: HashMap<String, (String, String)>,
    log: Arc<Mutex<Log>>,
}

impl MockFactory {
    fn new(connect_ok: bool) -> Self {
        Self {
            connect_ok,
            responses: HashMap::new(),
            log: Arc::new(Mutex::new(Log::default())),
        }
    }

    fn respond(mut self, command: &str, stdout: &str, stderr: &str) -> Self {
        self.responses
            .insert(command.to_owned(), (stdout.to_owned(), stderr.to_owned()));
        self
    }

    fn log(&self) -> Arc<Mutex<Log>> {
        Arc::clone(&self.log)
    }
}

impl SessionFactory for MockFactory {
    fn open(&self) -> Box<dyn RemoteShell + Send> {
        self.log.lock().expect("log lock").opens += 1;
        Box::new(MockShell {
            connect_ok: self.connect_ok,
            connected: false,
            responses: self.responses.clone(),
            log: Arc::clone(&self.log),
        })
    }
}

struct MockShell {
    connect_ok: bool,
    connected: bool,
    responses: HashMap<String, (String, String)>,
    log: Arc<Mutex<Log>>,
}

impl RemoteShell for MockShell {
    fn connect(&mut self) -> bool {
        self.connected = self.connect_ok;
        self.connect_ok
    }

    fn run(&mut self, command: &str, _timeout: Duration) -> (String, String) {
        // Mirrors the real client: one reconnect attempt, then fail closed.
        if !self.connected && !self.connect() {
            return (String::new(), CONNECTION_ERROR_MARKER.to_owned());
        }
        self.log.lock().expect("log lock").commands.push(command.to_owned());
        self.responses
            .get(command)
            .cloned()
            .unwrap_or_default()
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.log.lock().expect("log lock").disconnects += 1;
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

const STATUS_CMD: &str = "/opt/etc/init.d/S51nfqws2 status";
const RESTART_CMD: &str = "/opt/etc/init.d/S51nfqws2 restart";
const VERSION_CMD: &str = "opkg info nfqws2";

fn config() -> ServiceConfig {
    ServiceConfig::new("192.168.1.1", SecretString::from("pw"), Firmware::Keenetic)
}

fn coordinator(factory: MockFactory) -> (Coordinator, Arc<Mutex<Log>>) {
    let log = factory.log();
    (Coordinator::new(config(), Arc::new(factory)), log)
}

// ── Polling ─────────────────────────────────────────────────────────

#[test]
fn connect_failure_yields_connection_error_without_running_commands() {
    let (coordinator, log) = coordinator(MockFactory::new(false));

    let snapshot = coordinator.poll_blocking();

    assert_eq!(snapshot.status, ServiceStatus::ConnectionError);
    assert!(!snapshot.available);
    assert!(!snapshot.is_running);
    assert_eq!(snapshot.version, VERSION_UNKNOWN);

    let log = log.lock().expect("log lock");
    assert_eq!(log.commands.len(), 0);
    assert_eq!(log.disconnects, 1);
}

#[test]
fn successful_poll_classifies_running_and_resolves_version() {
    let factory = MockFactory::new(true)
        .respond(STATUS_CMD, "nfqws is running", "")
        .respond(VERSION_CMD, "Package: nfqws2\nVersion: 70.4-1\n", "");
    let (coordinator, log) = coordinator(factory);

    let snapshot = coordinator.poll_blocking();

    assert_eq!(snapshot.status, ServiceStatus::Running);
    assert!(snapshot.available);
    assert!(snapshot.is_running);
    assert_eq!(snapshot.version, "70.4-1");
    assert_eq!(snapshot.manufacturer, "Keenetic");
    assert_eq!(snapshot.model, "NFQWS2");

    let log = log.lock().expect("log lock");
    assert_eq!(log.commands, vec![STATUS_CMD, VERSION_CMD]);
    assert_eq!(log.disconnects, 1);
}

#[test]
fn stopped_output_classifies_as_stopped() {
    let factory = MockFactory::new(true)
        .respond(STATUS_CMD, "nfqws is stopped", "")
        .respond(VERSION_CMD, "Version: 1.0\n", "");
    let (coordinator, _log) = coordinator(factory);

    let snapshot = coordinator.poll_blocking();

    assert_eq!(snapshot.status, ServiceStatus::Stopped);
    assert!(snapshot.available);
    assert!(!snapshot.is_running);
}

#[test]
fn version_cache_is_write_once_then_sticky() {
    let factory = MockFactory::new(true)
        .respond(STATUS_CMD, "running", "")
        .respond(VERSION_CMD, "Version: 70.4-1\n", "");
    let (coordinator, log) = coordinator(factory);

    coordinator.poll_blocking();
    let second = coordinator.poll_blocking();

    assert_eq!(second.version, "70.4-1");
    let log = log.lock().expect("log lock");
    // First poll: status + version lookup. Second poll: status only.
    assert_eq!(log.commands, vec![STATUS_CMD, VERSION_CMD, STATUS_CMD]);
    // One session per poll, each released once.
    assert_eq!(log.opens, 2);
    assert_eq!(log.disconnects, 2);
}

#[test]
fn version_miss_is_tolerated_and_retried_next_poll() {
    let factory = MockFactory::new(true)
        .respond(STATUS_CMD, "running", "")
        .respond(VERSION_CMD, "Package: nfqws2\n", "");
    let (coordinator, log) = coordinator(factory);

    let first = coordinator.poll_blocking();
    assert_eq!(first.status, ServiceStatus::Running);
    assert_eq!(first.version, VERSION_UNKNOWN);

    coordinator.poll_blocking();
    let log = log.lock().expect("log lock");
    // Still unresolved, so both polls issue the version lookup.
    assert_eq!(
        log.commands,
        vec![STATUS_CMD, VERSION_CMD, STATUS_CMD, VERSION_CMD]
    );
}

#[test]
fn session_loss_mid_poll_degrades_to_error_snapshot() {
    // The status command comes back with the fail-closed marker, as if the
    // session died after connect and the in-call reconnect also failed.
    let factory =
        MockFactory::new(true).respond(STATUS_CMD, "", CONNECTION_ERROR_MARKER);
    let (coordinator, log) = coordinator(factory);

    let snapshot = coordinator.poll_blocking();

    assert_eq!(snapshot.status, ServiceStatus::Error);
    assert!(!snapshot.available);
    assert_eq!(log.lock().expect("log lock").disconnects, 1);
}

// ── Command execution ───────────────────────────────────────────────

#[test]
fn execute_succeeds_on_empty_stderr() {
    let factory = MockFactory::new(true).respond(RESTART_CMD, "restarting", "");
    let (coordinator, log) = coordinator(factory);

    assert!(coordinator.execute_blocking(Action::Restart));

    let log = log.lock().expect("log lock");
    assert_eq!(log.commands, vec![RESTART_CMD]);
    assert_eq!(log.disconnects, 1);
}

#[test]
fn execute_fails_when_stderr_carries_the_error_token() {
    let factory =
        MockFactory::new(true).respond(RESTART_CMD, "", "sh: Error: cannot restart");
    let (coordinator, log) = coordinator(factory);

    assert!(!coordinator.execute_blocking(Action::Restart));
    assert_eq!(log.lock().expect("log lock").disconnects, 1);
}

#[test]
fn execute_tolerates_benign_stderr_noise() {
    // Non-empty stderr without the token still counts as success.
    let factory =
        MockFactory::new(true).respond(RESTART_CMD, "", "warning: slow flash");
    let (coordinator, _log) = coordinator(factory);

    assert!(coordinator.execute_blocking(Action::Restart));
}

#[test]
fn execute_fails_closed_when_the_session_cannot_open() {
    let (coordinator, log) = coordinator(MockFactory::new(false));

    assert!(!coordinator.execute_blocking(Action::Start));
    assert_eq!(log.lock().expect("log lock").disconnects, 1);
}

#[test]
fn unknown_action_fails_without_opening_a_session() {
    let (coordinator, log) = coordinator(MockFactory::new(true));

    assert!(!coordinator.execute_named_blocking("reload"));

    let log = log.lock().expect("log lock");
    assert_eq!(log.opens, 0);
    assert_eq!(log.commands.len(), 0);
    assert_eq!(log.disconnects, 0);
}

// ── Async surface ───────────────────────────────────────────────────

#[tokio::test]
async fn poll_publishes_to_subscribers() {
    let factory = MockFactory::new(true)
        .respond(STATUS_CMD, "running", "")
        .respond(VERSION_CMD, "Version: 70.4-1\n", "");
    let (coordinator, _log) = coordinator(factory);

    let mut rx = coordinator.subscribe();
    assert!(rx.borrow().is_none());

    coordinator.poll().await;

    rx.changed().await.expect("sender alive");
    let published = rx.borrow().clone().expect("snapshot published");
    assert_eq!(published.status, ServiceStatus::Running);
    assert_eq!(coordinator.latest(), Some(published));
}

#[tokio::test]
async fn execute_with_refresh_polls_afterwards() {
    let factory = MockFactory::new(true)
        .respond(STATUS_CMD, "running", "")
        .respond(VERSION_CMD, "Version: 1.0\n", "")
        .respond(RESTART_CMD, "", "");
    let (coordinator, log) = coordinator(factory);

    assert!(coordinator.execute(Action::Restart, true).await);

    let log = log.lock().expect("log lock");
    assert_eq!(log.commands, vec![RESTART_CMD, STATUS_CMD, VERSION_CMD]);
    // One session for the execution, one for the follow-up poll.
    assert_eq!(log.opens, 2);
    assert_eq!(log.disconnects, 2);
}

#[tokio::test]
async fn failed_execute_skips_the_refresh() {
    let factory = MockFactory::new(true).respond(RESTART_CMD, "", "error: no init script");
    let (coordinator, log) = coordinator(factory);

    assert!(!coordinator.execute(Action::Restart, true).await);
    assert_eq!(log.lock().expect("log lock").opens, 1);
}

#[tokio::test]
async fn verify_connection_maps_failure_to_not_ready() {
    let (coordinator, log) = coordinator(MockFactory::new(false));

    let err = coordinator
        .verify_connection()
        .await
        .expect_err("unreachable router");
    assert!(err.to_string().contains("192.168.1.1"));
    assert_eq!(log.lock().expect("log lock").disconnects, 1);

    let (coordinator, _log) = self::coordinator(MockFactory::new(true));
    assert!(coordinator.verify_connection().await.is_ok());
}
