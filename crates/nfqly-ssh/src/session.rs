// ── Single-use SSH session ──
//
// One authenticated remote shell per logical operation. The caller opens a
// session, runs one or two commands, and disconnects. No pooling, no
// multiplexing, no retry beyond the single in-call reconnect in `run`.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use ssh2::Session;
use tracing::{debug, warn};

use crate::error::SshError;

/// TCP connect timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Session-level timeout covering handshake, auth, and banner exchange.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Stderr marker returned when `run` cannot (re)establish a connection.
///
/// Contains the token `error` on purpose: the command executor classifies
/// success by the absence of that token in stderr, so a dead session must
/// fail closed.
pub const CONNECTION_ERROR_MARKER: &str = "ssh connection error";

// ── Settings ────────────────────────────────────────────────────────

/// Connection settings for one remote shell session.
#[derive(Debug, Clone)]
pub struct SshSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl SshSettings {
    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Collaborator contracts ──────────────────────────────────────────

/// One authenticated remote shell session.
///
/// Expected failure modes never surface as errors: `connect` reports them
/// as `false`, `run` as an error marker in the stderr slot. `disconnect`
/// is idempotent and safe on a never-connected handle.
pub trait RemoteShell {
    /// Establish the session. Returns `false` on auth failure, timeout,
    /// or any transport error.
    fn connect(&mut self) -> bool;

    /// Run one command with a per-command timeout, capturing trimmed
    /// stdout and stderr. Reconnects once if the session is down; if that
    /// also fails, returns empty stdout and [`CONNECTION_ERROR_MARKER`]
    /// as stderr.
    fn run(&mut self, command: &str, timeout: Duration) -> (String, String);

    fn is_connected(&self) -> bool;

    /// Tear the session down. Safe to call repeatedly.
    fn disconnect(&mut self);
}

/// Vends a fresh [`RemoteShell`] per operation.
///
/// The coordinator opens exactly one session per poll or command execution
/// and never shares it across operations; this seam is also what tests
/// mock to script remote output.
pub trait SessionFactory: Send + Sync {
    fn open(&self) -> Box<dyn RemoteShell + Send>;
}

// ── ssh2-backed implementation ──────────────────────────────────────

/// Real [`RemoteShell`] backed by `ssh2` with password authentication.
pub struct SshSession {
    settings: SshSettings,
    session: Option<Session>,
}

impl SshSession {
    pub fn new(settings: SshSettings) -> Self {
        Self {
            settings,
            session: None,
        }
    }

    fn establish(&self) -> Result<Session, SshError> {
        let addr = self.settings.addr();
        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|_| SshError::InvalidAddress { addr: addr.clone() })?
            .next()
            .ok_or_else(|| SshError::InvalidAddress { addr: addr.clone() })?;

        debug!(%addr, username = %self.settings.username, "connecting");
        let tcp = TcpStream::connect_timeout(&socket_addr, CONNECT_TIMEOUT).map_err(|source| {
            SshError::Connect {
                addr: addr.clone(),
                source,
            }
        })?;
        tcp.set_read_timeout(Some(SESSION_TIMEOUT)).ok();
        tcp.set_write_timeout(Some(SESSION_TIMEOUT)).ok();

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.set_timeout(duration_ms(SESSION_TIMEOUT));
        session.handshake().map_err(SshError::Handshake)?;

        session.userauth_password(
            &self.settings.username,
            self.settings.password.expose_secret(),
        )?;
        if !session.authenticated() {
            return Err(SshError::Authentication {
                username: self.settings.username.clone(),
            });
        }

        debug!(%addr, "session established");
        Ok(session)
    }

    fn exec(session: &Session, command: &str, timeout: Duration) -> Result<(String, String), SshError> {
        session.set_timeout(duration_ms(timeout));

        let mut channel = session.channel_session()?;
        channel.exec(command)?;

        let mut stdout = String::new();
        channel
            .read_to_string(&mut stdout)
            .map_err(|e| SshError::Command(format!("reading stdout: {e}")))?;

        let mut stderr = String::new();
        channel
            .stderr()
            .read_to_string(&mut stderr)
            .map_err(|e| SshError::Command(format!("reading stderr: {e}")))?;

        channel.wait_close().ok();
        Ok((stdout.trim().to_owned(), stderr.trim().to_owned()))
    }
}

impl RemoteShell for SshSession {
    fn connect(&mut self) -> bool {
        match self.establish() {
            Ok(session) => {
                self.session = Some(session);
                true
            }
            Err(err) => {
                warn!(host = %self.settings.host, error = %err, "connect failed");
                self.session = None;
                false
            }
        }
    }

    fn run(&mut self, command: &str, timeout: Duration) -> (String, String) {
        if self.session.is_none() && !self.connect() {
            return (String::new(), CONNECTION_ERROR_MARKER.to_owned());
        }
        let Some(session) = self.session.as_ref() else {
            return (String::new(), CONNECTION_ERROR_MARKER.to_owned());
        };

        debug!(%command, "executing");
        match Self::exec(session, command, timeout) {
            Ok(output) => output,
            Err(err) => {
                warn!(%command, error = %err, "command failed");
                (String::new(), format!("ssh command error: {err}"))
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            session.disconnect(None, "closing", None).ok();
            debug!(host = %self.settings.host, "session closed");
        }
    }
}

/// Factory that opens a fresh [`SshSession`] per operation.
#[derive(Clone)]
pub struct SshSessionFactory {
    settings: SshSettings,
}

impl SshSessionFactory {
    pub fn new(settings: SshSettings) -> Self {
        Self { settings }
    }
}

impl SessionFactory for SshSessionFactory {
    fn open(&self) -> Box<dyn RemoteShell + Send> {
        Box::new(SshSession::new(self.settings.clone()))
    }
}

fn duration_ms(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}

// ── Tests ───────────────────────────────────────────────────────────
