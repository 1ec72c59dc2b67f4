use thiserror::Error;

/// Failure modes of a single SSH session.
///
/// Callers above the session boundary never see these directly — the
/// [`RemoteShell`](crate::RemoteShell) contract degrades every variant to a
/// boolean or an error-marker stderr string. The taxonomy exists for logging
/// and for tests that exercise the client internals.
#[derive(Debug, Error)]
pub enum SshError {
    // ── Authentication ──────────────────────────────────────────────
    /// Password rejected for the configured user.
    #[error("SSH authentication failed for user {username}")]
    Authentication { username: String },

    // ── Transport ───────────────────────────────────────────────────
    /// TCP connect failed or timed out before the SSH layer was reached.
    #[error("TCP connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Protocol handshake or key exchange failed.
    #[error("SSH handshake failed: {0}")]
    Handshake(#[source] ssh2::Error),

    /// Socket-level failure after the session was established.
    #[error("SSH transport error: {0}")]
    Transport(#[from] ssh2::Error),

    /// The host/port pair did not parse into a socket address.
    #[error("invalid SSH address {addr}")]
    InvalidAddress { addr: String },

    // ── Command execution ───────────────────────────────────────────
    /// Opening the exec channel or reading its output failed.
    #[error("remote command failed: {0}")]
    Command(String),
}
