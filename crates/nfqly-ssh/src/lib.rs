//! Blocking SSH transport for nfqly.
//!
//! Wraps `ssh2` behind the [`RemoteShell`] contract the coordinator expects:
//! a session is opened for exactly one logical operation, runs one or two
//! commands with per-command timeouts, and is always torn down afterwards.
//! Expected failures (bad credentials, unreachable host, timeouts) never
//! surface as errors — `connect` reports them as `false` and `run` degrades
//! to an error marker in the stderr slot, so the layers above can stay
//! exception-free.
//!
//! [`SessionFactory`] is the seam consumers depend on: the real
//! [`SshSessionFactory`] opens a fresh `ssh2` session per operation, while
//! tests substitute scripted mocks.

pub mod error;
mod session;

pub use error::SshError;
pub use session::{
    CONNECT_TIMEOUT, CONNECTION_ERROR_MARKER, RemoteShell, SESSION_TIMEOUT, SessionFactory,
    SshSession, SshSessionFactory, SshSettings,
};
