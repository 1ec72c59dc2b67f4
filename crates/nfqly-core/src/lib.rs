//! Core layer between `nfqly-ssh` and UI consumers (CLI today).
//!
//! This crate owns the domain model and the monitoring logic for one
//! NFQWS deployment:
//!
//! - **[`Coordinator`]** — per-router lifecycle: blocking poll and command
//!   execution run on single-use SSH sessions (one session per operation,
//!   always released), the write-once version cache, setup-time
//!   connection validation, and a cancellable poll loop whose results are
//!   pushed to subscribers over a `watch` channel.
//!
//! - **Command table** ([`command`]) — the closed [`Action`] set resolved
//!   through a pure `(firmware, legacy, action)` lookup to literal shell
//!   commands. No user-supplied text ever reaches a command string.
//!
//! - **Domain model** ([`model`]) — [`Snapshot`] (the immutable per-poll
//!   result record), [`ServiceStatus`], and the configuration-derived
//!   [`DeviceIdentity`].
//!
//! Neither polling nor execution ever raises to the caller: every failure
//! degrades to an error-status snapshot or `false`, and the next scheduled
//! tick is the retry mechanism.

pub mod command;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Action, Firmware, package_name, resolve_command, version_command};
pub use config::{
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SSH_PORT, DEFAULT_WEB_PORT, IDLE_POLL_INTERVAL_SECS,
    POLL_INTERVAL_RANGE, ServiceConfig,
};
pub use coordinator::Coordinator;
pub use error::CoreError;
pub use model::{DeviceIdentity, ServiceStatus, Snapshot, VERSION_UNKNOWN};
