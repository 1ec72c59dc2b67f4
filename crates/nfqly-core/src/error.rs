use thiserror::Error;

/// Errors surfaced by the core layer.
///
/// The poller and executor never raise — they degrade to snapshots and
/// booleans. The one place an error escapes is setup-time validation,
/// which maps a failed first connection to [`CoreError::NotReady`] so the
/// host can retry later instead of failing hard.
#[derive(Debug, Error)]
pub enum CoreError {
    /// First connection attempt failed; the device may come up later.
    #[error("router {host}:{port} is not reachable yet")]
    NotReady { host: String, port: u16 },

    /// The blocking worker task was cancelled or panicked.
    #[error("background task failed: {0}")]
    TaskFailed(String),
}
