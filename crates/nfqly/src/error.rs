//! CLI error types with miette diagnostics.
//!
//! Maps core/config failures into user-facing errors with actionable help
//! text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use nfqly_config::ConfigError;
use nfqly_core::CoreError;

/// Exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONNECTION: i32 = 7;
    pub const COMMAND_FAILED: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to router at {host}:{port}")]
    #[diagnostic(
        code(nfqly::connection_failed),
        help(
            "Check that the router is reachable and SSH is enabled.\n\
             Host: {host}, port: {port}\n\
             Try: ssh -p {port} root@{host}"
        )
    )]
    ConnectionFailed { host: String, port: u16 },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No configuration found")]
    #[diagnostic(
        code(nfqly::no_config),
        help(
            "Create a profile with: nfqly config init\n\
             Or pass --host and --password (NFQLY_PASSWORD) directly.\n\
             Config path: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(nfqly::no_credentials),
        help(
            "Store one with: nfqly config set-password --profile {profile}\n\
             Or set the NFQLY_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    #[error("Unknown profile '{profile}'")]
    #[diagnostic(
        code(nfqly::unknown_profile),
        help("List configured profiles with: nfqly config show")
    )]
    UnknownProfile { profile: String },

    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(nfqly::validation))]
    Validation { field: String, reason: String },

    // ── Execution ────────────────────────────────────────────────────
    #[error("Command '{action}' failed on the router")]
    #[diagnostic(
        code(nfqly::command_failed),
        help(
            "The remote command reported an error on stderr.\n\
             Re-run with -v to see the command output in the logs."
        )
    )]
    CommandFailed { action: String },

    #[error(transparent)]
    #[diagnostic(code(nfqly::config))]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(nfqly::core))]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    #[diagnostic(code(nfqly::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Core(CoreError::NotReady { .. }) => {
                exit_code::CONNECTION
            }
            Self::CommandFailed { .. } => exit_code::COMMAND_FAILED,
            Self::NoConfig { .. }
            | Self::NoCredentials { .. }
            | Self::UnknownProfile { .. }
            | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}
