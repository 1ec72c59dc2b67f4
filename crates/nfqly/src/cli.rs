//! Clap derive structures for the `nfqly` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nfqly -- monitor and control NFQWS on a router over SSH
#[derive(Debug, Parser)]
#[command(
    name = "nfqly",
    version,
    about = "Monitor and control the NFQWS DPI-bypass service on a router",
    long_about = "Talks to a Keenetic (Entware) or OpenWrt router over SSH to\n\
        check, start, stop, and restart the NFQWS service, and to watch its\n\
        status at a configurable interval.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Router profile to use
    #[arg(long, short = 'p', env = "NFQLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Router host (overrides profile)
    #[arg(long, short = 'H', env = "NFQLY_HOST", global = true)]
    pub host: Option<String>,

    /// SSH port
    #[arg(long, env = "NFQLY_SSH_PORT", global = true)]
    pub ssh_port: Option<u16>,

    /// SSH username
    #[arg(long, short = 'u', env = "NFQLY_USERNAME", global = true)]
    pub username: Option<String>,

    /// SSH password
    #[arg(long, env = "NFQLY_PASSWORD", global = true, hide_env = true)]
    pub password: Option<String>,

    /// Router firmware family
    #[arg(long, value_enum, global = true)]
    pub firmware: Option<FirmwareArg>,

    /// Use the legacy nfqws-keenetic package instead of nfqws2
    #[arg(long, global = true)]
    pub legacy: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NFQLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FirmwareArg {
    /// Keenetic with Entware init scripts
    Keenetic,
    /// OpenWrt service wrapper
    Openwrt,
}

impl From<FirmwareArg> for nfqly_core::Firmware {
    fn from(arg: FirmwareArg) -> Self {
        match arg {
            FirmwareArg::Keenetic => Self::Keenetic,
            FirmwareArg::Openwrt => Self::OpenWrt,
        }
    }
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the router once and show the service status
    Status,

    /// Show the installed NFQWS package version
    Version,

    /// Start the service
    Start(ActionArgs),

    /// Stop the service
    Stop(ActionArgs),

    /// Restart the service
    Restart(ActionArgs),

    /// Poll continuously and print snapshots as they change
    Watch(WatchArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ActionArgs {
    /// Re-poll immediately after a successful action
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in seconds (10–3600); defaults to the profile setting
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactively create a profile
    Init,
    /// Show the loaded configuration with secrets masked
    Show,
    /// Print the config file path
    Path,
    /// Store a profile's password in the system keyring
    SetPassword {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
