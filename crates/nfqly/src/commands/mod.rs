//! Command dispatch: bridges CLI args -> coordinator operations -> output.

pub mod config_cmd;
pub mod service;

use nfqly_core::{Action, Coordinator};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a router-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => service::status(coordinator, global).await,
        Command::Version => service::version(coordinator, global).await,
        Command::Start(args) => service::action(coordinator, Action::Start, &args, global).await,
        Command::Stop(args) => service::action(coordinator, Action::Stop, &args, global).await,
        Command::Restart(args) => {
            service::action(coordinator, Action::Restart, &args, global).await
        }
        Command::Watch(_) => service::watch(coordinator, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
