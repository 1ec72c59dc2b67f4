mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nfqly_core::{Coordinator, POLL_INTERVAL_RANGE};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands work on the local config file
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global).await,

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "nfqly", &mut std::io::stdout());
            Ok(())
        }

        // All other commands talk to the router
        cmd => {
            let mut service_config = config::build_service_config(&cli.global)?;

            // `watch --interval` forces monitoring cadence for this run.
            if let Command::Watch(ref args) = cmd {
                if let Some(interval) = args.interval {
                    if !POLL_INTERVAL_RANGE.contains(&interval) {
                        return Err(CliError::Validation {
                            field: "interval".into(),
                            reason: format!(
                                "expected {}..={} seconds, got {interval}",
                                POLL_INTERVAL_RANGE.start(),
                                POLL_INTERVAL_RANGE.end()
                            ),
                        });
                    }
                    service_config.monitoring = true;
                    service_config.poll_interval_secs = interval;
                }
            }

            let coordinator = Coordinator::with_ssh(service_config);

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &coordinator, &cli.global).await
        }
    }
}
