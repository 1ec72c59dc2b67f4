//! Service command handlers: status, version, actions, watch.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use nfqly_core::{Action, Coordinator, ServiceStatus};

use crate::cli::{ActionArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// One-shot poll, rendered in the chosen format.
///
/// A connection failure becomes a CLI error with a connection exit code;
/// any other degraded state is still printed — the snapshot itself carries
/// the error status.
pub async fn status(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = coordinator.poll().await;

    if snapshot.status == ServiceStatus::ConnectionError {
        return Err(CliError::ConnectionFailed {
            host: coordinator.config().host.clone(),
            port: coordinator.config().ssh_port,
        });
    }

    let color = output::should_color(&global.color);
    output::print_output(
        &output::render_snapshot(&global.output, &snapshot, color),
        global.quiet,
    );
    Ok(())
}

/// Poll once (which resolves the version on first contact) and print it.
pub async fn version(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = coordinator.poll().await;

    if snapshot.status == ServiceStatus::ConnectionError {
        return Err(CliError::ConnectionFailed {
            host: coordinator.config().host.clone(),
            port: coordinator.config().ssh_port,
        });
    }

    output::print_output(
        &output::render_value(&global.output, "version", &snapshot.version),
        global.quiet,
    );
    Ok(())
}

/// Execute start/stop/restart, optionally re-polling on success.
pub async fn action(
    coordinator: &Coordinator,
    action: Action,
    args: &ActionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !coordinator.execute(action, args.refresh).await {
        return Err(CliError::CommandFailed {
            action: action.to_string(),
        });
    }

    if args.refresh {
        if let Some(snapshot) = coordinator.latest() {
            let color = output::should_color(&global.color);
            output::print_output(
                &output::render_snapshot(&global.output, &snapshot, color),
                global.quiet,
            );
            return Ok(());
        }
    }
    output::print_output(&format!("{action}: ok"), global.quiet);
    Ok(())
}

/// Poll at the effective interval until Ctrl-C, printing each published
/// snapshot.
pub async fn watch(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let cancel = CancellationToken::new();

    let mut rx = coordinator.subscribe();
    let loop_coordinator = coordinator.clone();
    let loop_cancel = cancel.clone();
    let poll_loop = tokio::spawn(async move { loop_coordinator.run(loop_cancel).await });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted, stopping watch");
                cancel.cancel();
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    output::print_output(
                        &output::render_snapshot(&global.output, &snapshot, color),
                        global.quiet,
                    );
                }
            }
        }
    }

    poll_loop.await.ok();
    Ok(())
}
