//! # Watch Loop
//!
//! Controller watch loop that monitors `ClusterDeployment` resources in all
//! namespaces and triggers a provisioning pass when they change.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::ClusterDeployment;
use crate::runtime::error_policy::{handle_reconciliation_error, log_watch_stream_error};
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::controller::{self, Controller};
use kube_runtime::watcher;
use std::future::Future;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Completes on the first SIGINT or SIGTERM
///
/// The SIGTERM handler is installed before this returns.
///
/// # Errors
/// Returns an error if the signal handler cannot be registered
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()> + Send + 'static> {
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
            _ = terminate.recv() => info!("Received SIGTERM"),
        }
    })
}

/// Mark the server not ready and request shutdown once `signal` completes
///
/// The returned receiver flips to `true` at the same time readiness drops.
pub fn spawn_shutdown_listener<F>(signal: F, server_state: Arc<ServerState>) -> watch::Receiver<bool>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        signal.await;
        info!("Shutdown requested, waiting for in-flight reconciliations to complete...");
        server_state.set_ready(false);
        let _ = shutdown_tx.send(true);
    });
    shutdown_rx
}

/// Run the controller until a shutdown signal arrives
///
/// Restarts the controller stream if it ends for any other reason.
pub async fn run_watch_loop(
    deployments: Api<ClusterDeployment>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    config: &ControllerConfig,
) -> Result<(), anyhow::Error> {
    let mut shutdown = spawn_shutdown_listener(shutdown_signal()?, server_state);

    loop {
        if *shutdown.borrow() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        info!(
            "Starting controller watch loop (max {} concurrent reconciliations)...",
            config.max_concurrent_reconciliations
        );
        Controller::new(deployments.clone(), watcher::Config::default().any_semantic())
            .with_config(
                controller::Config::default().concurrency(config.max_concurrent_reconciliations),
            )
            .shutdown_on_signal()
            .run(
                reconcile,
                handle_reconciliation_error,
                Arc::clone(&reconciler),
            )
            .for_each(|result| async move {
                match result {
                    Ok((object, action)) => {
                        debug!(action = ?action, "watch.event.reconciled {}", object);
                    }
                    Err(controller::Error::ReconcilerFailed(e, object)) => {
                        debug!(error = %e, "watch.event.reconciliation_failed {}", object);
                    }
                    Err(controller::Error::QueueError(e)) => {
                        log_watch_stream_error(&e.to_string());
                    }
                    Err(e) => {
                        warn!("Controller error: {}", e);
                    }
                }
            })
            .await;

        // The controller stops on the same signal; the listener may not have run yet
        if *shutdown.borrow() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            config.watch_restart_delay_secs
        );
        tokio::select! {
            () = tokio::time::sleep(config.watch_restart_delay()) => {}
            _ = shutdown.wait_for(|requested| *requested) => {
                info!("Shutdown requested, exiting watch loop");
                break;
            }
        }
    }

    info!("Controller stopped gracefully");
    Ok(())
}
