//! OS signal handling.
//!
//! # Responsibilities
//! - SIGINT/SIGTERM trigger graceful shutdown
//! - SIGHUP reloads the routing document
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A failed reload on SIGHUP keeps the current table

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::config::watcher::reload_into;
use crate::lifecycle::shutdown::Shutdown;
use crate::routing::RoutingTable;

/// Spawn the signal listener task.
pub fn spawn_signal_handler(
    shutdown: Shutdown,
    routing_path: PathBuf,
    routing_tx: mpsc::UnboundedSender<RoutingTable>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let (mut hangup, mut terminate) =
                match (signal(SignalKind::hangup()), signal(SignalKind::terminate())) {
                    (Ok(hangup), Ok(terminate)) => (hangup, terminate),
                    (Err(e), _) | (_, Err(e)) => {
                        tracing::error!(error = %e, "Failed to install signal handlers");
                        wait_for_ctrl_c(&shutdown).await;
                        return;
                    }
                };

            loop {
                tokio::select! {
                    _ = hangup.recv() => {
                        tracing::info!(path = ?routing_path, "SIGHUP received, reloading routing document");
                        reload_into(&routing_path, &routing_tx);
                    }
                    _ = terminate.recv() => {
                        tracing::info!("SIGTERM received");
                        break;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("SIGINT received");
                        break;
                    }
                }
            }
            shutdown.trigger();
        }

        #[cfg(not(unix))]
        {
            let _ = (routing_path, routing_tx);
            wait_for_ctrl_c(&shutdown).await;
        }
    })
}

async fn wait_for_ctrl_c(shutdown: &Shutdown) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("SIGINT received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
    }
    shutdown.trigger();
}
