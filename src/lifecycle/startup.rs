//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the routing document (fatal on error)
//! - Start background tasks (metrics, file watcher, signals)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: no partially loaded table is ever served
//! - Listener starts last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_routing, ConfigError, RouterConfig, RoutingWatcher};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to watch routing document: {0}")]
    Watch(#[from] notify::Error),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Run the router until shutdown.
pub async fn run(config: RouterConfig) -> Result<(), StartupError> {
    let routing_path = PathBuf::from(&config.routing.path);
    let table = load_routing(&routing_path)?;
    tracing::info!(
        path = %routing_path.display(),
        services = table.services().count(),
        "Routing document loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (watcher, routing_updates) = RoutingWatcher::new(&routing_path);
    let routing_tx = watcher.sender();
    // Keep the handle alive for the lifetime of the server.
    let _watch_handle = if config.routing.watch {
        Some(watcher.run()?)
    } else {
        None
    };

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone(), routing_path, routing_tx);

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, table);
    server
        .run(listener, routing_updates, server_shutdown)
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
