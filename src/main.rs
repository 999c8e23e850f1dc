//! Experiment Router (v1)
//!
//! Resolves the experiment treatment for a client of a service and returns
//! the rendered destination. Built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                     XP ROUTER                        │
//!                  │                                                      │
//!  GET /services/  │  ┌─────────┐    ┌──────────────┐    ┌────────────┐   │
//!  {svc}?client-id─┼─▶│  http   │───▶│   resolver   │───▶│  renderer  │   │
//!                  │  │ server  │    │ client→cohort│    │  minijinja │   │
//!                  │  └─────────┘    │ →treatment   │    └─────┬──────┘   │
//!                  │       ▲         └──────▲───────┘          │          │
//!  JSON target ◀───┼───────┴────────────────┼──────────────────┘          │
//!                  │                  ┌─────┴──────┐                      │
//!                  │  routing doc ───▶│ RoutingStore│◀── watcher / SIGHUP │
//!                  │  (YAML)          │  (ArcSwap)  │                      │
//!                  │                  └────────────┘                      │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use xp_router::config::{load_config, RouterConfig};
use xp_router::lifecycle::startup;
use xp_router::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "xp-router")]
#[command(about = "Experiment treatment router", long_about = None)]
struct Cli {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(short, long, env = "XPRTR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    init_logging(&config.observability);

    tracing::info!("xp-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routing_path = %config.routing.path,
        watch = config.routing.watch,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::run(config).await?;
    Ok(())
}
