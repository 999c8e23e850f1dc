//! Routing document watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_routing;
use crate::observability::metrics;
use crate::routing::RoutingTable;

/// A watcher that rebuilds the routing table when its document changes.
pub struct RoutingWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RoutingTable>,
}

impl RoutingWatcher {
    /// Create a new RoutingWatcher.
    ///
    /// Returns the watcher and a receiver for rebuilt tables.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RoutingTable>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Sender feeding the same channel, for reloads triggered elsewhere.
    pub fn sender(&self) -> mpsc::UnboundedSender<RoutingTable> {
        self.update_tx.clone()
    }

    /// Start watching the file. The watcher stops when the returned handle drops.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "Routing document change detected, reloading");
                        reload_into(&path, &tx);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Routing watcher started");
        Ok(watcher)
    }
}

/// Rebuild the table at `path` and send it; on failure keep the current one.
pub fn reload_into(path: &Path, tx: &mpsc::UnboundedSender<RoutingTable>) -> bool {
    match load_routing(path) {
        Ok(table) => {
            metrics::record_reload(true);
            tx.send(table).is_ok()
        }
        Err(e) => {
            metrics::record_reload(false);
            tracing::error!(error = %e, "Failed to reload routing document. Keeping current table.");
            false
        }
    }
}
