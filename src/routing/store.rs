//! Active routing table holder.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::table::RoutingTable;

/// Publishes the active [`RoutingTable`].
///
/// Readers take a snapshot per request and never see a half-built table;
/// a reload replaces the whole table in one store.
#[derive(Debug)]
pub struct RoutingStore {
    table: ArcSwap<RoutingTable>,
}

impl RoutingStore {
    pub fn new(table: RoutingTable) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
        }
    }

    /// Current table, held for the duration of one request.
    pub fn snapshot(&self) -> Arc<RoutingTable> {
        self.table.load_full()
    }

    /// Install a new table, returning the one it replaced.
    pub fn replace(&self, table: RoutingTable) -> Arc<RoutingTable> {
        let previous = self.table.swap(Arc::new(table));
        tracing::info!(
            services = self.table.load().services().count(),
            previous_services = previous.services().count(),
            "Routing table replaced"
        );
        previous
    }
}

impl Default for RoutingStore {
    fn default() -> Self {
        Self::new(RoutingTable::default())
    }
}
