//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Routing document (YAML)
//!     → document.rs (typed schema)
//!     → table.rs (validate, build client/cohort/treatment maps)
//!     → store.rs (atomic publication)
//!
//! Incoming Request (service, client id, query)
//!     → resolver.rs (client → cohort → treatment → route)
//!     → render.rs (expand target pattern)
//!     → Return: destination string or NotFound
//! ```
//!
//! # Design Decisions
//! - Tables built once, immutable at runtime
//! - Reload swaps the whole table, never edits it in place
//! - Unassigned clients get the service's `default` route
//! - Unknown services are an explicit NotFound

pub mod document;
pub mod ids;
pub mod render;
pub mod resolver;
pub mod store;
pub mod table;

pub use document::{CohortSpec, ExperimentSpec, ServiceDocument, TreatmentRoute, TreatmentSpec};
pub use ids::{ClientId, CohortName, ServiceName, TreatmentName, DEFAULT_TREATMENT};
pub use render::{RenderError, RouteRenderer};
pub use resolver::{ConsistencyError, Resolution, ResolveError};
pub use store::RoutingStore;
pub use table::{RoutingIssue, RoutingTable};
