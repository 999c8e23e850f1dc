//! Experiment routing library.
//!
//! Resolves which treatment a client of a service receives and renders the
//! treatment's destination template. Also provides the offline cohort
//! generator and uploads of configuration fragments to a key-value store.

pub mod cohorts;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod upload;

pub use cohorts::{assign_cohorts, CohortAssignment, CohortStrategy};
pub use config::schema::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{ResolveError, RouteRenderer, RoutingStore, RoutingTable};
