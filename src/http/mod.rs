//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, client id, query pairs)
//!     → routing (resolve + render against a table snapshot)
//!     → JSON destination, 400, 404 or 500
//! ```

pub mod request;
pub mod server;

pub use request::{UuidRequestId, CLIENT_ID_PARAM, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ResolvedRoute};
