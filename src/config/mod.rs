//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!
//! routing document (YAML)
//!     → loader.rs → routing::RoutingTable (validated, immutable)
//!
//! On change (watcher.rs) or SIGHUP:
//!     loader.rs loads a new table
//!     → sent to the server task
//!     → atomic swap in routing::RoutingStore
//! ```
//!
//! # Design Decisions
//! - Settings and tables are immutable once loaded; changes require full reload
//! - All settings have defaults to allow minimal configs
//! - A failed reload keeps the current table

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_routing, ConfigError};
pub use schema::{ListenerConfig, LogFormat, ObservabilityConfig, RouterConfig, RoutingSourceConfig, TimeoutConfig};
pub use watcher::RoutingWatcher;
