//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → flags / environment overlay (args.rs)
//!     → validation.rs (semantic checks)
//!     → WatcherConfig (validated, immutable)
//!     → passed by reference into every component constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no component reads the environment
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::Args;
pub use loader::{load, ConfigError};
pub use schema::{
    ClusterConfig, HealthCheckConfig, LogFormat, ObservabilityConfig, ServiceConfig,
    WatcherConfig,
};
