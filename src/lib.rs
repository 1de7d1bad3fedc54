//! Kubernetes endpoint watcher library.
//!
//! Watches the EndpointSlices of one service, keeps the current endpoint
//! set in memory, and probes the service's health endpoint both on a timer
//! and whenever endpoints are added or removed.

pub mod config;
pub mod discovery;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod reconcile;
pub mod tracker;

pub use config::WatcherConfig;
pub use discovery::{ChangeEvent, EndpointSnapshot, EndpointSource, KubeEndpointSource};
pub use health::{HealthProber, ProbeResult};
pub use lifecycle::Shutdown;
pub use tracker::{Delta, EndpointTracker, TrackedEndpoint};
