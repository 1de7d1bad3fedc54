//! Endpoint tracking.
//!
//! # Data Flow
//! ```text
//! EndpointSnapshot
//!     → flatten members × addresses into (address, port) keys
//!     → diff keys against the previous set
//!     → Delta { added, removed, current }
//! ```
//!
//! # Design Decisions
//! - Snapshots are not incremental; each one replaces the tracked set
//! - Identity is the key only; field changes on a kept key are not deltas
//! - Single owner, no locking, no I/O

pub mod endpoint;
#[allow(clippy::module_inception)]
pub mod tracker;

pub use endpoint::{Delta, EndpointCounts, EndpointKey, TrackedEndpoint};
pub use tracker::EndpointTracker;
