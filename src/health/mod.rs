//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (active.rs)          Endpoint change (reconciler)
//!     → gate.try_probe()                  → gate.probe()
//!            ╲                              ╱
//!             gate.rs (one probe in flight)
//!                       → probe.rs (GET with deadline)
//!                       → ProbeResult → report + metrics
//! ```
//!
//! # Design Decisions
//! - Probes never fail past this module; every outcome is a ProbeResult
//! - Periodic ticks coalesce while busy, change-triggered probes wait
//! - The prober is stateless apart from its URL and timeout

use thiserror::Error;

pub mod active;
pub mod gate;
pub mod probe;

pub use active::HealthMonitor;
pub use gate::{ProbeGate, ProbeTrigger};
pub use probe::{HealthProber, ProbeFailure, ProbeOutcome, ProbeResult};

/// Errors constructing a prober.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("invalid health URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build health client: {0}")]
    Client(#[source] reqwest::Error),
}
