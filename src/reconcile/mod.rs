//! Reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! ChangeEvent stream
//!     → reconciler.rs (tracker.update, in receipt order)
//!     → Delta
//!         first event      → initial discovery summary + one probe
//!         added / removed  → change report + one probe
//!         no change        → debug line only
//!     → report.rs (structured log lines)
//! ```
//!
//! # States
//! ```text
//! Starting → Watching ⇄ (reconnects inside the source, invisible here) → Shutdown
//! ```

pub mod reconciler;
pub mod report;

pub use reconciler::{Reconciled, Reconciler};
