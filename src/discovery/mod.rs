//! Endpoint discovery subsystem.
//!
//! # Data Flow
//! ```text
//! credentials.rs (token + CA → reqwest client)
//!     → source.rs (streaming GET ?watch=true&labelSelector=...)
//!     → decode.rs (bytes → lines → ChangeEvent)
//!     → consumer pulls ChangeEvents one at a time
//!
//! On stream failure:
//!     source.rs logs, sleeps the reconnect delay, reopens from scratch
//! ```
//!
//! # Design Decisions
//! - The consumer never sees reconnects, only a pause in events
//! - Malformed records are skipped, never fatal
//! - Only construction errors surface to the caller

use thiserror::Error;

pub mod credentials;
pub mod decode;
pub mod source;
pub mod types;

pub use credentials::ClusterCredentials;
pub use source::{EndpointSource, KubeEndpointSource};
pub use types::{ChangeEvent, EndpointMember, EndpointSnapshot};

/// Errors raised while setting up or running a watch.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// API base URL could not be parsed or joined.
    #[error("invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// HTTP client could not be constructed.
    #[error("failed to build API client: {0}")]
    Client(#[source] reqwest::Error),

    /// The watch request failed before a response arrived.
    #[error("watch request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The API server answered with a non-success status.
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
}
