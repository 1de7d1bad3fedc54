//! Tracked endpoint records and change sets.

use std::fmt;

/// Identity of a tracked endpoint. Only key presence drives add/remove.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey {
    pub address: String,
    pub port: Option<u16>,
}

/// A single backend address with the metadata of its slice member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEndpoint {
    pub address: String,
    pub port: Option<u16>,
    /// Name of the backing pod, if the slice reports one.
    pub pod: Option<String>,
    /// Node hosting the backing pod.
    pub node: Option<String>,
    pub ready: bool,
}

impl TrackedEndpoint {
    pub fn key(&self) -> EndpointKey {
        EndpointKey {
            address: self.address.clone(),
            port: self.port,
        }
    }

    pub fn pod_or_unknown(&self) -> &str {
        self.pod.as_deref().unwrap_or("unknown")
    }

    pub fn node_or_unknown(&self) -> &str {
        self.node.as_deref().unwrap_or("unknown")
    }
}

impl fmt::Display for TrackedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.address, port),
            None => f.write_str(&self.address),
        }
    }
}

/// Result of applying one snapshot to the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    /// Keys absent before and present now.
    pub added: Vec<TrackedEndpoint>,
    /// Keys present before and absent now.
    pub removed: Vec<TrackedEndpoint>,
    /// Every endpoint after the update.
    pub current: Vec<TrackedEndpoint>,
}

impl Delta {
    /// True when membership did not change.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Ready / not-ready totals at one moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointCounts {
    pub ready: usize,
    pub not_ready: usize,
}

impl EndpointCounts {
    pub fn total(&self) -> usize {
        self.ready + self.not_ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_and_without_port() {
        let mut ep = TrackedEndpoint {
            address: "10.0.0.1".into(),
            port: Some(8080),
            pod: None,
            node: None,
            ready: true,
        };
        assert_eq!(ep.to_string(), "10.0.0.1:8080");
        assert_eq!(ep.pod_or_unknown(), "unknown");

        ep.port = None;
        assert_eq!(ep.to_string(), "10.0.0.1");
    }
}
