//! In-memory endpoint set with set-based diffing.

use std::collections::BTreeMap;

use crate::discovery::EndpointSnapshot;
use crate::tracker::endpoint::{Delta, EndpointCounts, EndpointKey, TrackedEndpoint};

/// Current endpoints of the watched service.
///
/// Owned by the reconciler and updated serially; performs no I/O.
#[derive(Debug, Default)]
pub struct EndpointTracker {
    endpoints: BTreeMap<EndpointKey, TrackedEndpoint>,
}

impl EndpointTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tracked set with `snapshot` and report what changed.
    ///
    /// Keys present before and after never show up in the delta, even if
    /// readiness or other fields changed.
    pub fn update(&mut self, snapshot: &EndpointSnapshot) -> Delta {
        let next = flatten(snapshot);

        let added = next
            .iter()
            .filter(|(key, _)| !self.endpoints.contains_key(key))
            .map(|(_, ep)| ep.clone())
            .collect();

        let removed = self
            .endpoints
            .iter()
            .filter(|(key, _)| !next.contains_key(key))
            .map(|(_, ep)| ep.clone())
            .collect();

        self.endpoints = next;

        Delta {
            added,
            removed,
            current: self.endpoints(),
        }
    }

    /// Every tracked endpoint, ordered by key.
    pub fn endpoints(&self) -> Vec<TrackedEndpoint> {
        self.endpoints.values().cloned().collect()
    }

    pub fn ready_count(&self) -> usize {
        self.endpoints.values().filter(|ep| ep.ready).count()
    }

    pub fn not_ready_count(&self) -> usize {
        self.endpoints.values().filter(|ep| !ep.ready).count()
    }

    pub fn counts(&self) -> EndpointCounts {
        EndpointCounts {
            ready: self.ready_count(),
            not_ready: self.not_ready_count(),
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// One entry per member × address. Later duplicates of a key win.
fn flatten(snapshot: &EndpointSnapshot) -> BTreeMap<EndpointKey, TrackedEndpoint> {
    let port = snapshot.primary_port();
    let mut map = BTreeMap::new();

    for member in &snapshot.endpoints {
        let ready = member.is_ready();
        let pod = member.target_ref.as_ref().and_then(|r| r.name.clone());

        for address in &member.addresses {
            let endpoint = TrackedEndpoint {
                address: address.clone(),
                port,
                pod: pod.clone(),
                node: member.node_name.clone(),
                ready,
            };
            map.insert(endpoint.key(), endpoint);
        }
    }

    map
}
