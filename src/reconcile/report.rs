//! Reporting sink.
//!
//! Every externally visible event of the watcher goes through here as a
//! structured `tracing` event. Field names are stable; message text is not.

use crate::config::WatcherConfig;
use crate::health::{ProbeResult, ProbeTrigger};
use crate::tracker::{Delta, EndpointCounts, TrackedEndpoint};

pub fn startup_banner(config: &WatcherConfig, health_url: &str) {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        service = %config.service.name,
        namespace = %config.service.namespace,
        app_root = %config.service.app_root,
        check_interval_secs = config.health_check.interval_secs,
        http_timeout_ms = config.health_check.timeout_ms,
        api_server = %config.cluster.api_base_url(),
        "Starting endpoint watcher"
    );
    tracing::info!(url = %health_url, "Health check URL");
}

/// First snapshot: a summary plus the ready set, not a list of additions.
pub fn initial_discovery(kind: &str, current: &[TrackedEndpoint], counts: EndpointCounts) {
    tracing::info!(
        event = kind,
        total = counts.total(),
        ready = counts.ready,
        not_ready = counts.not_ready,
        "Initial endpoints discovered"
    );
    for ep in current.iter().filter(|ep| ep.ready) {
        tracing::info!(
            endpoint = %ep,
            pod = ep.pod_or_unknown(),
            node = ep.node_or_unknown(),
            "Ready endpoint"
        );
    }
}

pub fn endpoint_change(kind: &str, slice: &str, delta: &Delta, counts: EndpointCounts) {
    tracing::info!(
        event = kind,
        slice = slice,
        added = delta.added.len(),
        removed = delta.removed.len(),
        "EndpointSlice changed"
    );
    for ep in &delta.added {
        tracing::info!(
            endpoint = %ep,
            pod = ep.pod_or_unknown(),
            node = ep.node_or_unknown(),
            ready = ep.ready,
            "Endpoint added"
        );
    }
    for ep in &delta.removed {
        tracing::info!(
            endpoint = %ep,
            pod = ep.pod_or_unknown(),
            node = ep.node_or_unknown(),
            "Endpoint removed"
        );
    }
    tracing::info!(ready = counts.ready, not_ready = counts.not_ready, "Ready endpoints");
}

pub fn unchanged(kind: &str, slice: &str, counts: EndpointCounts) {
    tracing::debug!(
        event = kind,
        slice = slice,
        ready = counts.ready,
        not_ready = counts.not_ready,
        "EndpointSlice update without membership change"
    );
}

pub fn watch_error(payload: &serde_json::Value) {
    tracing::error!(payload = %payload, "Watch error event");
}

pub fn probe_outcome(trigger: ProbeTrigger, result: &ProbeResult, counts: EndpointCounts) {
    let duration_ms = result.duration.as_millis() as u64;
    if result.is_success() {
        tracing::info!(
            trigger = %trigger,
            duration_ms,
            status = result.status(),
            "HTTP health check: {}",
            result
        );
    } else {
        let reason = result.failure().map(ToString::to_string);
        tracing::warn!(
            trigger = %trigger,
            duration_ms,
            status = result.status(),
            reason = reason.as_deref(),
            ready = counts.ready,
            not_ready = counts.not_ready,
            "HTTP health check: {}",
            result
        );
    }
}
