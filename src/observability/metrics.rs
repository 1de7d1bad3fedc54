//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define watcher metrics (watch events, reconnects, probes, endpoints)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `watcher_watch_events_total` (counter): events received, by type
//! - `watcher_watch_reconnects_total` (counter): watch reopen attempts
//! - `watcher_watch_decode_failures_total` (counter): skipped malformed records
//! - `watcher_probes_total` (counter): probes by trigger and outcome
//! - `watcher_probe_duration_seconds` (histogram): probe latency by trigger
//! - `watcher_probes_skipped_total` (counter): coalesced probe requests
//! - `watcher_endpoints` (gauge): tracked endpoints by readiness
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels are low-cardinality only (no addresses)

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::tracker::EndpointCounts;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_watch_event(kind: &'static str) {
    ::metrics::counter!("watcher_watch_events_total", "type" => kind).increment(1);
}

pub fn record_reconnect() {
    ::metrics::counter!("watcher_watch_reconnects_total").increment(1);
}

pub fn record_decode_failure() {
    record_decode_failures(1);
}

pub fn record_decode_failures(count: u64) {
    ::metrics::counter!("watcher_watch_decode_failures_total").increment(count);
}

pub fn record_probe(trigger: &'static str, success: bool, duration: Duration) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!("watcher_probes_total", "trigger" => trigger, "outcome" => outcome)
        .increment(1);
    ::metrics::histogram!("watcher_probe_duration_seconds", "trigger" => trigger)
        .record(duration.as_secs_f64());
}

pub fn record_probe_skipped(trigger: &'static str) {
    ::metrics::counter!("watcher_probes_skipped_total", "trigger" => trigger).increment(1);
}

pub fn record_endpoints(counts: EndpointCounts) {
    ::metrics::gauge!("watcher_endpoints", "state" => "ready").set(counts.ready as f64);
    ::metrics::gauge!("watcher_endpoints", "state" => "not_ready").set(counts.not_ready as f64);
}
