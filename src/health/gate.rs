//! Probe serialization.
//!
//! # Responsibilities
//! - Ensure at most one probe is in flight at a time
//! - Coalesce periodic ticks that arrive while a probe runs
//! - Report each outcome before the next probe may start

use std::fmt;

use tokio::sync::{watch, Mutex};

use crate::health::probe::{HealthProber, ProbeResult};
use crate::observability::metrics;
use crate::reconcile::report;
use crate::tracker::EndpointCounts;

/// What caused a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTrigger {
    /// First snapshot received.
    Initial,
    /// Periodic timer tick.
    Periodic,
    /// Endpoints were added or removed.
    EndpointChange,
}

impl ProbeTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeTrigger::Initial => "initial",
            ProbeTrigger::Periodic => "periodic",
            ProbeTrigger::EndpointChange => "endpoint_change",
        }
    }
}

impl fmt::Display for ProbeTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-flight wrapper around a [`HealthProber`].
#[derive(Debug)]
pub struct ProbeGate {
    prober: HealthProber,
    in_flight: Mutex<()>,
    counts: watch::Receiver<EndpointCounts>,
}

impl ProbeGate {
    /// `counts` carries the latest endpoint totals for failure reports.
    pub fn new(prober: HealthProber, counts: watch::Receiver<EndpointCounts>) -> Self {
        Self {
            prober,
            in_flight: Mutex::new(()),
            counts,
        }
    }

    pub fn prober(&self) -> &HealthProber {
        &self.prober
    }

    /// Probe, waiting for any in-flight probe to finish first.
    pub async fn probe(&self, trigger: ProbeTrigger) -> ProbeResult {
        let _guard = self.in_flight.lock().await;
        self.run(trigger).await
    }

    /// Probe only if the gate is free; `None` means this call was coalesced.
    pub async fn try_probe(&self, trigger: ProbeTrigger) -> Option<ProbeResult> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            metrics::record_probe_skipped(trigger.as_str());
            tracing::debug!(trigger = %trigger, "Probe already in flight, skipping");
            return None;
        };
        Some(self.run(trigger).await)
    }

    async fn run(&self, trigger: ProbeTrigger) -> ProbeResult {
        let result = self.prober.check().await;
        let counts = *self.counts.borrow();

        metrics::record_probe(trigger.as_str(), result.is_success(), result.duration);
        report::probe_outcome(trigger, &result, counts);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Backend that answers 200 after `delay`.
    async fn slow_backend(delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    tokio::time::sleep(delay).await;
                    let _ = socket
                        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                        .await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{}/health", addr)
    }

    fn gate(url: &str) -> ProbeGate {
        let prober = HealthProber::new(url, Duration::from_secs(2)).unwrap();
        let (_tx, rx) = watch::channel(EndpointCounts::default());
        ProbeGate::new(prober, rx)
    }

    #[tokio::test]
    async fn test_try_probe_skips_while_busy() {
        let url = slow_backend(Duration::from_millis(300)).await;
        let gate = Arc::new(gate(&url));

        let busy = gate.clone();
        let first = tokio::spawn(async move { busy.probe(ProbeTrigger::EndpointChange).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(gate.try_probe(ProbeTrigger::Periodic).await.is_none());

        let result = first.await.unwrap();
        assert!(result.is_success());

        // Free again once the first probe finished.
        let result = gate.try_probe(ProbeTrigger::Periodic).await;
        assert!(result.is_some_and(|r| r.is_success()));
    }

    #[tokio::test]
    async fn test_probe_waits_for_in_flight_probe() {
        let url = slow_backend(Duration::from_millis(200)).await;
        let gate = Arc::new(gate(&url));

        let busy = gate.clone();
        let first = tokio::spawn(async move { busy.probe(ProbeTrigger::Periodic).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let started = std::time::Instant::now();
        let second = gate.probe(ProbeTrigger::EndpointChange).await;

        // Queued behind the first (~150ms left) plus its own ~200ms.
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert!(second.is_success());
        assert!(first.await.unwrap().is_success());
    }
}
