//! Event consumption loop.
//!
//! # Responsibilities
//! - Apply each ChangeEvent to the tracker, in receipt order
//! - Report the first snapshot as initial discovery
//! - Probe once per event that adds or removes endpoints
//! - Publish endpoint totals for the periodic monitor
//!
//! # Design Decisions
//! - The tracker is owned here and never shared
//! - ADDED / MODIFIED / DELETED are treated alike; only the diff matters
//! - Error events are logged and never reach the tracker

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tokio::sync::watch;

use crate::discovery::ChangeEvent;
use crate::health::{ProbeGate, ProbeResult, ProbeTrigger};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::reconcile::report;
use crate::tracker::{Delta, EndpointCounts, EndpointTracker};

/// What handling one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// Error event; tracker untouched.
    Ignored,
    /// First snapshot seen by this process.
    InitialDiscovery {
        counts: EndpointCounts,
        probe: ProbeResult,
    },
    /// Endpoints were added or removed.
    Changed { delta: Delta, probe: ProbeResult },
    /// Snapshot applied without membership change.
    Unchanged { counts: EndpointCounts },
}

/// Owns the tracker and drives change-triggered probes.
pub struct Reconciler {
    tracker: EndpointTracker,
    gate: Arc<ProbeGate>,
    counts: watch::Sender<EndpointCounts>,
    discovered: bool,
}

impl Reconciler {
    pub fn new(gate: Arc<ProbeGate>, counts: watch::Sender<EndpointCounts>) -> Self {
        Self {
            tracker: EndpointTracker::new(),
            gate,
            counts,
            discovered: false,
        }
    }

    pub fn tracker(&self) -> &EndpointTracker {
        &self.tracker
    }

    /// Consume events until the stream ends or shutdown fires.
    pub async fn run<S>(mut self, events: S, mut shutdown: ShutdownSignal) -> EndpointTracker
    where
        S: Stream<Item = ChangeEvent>,
    {
        let mut events = std::pin::pin!(events);

        loop {
            tokio::select! {
                event = events.next() => match event {
                    Some(event) => {
                        self.handle(event).await;
                    }
                    None => {
                        tracing::warn!("Endpoint event stream ended");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Reconciler received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        self.tracker
    }

    /// Apply one event.
    pub async fn handle(&mut self, event: ChangeEvent) -> Reconciled {
        let kind = event.kind();
        let snapshot = match &event {
            ChangeEvent::Error(payload) => {
                report::watch_error(payload);
                return Reconciled::Ignored;
            }
            ChangeEvent::Added(s) | ChangeEvent::Modified(s) | ChangeEvent::Deleted(s) => s,
        };

        let delta = self.tracker.update(snapshot);
        let counts = self.tracker.counts();
        self.counts.send_replace(counts);
        metrics::record_endpoints(counts);

        if !self.discovered {
            self.discovered = true;
            report::initial_discovery(kind, &delta.current, counts);
            let probe = self.gate.probe(ProbeTrigger::Initial).await;
            return Reconciled::InitialDiscovery { counts, probe };
        }

        if delta.is_empty() {
            report::unchanged(kind, snapshot.name(), counts);
            return Reconciled::Unchanged { counts };
        }

        report::endpoint_change(kind, snapshot.name(), &delta, counts);
        let probe = self.gate.probe(ProbeTrigger::EndpointChange).await;
        Reconciled::Changed { delta, probe }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::types::{EndpointConditions, EndpointMember, EndpointPort};
    use crate::discovery::EndpointSnapshot;
    use crate::health::HealthProber;
    use crate::lifecycle::Shutdown;
    use std::time::Duration;

    fn snapshot(members: &[(&str, bool)]) -> EndpointSnapshot {
        EndpointSnapshot {
            endpoints: members
                .iter()
                .map(|(addr, ready)| EndpointMember {
                    addresses: vec![addr.to_string()],
                    conditions: Some(EndpointConditions { ready: Some(*ready) }),
                    ..Default::default()
                })
                .collect(),
            ports: vec![EndpointPort {
                port: Some(8080),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    /// Reconciler whose probes hit a closed port and fail fast.
    async fn reconciler() -> (Reconciler, watch::Receiver<EndpointCounts>) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober =
            HealthProber::new(&format!("http://{}/health", addr), Duration::from_secs(1)).unwrap();
        let (tx, rx) = watch::channel(EndpointCounts::default());
        let gate = Arc::new(ProbeGate::new(prober, rx.clone()));
        (Reconciler::new(gate, tx), rx)
    }

    #[tokio::test]
    async fn test_first_event_is_initial_discovery() {
        let (mut reconciler, counts) = reconciler().await;

        let outcome = reconciler
            .handle(ChangeEvent::Added(snapshot(&[("10.0.0.1", true), ("10.0.0.2", false)])))
            .await;

        match outcome {
            Reconciled::InitialDiscovery { counts, probe } => {
                assert_eq!(counts, EndpointCounts { ready: 1, not_ready: 1 });
                assert!(!probe.is_success());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(*counts.borrow(), EndpointCounts { ready: 1, not_ready: 1 });
    }

    #[tokio::test]
    async fn test_first_event_of_any_type_is_initial_discovery() {
        let (mut reconciler, _) = reconciler().await;
        let outcome = reconciler
            .handle(ChangeEvent::Modified(snapshot(&[("10.0.0.1", true)])))
            .await;
        assert!(matches!(outcome, Reconciled::InitialDiscovery { .. }));
    }

    #[tokio::test]
    async fn test_error_event_does_not_consume_discovery() {
        let (mut reconciler, _) = reconciler().await;

        let outcome = reconciler
            .handle(ChangeEvent::Error(serde_json::json!({"code": 410})))
            .await;
        assert_eq!(outcome, Reconciled::Ignored);
        assert!(reconciler.tracker().is_empty());

        let outcome = reconciler
            .handle(ChangeEvent::Added(snapshot(&[("10.0.0.1", true)])))
            .await;
        assert!(matches!(outcome, Reconciled::InitialDiscovery { .. }));
    }

    #[tokio::test]
    async fn test_change_and_unchanged() {
        let (mut reconciler, counts) = reconciler().await;
        reconciler
            .handle(ChangeEvent::Added(snapshot(&[("10.0.0.1", true)])))
            .await;

        let outcome = reconciler
            .handle(ChangeEvent::Modified(snapshot(&[("10.0.0.1", true)])))
            .await;
        assert_eq!(
            outcome,
            Reconciled::Unchanged {
                counts: EndpointCounts { ready: 1, not_ready: 0 }
            }
        );

        let outcome = reconciler
            .handle(ChangeEvent::Modified(snapshot(&[("10.0.0.2", false)])))
            .await;
        match outcome {
            Reconciled::Changed { delta, probe } => {
                assert_eq!(delta.added[0].address, "10.0.0.2");
                assert_eq!(delta.removed[0].address, "10.0.0.1");
                assert!(probe.failure().is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(*counts.borrow(), EndpointCounts { ready: 0, not_ready: 1 });
    }

    #[tokio::test]
    async fn test_deleted_flows_through_tracker() {
        let (mut reconciler, _) = reconciler().await;
        reconciler
            .handle(ChangeEvent::Added(snapshot(&[("10.0.0.1", true), ("10.0.0.2", true)])))
            .await;

        let outcome = reconciler
            .handle(ChangeEvent::Deleted(snapshot(&[("10.0.0.1", true)])))
            .await;
        match outcome {
            Reconciled::Changed { delta, .. } => {
                assert!(delta.added.is_empty());
                assert_eq!(delta.removed.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (reconciler, _) = reconciler().await;
        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();

        let events = futures_util::stream::pending::<ChangeEvent>();
        let handle = tokio::spawn(reconciler.run(events, signal));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();

        let tracker = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reconciler did not stop")
            .unwrap();
        assert!(tracker.is_empty());
    }
}
