//! Active health checking.
//!
//! # Responsibilities
//! - Probe the service on a fixed interval for the life of the process
//! - Skip ticks that land while another probe is running

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use crate::health::gate::{ProbeGate, ProbeTrigger};
use crate::lifecycle::ShutdownSignal;

/// Longest period the ticker accepts; larger intervals are clamped to it.
const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Periodic probe driver.
pub struct HealthMonitor {
    gate: Arc<ProbeGate>,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(gate: Arc<ProbeGate>, interval: Duration) -> Self {
        Self {
            gate,
            interval: interval.min(MAX_PERIOD),
        }
    }

    /// Tick until shutdown. The first probe fires one interval after start.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            url = %self.gate.prober().url(),
            "Health monitor starting"
        );

        let now = Instant::now();
        let start = now.checked_add(self.interval).unwrap_or(now);
        let mut ticker = time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.gate.try_probe(ProbeTrigger::Periodic).await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
