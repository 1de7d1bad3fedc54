//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the prober, credentials and endpoint source from config
//! - Start the periodic monitor and the reconciler
//! - Tear both down together so no timer outlives the watch loop
//!
//! # Design Decisions
//! - Fail fast: any construction error is fatal
//! - Everything after construction recovers locally and never returns an error

use std::sync::Arc;
use std::time::Duration;

use futures_util::Stream;
use thiserror::Error;
use tokio::sync::watch;

use crate::config::WatcherConfig;
use crate::discovery::{
    ChangeEvent, ClusterCredentials, DiscoveryError, EndpointSource, KubeEndpointSource,
};
use crate::health::{HealthError, HealthMonitor, HealthProber, ProbeGate};
use crate::lifecycle::Shutdown;
use crate::reconcile::{report, Reconciler};
use crate::tracker::{EndpointCounts, EndpointTracker};

/// Fatal errors raised before the watch loop starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("endpoint source setup failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("health prober setup failed: {0}")]
    Health(#[from] HealthError),
}

/// Wire every component from `config` and run until shutdown.
pub async fn run(config: &WatcherConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    let prober = HealthProber::for_service(&config.service, &config.health_check)?;
    report::startup_banner(config, prober.url().as_str());

    let credentials = ClusterCredentials::load(&config.cluster);
    let source = KubeEndpointSource::new(&config.cluster, credentials)?;

    run_source(
        &source,
        &config.service.name,
        &config.service.namespace,
        prober,
        config.health_check.interval(),
        shutdown,
    )
    .await?;

    Ok(())
}

/// Open the watch on `source` and reconcile it.
pub async fn run_source<E>(
    source: &E,
    service: &str,
    namespace: &str,
    prober: HealthProber,
    interval: Duration,
    shutdown: &Shutdown,
) -> Result<EndpointTracker, StartupError>
where
    E: EndpointSource + ?Sized,
{
    let events = source.watch(service, namespace)?;
    Ok(run_events(events, prober, interval, shutdown).await)
}

/// Run the periodic monitor and the reconciler over `events`.
///
/// Returns the final tracker once the stream ends or shutdown fires; the
/// monitor has stopped by then.
pub async fn run_events<S>(
    events: S,
    prober: HealthProber,
    interval: Duration,
    shutdown: &Shutdown,
) -> EndpointTracker
where
    S: Stream<Item = ChangeEvent>,
{
    let (counts_tx, counts_rx) = watch::channel(EndpointCounts::default());
    let gate = Arc::new(ProbeGate::new(prober, counts_rx));

    let monitor = HealthMonitor::new(gate.clone(), interval);
    let monitor_handle = tokio::spawn(monitor.run(shutdown.subscribe()));

    let reconciler = Reconciler::new(gate, counts_tx);
    let tracker = reconciler.run(events, shutdown.subscribe()).await;

    shutdown.trigger();
    if let Err(e) = monitor_handle.await {
        tracing::error!(error = %e, "Health monitor task failed");
    }

    tracker
}
