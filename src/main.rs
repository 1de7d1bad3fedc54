//! Kubernetes Endpoint Watcher
//!
//! Monitors EndpointSlice changes for one service and runs HTTP health
//! checks against it.
//!
//! # Architecture Overview
//!
//! ```text
//!   Kubernetes API                                     Service
//!        │ watch=true (NDJSON)                            ▲
//!        ▼                                                │ GET /<app-root>/api/p/health
//!  ┌───────────┐  ChangeEvent  ┌────────────┐  trigger ┌──────────┐
//!  │ discovery │──────────────▶│ reconciler │─────────▶│  health  │
//!  │  source   │               │ + tracker  │          │   gate   │
//!  └───────────┘               └────────────┘          └──────────┘
//!                                                           ▲
//!                                        periodic tick ─────┘
//! ```
//!
//! # Exit Codes
//! - 0: graceful shutdown
//! - 1: fatal startup or runtime error
//! - 2: invalid configuration

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use endpoint_watcher::config::{self, Args, ObservabilityConfig};
use endpoint_watcher::lifecycle::{signals, startup, Shutdown};
use endpoint_watcher::observability::{logging, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            let _ = logging::init(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(2);
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watch loop observes the trigger itself and joins the monitor
    // before returning.
    let shutdown = Arc::new(Shutdown::new());
    let signal_shutdown = Arc::clone(&shutdown);
    let signal_handle = tokio::spawn(async move {
        signals::shutdown_on_signal(&signal_shutdown).await;
    });

    let outcome = startup::run(&config, &shutdown).await;
    signal_handle.abort();

    match outcome {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, trace = ?e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
