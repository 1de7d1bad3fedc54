//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required service identity is present
//! - Value ranges (interval, timeout, reconnect delay within (0, max])
//! - Addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WatcherConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::WatcherConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Upper bound for the periodic health check interval (one day).
pub const MAX_INTERVAL_SECS: u64 = 86_400;
/// Upper bound for a single health check (five minutes).
pub const MAX_TIMEOUT_MS: u64 = 300_000;
/// Upper bound for the delay between watch reconnects (one hour).
pub const MAX_RECONNECT_DELAY_SECS: u64 = 3_600;
/// Upper bound for the watch idle timeout (one day).
pub const MAX_WATCH_IDLE_SECS: u64 = 86_400;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{name} must be at most {max}")]
    TooLarge { name: &'static str, max: u64 },

    #[error("invalid API server URL '{url}': {reason}")]
    ApiServer { url: String, reason: String },

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("unknown log level '{0}'")]
    LogLevel(String),
}

/// Check a fully merged configuration.
pub fn validate_config(config: &WatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::Missing("service name (SERVICE_NAME)"));
    }
    if config.service.namespace.trim().is_empty() {
        errors.push(ValidationError::Missing("namespace (NAMESPACE)"));
    }
    if config.service.app_root.trim().is_empty() {
        errors.push(ValidationError::Missing("application root (APP_ROOT)"));
    }

    check_range(
        &mut errors,
        "health check interval",
        config.health_check.interval_secs,
        MAX_INTERVAL_SECS,
    );
    check_range(
        &mut errors,
        "health check timeout",
        config.health_check.timeout_ms,
        MAX_TIMEOUT_MS,
    );
    check_range(
        &mut errors,
        "reconnect delay",
        config.cluster.reconnect_delay_secs,
        MAX_RECONNECT_DELAY_SECS,
    );
    if config.cluster.watch_idle_timeout_secs > MAX_WATCH_IDLE_SECS {
        errors.push(ValidationError::TooLarge {
            name: "watch idle timeout",
            max: MAX_WATCH_IDLE_SECS,
        });
    }

    let api = config.cluster.api_base_url();
    if let Err(e) = url::Url::parse(&api) {
        errors.push(ValidationError::ApiServer {
            url: api,
            reason: e.to_string(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_range(errors: &mut Vec<ValidationError>, name: &'static str, value: u64, max: u64) {
    if value == 0 {
        errors.push(ValidationError::Zero(name));
    } else if value > max {
        errors.push(ValidationError::TooLarge { name, max });
    }
}
