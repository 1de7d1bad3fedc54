//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the watcher.
//! All types derive Serde traits for deserialization from config files.

use std::net::Ipv6Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default location of the in-cluster service account token.
pub const DEFAULT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Default location of the in-cluster CA bundle.
pub const DEFAULT_CA_CERT_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Root configuration for the endpoint watcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// The service being watched and probed.
    pub service: ServiceConfig,

    /// Health probe cadence and budget.
    pub health_check: HealthCheckConfig,

    /// How to reach the orchestration API.
    pub cluster: ClusterConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Identity of the watched service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name (also the `kubernetes.io/service-name` label value).
    pub name: String,

    /// Namespace the service lives in.
    pub namespace: String,

    /// Application root path prefixed to the health sub-path.
    pub app_root: String,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Periodic probe interval in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            timeout_ms: 5000,
        }
    }
}

/// Orchestration API connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Full API base URL. Overrides `api_host`/`api_port` when set.
    pub api_server: Option<String>,

    /// API host used to build `https://host:port` when no override is set.
    pub api_host: String,

    /// API port used to build `https://host:port` when no override is set.
    pub api_port: u16,

    /// Bearer token file.
    pub token_path: String,

    /// CA bundle (PEM) used to verify the API server.
    pub ca_cert_path: String,

    /// Disable certificate verification against the API server.
    pub insecure_skip_tls_verify: bool,

    /// Delay before reopening a failed watch, in seconds.
    pub reconnect_delay_secs: u64,

    /// Reopen the watch after this many seconds without a byte. 0 disables.
    pub watch_idle_timeout_secs: u64,
}

impl ClusterConfig {
    /// The API base URL the watch is issued against.
    pub fn api_base_url(&self) -> String {
        match &self.api_server {
            Some(server) => server.clone(),
            None if self.api_host.parse::<Ipv6Addr>().is_ok() => {
                format!("https://[{}]:{}", self.api_host, self.api_port)
            }
            None => format!("https://{}:{}", self.api_host, self.api_port),
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn watch_idle_timeout(&self) -> Option<Duration> {
        (self.watch_idle_timeout_secs > 0)
            .then(|| Duration::from_secs(self.watch_idle_timeout_secs))
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            api_server: None,
            api_host: "kubernetes.default.svc".to_string(),
            api_port: 443,
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            ca_cert_path: DEFAULT_CA_CERT_PATH.to_string(),
            insecure_skip_tls_verify: false,
            reconnect_delay_secs: 5,
            watch_idle_timeout_secs: 0,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
