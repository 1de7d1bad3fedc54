//! Command line and environment surface.
//!
//! Every flag can also be supplied through the environment variable named
//! next to it. This is the only place the process environment is read.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::{LogFormat, WatcherConfig};

#[derive(Parser, Debug, Default)]
#[command(name = "endpoint-watcher")]
#[command(version, about = "Watch a service's endpoints and probe its health", long_about = None)]
pub struct Args {
    /// Optional TOML config file; flags and env vars override it.
    #[arg(short, long, env = "WATCHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service to watch.
    #[arg(long, env = "SERVICE_NAME")]
    pub service_name: Option<String>,

    /// Namespace of the service.
    #[arg(long, env = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Application root path of the health endpoint.
    #[arg(long, env = "APP_ROOT")]
    pub app_root: Option<String>,

    /// Periodic health check interval (seconds).
    #[arg(long, env = "CHECK_INTERVAL")]
    pub check_interval: Option<u64>,

    /// Health check timeout (milliseconds).
    #[arg(long, env = "HTTP_TIMEOUT")]
    pub http_timeout: Option<u64>,

    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Full API server URL, e.g. `http://127.0.0.1:8001` behind `kubectl proxy`.
    #[arg(long, env = "KUBE_API_SERVER")]
    pub api_server: Option<String>,

    #[arg(long, env = "KUBERNETES_SERVICE_HOST")]
    pub api_host: Option<String>,

    #[arg(long, env = "KUBERNETES_SERVICE_PORT")]
    pub api_port: Option<u16>,

    #[arg(long, env = "KUBE_TOKEN_FILE")]
    pub token_file: Option<String>,

    #[arg(long, env = "KUBE_CA_FILE")]
    pub ca_file: Option<String>,

    #[arg(long, env = "KUBE_INSECURE_SKIP_TLS_VERIFY")]
    pub insecure_skip_tls_verify: bool,

    /// Reopen the watch after this many idle seconds (0 disables).
    #[arg(long, env = "WATCH_IDLE_TIMEOUT")]
    pub watch_idle_timeout: Option<u64>,

    /// Serve Prometheus metrics on this address.
    #[arg(long, env = "METRICS_ADDRESS")]
    pub metrics_address: Option<String>,
}

impl Args {
    /// Overlay every value given on the command line or environment.
    pub fn apply(&self, config: &mut WatcherConfig) {
        if let Some(name) = &self.service_name {
            config.service.name = name.clone();
        }
        if let Some(namespace) = &self.namespace {
            config.service.namespace = namespace.clone();
        }
        if let Some(app_root) = &self.app_root {
            config.service.app_root = app_root.clone();
        }
        if let Some(interval) = self.check_interval {
            config.health_check.interval_secs = interval;
        }
        if let Some(timeout) = self.http_timeout {
            config.health_check.timeout_ms = timeout;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        if let Some(server) = &self.api_server {
            config.cluster.api_server = Some(server.clone());
        }
        if let Some(host) = &self.api_host {
            config.cluster.api_host = host.clone();
        }
        if let Some(port) = self.api_port {
            config.cluster.api_port = port;
        }
        if let Some(path) = &self.token_file {
            config.cluster.token_path = path.clone();
        }
        if let Some(path) = &self.ca_file {
            config.cluster.ca_cert_path = path.clone();
        }
        if self.insecure_skip_tls_verify {
            config.cluster.insecure_skip_tls_verify = true;
        }
        if let Some(idle) = self.watch_idle_timeout {
            config.cluster.watch_idle_timeout_secs = idle;
        }
        if let Some(address) = &self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = address.clone();
        }
    }
}
