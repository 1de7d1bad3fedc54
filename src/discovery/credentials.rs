//! Credentials and transport for the orchestration API.
//!
//! # Responsibilities
//! - Read the service account bearer token
//! - Read the cluster CA bundle
//! - Build the HTTP client used for the watch
//!
//! # Design Decisions
//! - A missing token is a warning, not an error (running outside the cluster)
//! - No overall request timeout: the watch is expected to stay open
//! - TCP keepalive so a vanished API server host surfaces as a read error

use std::fmt;
use std::fs;
use std::time::Duration;

use crate::config::ClusterConfig;
use crate::discovery::DiscoveryError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// Bearer token plus optional CA bundle.
#[derive(Clone, Default)]
pub struct ClusterCredentials {
    token: Option<String>,
    ca_pem: Option<Vec<u8>>,
}

impl ClusterCredentials {
    /// Read credentials from the configured paths.
    pub fn load(config: &ClusterConfig) -> Self {
        let token = match fs::read_to_string(&config.token_path) {
            Ok(raw) => {
                let token = raw.trim().to_string();
                (!token.is_empty()).then_some(token)
            }
            Err(e) => {
                tracing::warn!(
                    path = %config.token_path,
                    error = %e,
                    "Could not read service account token. Running outside cluster?"
                );
                None
            }
        };

        let ca_pem = match fs::read(&config.ca_cert_path) {
            Ok(pem) => Some(pem),
            Err(e) => {
                tracing::debug!(path = %config.ca_cert_path, error = %e, "No cluster CA bundle");
                None
            }
        };

        Self { token, ca_pem }
    }

    /// Credentials with an explicit token and no CA bundle.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ca_pem: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Build the client used for API requests.
    pub fn build_client(&self, config: &ClusterConfig) -> Result<reqwest::Client, DiscoveryError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .user_agent(concat!("endpoint-watcher/", env!("CARGO_PKG_VERSION")));

        if let Some(pem) = &self.ca_pem {
            let cert = reqwest::Certificate::from_pem(pem).map_err(DiscoveryError::Client)?;
            builder = builder.add_root_certificate(cert);
        }

        if config.insecure_skip_tls_verify {
            tracing::warn!("TLS verification against the API server is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build().map_err(DiscoveryError::Client)
    }
}

impl fmt::Debug for ClusterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterCredentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("ca_pem", &self.ca_pem.as_ref().map(Vec::len))
            .finish()
    }
}
