//! Single bounded-time HTTP health probe.
//!
//! # Responsibilities
//! - Build the service health URL once
//! - Issue one GET per check with a hard deadline
//! - Classify the outcome without ever returning an error
//!
//! # Design Decisions
//! - Any 2xx is healthy; other statuses are failures that keep their code
//! - The deadline drops the in-flight request; a result is still produced
//! - Elapsed time is always measured, whatever the outcome

use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::time;
use url::Url;

use crate::config::{HealthCheckConfig, ServiceConfig};
use crate::health::HealthError;

/// Fixed health sub-path under the application root.
pub const HEALTH_SUBPATH: &str = "api/p/health";

const USER_AGENT: &str = "endpoint-watcher-health-check";

/// Cluster-internal health URL of a service:
/// `http://<service>.<namespace>.svc.cluster.local/<app-root>/api/p/health`.
pub fn health_url(service: &str, namespace: &str, app_root: &str) -> String {
    let root = app_root.trim_matches('/');
    if root.is_empty() {
        format!("http://{service}.{namespace}.svc.cluster.local/{HEALTH_SUBPATH}")
    } else {
        format!("http://{service}.{namespace}.svc.cluster.local/{root}/{HEALTH_SUBPATH}")
    }
}

/// Why a probe produced no HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    #[error("timeout after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered with this status code.
    Status(u16),
    /// No response within budget, or the request failed.
    Failed(ProbeFailure),
}

/// Outcome of one health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub outcome: ProbeOutcome,
    /// Wall-clock time spent on the check.
    pub duration: Duration,
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Status(code) if (200..300).contains(&code))
    }

    pub fn status(&self) -> Option<u16> {
        match self.outcome {
            ProbeOutcome::Status(code) => Some(code),
            ProbeOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ProbeFailure> {
        match &self.outcome {
            ProbeOutcome::Status(_) => None,
            ProbeOutcome::Failed(failure) => Some(failure),
        }
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.duration.as_millis();
        match &self.outcome {
            ProbeOutcome::Status(code) if self.is_success() => {
                write!(f, "SUCCESS - {ms}ms - Status: {code}")
            }
            ProbeOutcome::Status(code) => write!(f, "FAILED - {ms}ms - Status: {code}"),
            ProbeOutcome::Failed(failure) => write!(f, "FAILED - {ms}ms - {failure}"),
        }
    }
}

/// HTTP health prober bound to one URL.
#[derive(Debug, Clone)]
pub struct HealthProber {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl HealthProber {
    /// Prober for an explicit URL.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, HealthError> {
        let url = Url::parse(url).map_err(|e| HealthError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()
            .map_err(HealthError::Client)?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    /// Prober for the service's cluster-internal health endpoint.
    pub fn for_service(
        service: &ServiceConfig,
        health: &HealthCheckConfig,
    ) -> Result<Self, HealthError> {
        let url = health_url(&service.name, &service.namespace, &service.app_root);
        Self::new(&url, health.timeout())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one probe.
    pub async fn check(&self) -> ProbeResult {
        let start = Instant::now();
        let request = self.client.get(self.url.clone()).send();

        let outcome = match time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => ProbeOutcome::Status(response.status().as_u16()),
            Ok(Err(e)) if e.is_timeout() => ProbeOutcome::Failed(ProbeFailure::Timeout {
                after: self.timeout,
            }),
            Ok(Err(e)) => ProbeOutcome::Failed(ProbeFailure::Transport(error_chain(&e))),
            Err(_) => ProbeOutcome::Failed(ProbeFailure::Timeout {
                after: self.timeout,
            }),
        };

        ProbeResult {
            outcome,
            duration: start.elapsed(),
        }
    }
}

/// reqwest's top-level message is terse; include the causes.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_url_template() {
        assert_eq!(
            health_url("web", "prod", "shop"),
            "http://web.prod.svc.cluster.local/shop/api/p/health"
        );
        assert_eq!(
            health_url("web", "prod", "/shop/"),
            "http://web.prod.svc.cluster.local/shop/api/p/health"
        );
        assert_eq!(
            health_url("web", "prod", ""),
            "http://web.prod.svc.cluster.local/api/p/health"
        );
    }

    #[test]
    fn test_for_service_builds_url_once() {
        let service = ServiceConfig {
            name: "web".into(),
            namespace: "prod".into(),
            app_root: "shop".into(),
        };
        let prober = HealthProber::for_service(&service, &HealthCheckConfig::default()).unwrap();
        assert_eq!(
            prober.url().as_str(),
            "http://web.prod.svc.cluster.local/shop/api/p/health"
        );
        assert_eq!(prober.timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_result_classification() {
        let ok = ProbeResult {
            outcome: ProbeOutcome::Status(204),
            duration: Duration::from_millis(3),
        };
        assert!(ok.is_success());
        assert_eq!(ok.to_string(), "SUCCESS - 3ms - Status: 204");

        let unavailable = ProbeResult {
            outcome: ProbeOutcome::Status(503),
            duration: Duration::from_millis(3),
        };
        assert!(!unavailable.is_success());
        assert_eq!(unavailable.status(), Some(503));
        assert!(unavailable.failure().is_none());

        let timeout = ProbeResult {
            outcome: ProbeOutcome::Failed(ProbeFailure::Timeout {
                after: Duration::from_millis(250),
            }),
            duration: Duration::from_millis(251),
        };
        assert!(!timeout.is_success());
        assert_eq!(timeout.failure().unwrap().to_string(), "timeout after 250ms");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = HealthProber::new("::not a url::", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, HealthError::InvalidUrl { .. }));
    }
}
