//! Endpoint change streams.
//!
//! # Responsibilities
//! - Open a label-filtered EndpointSlice watch for one service
//! - Frame and decode the newline-delimited body
//! - Reopen the watch after any stream-level failure
//!
//! # Connection States
//! ```text
//! Disconnected → (GET ok) → Streaming → (error / EOF / non-2xx) → Backoff → Disconnected
//! ```
//!
//! # Design Decisions
//! - Pull-based: nothing is read until the consumer polls the stream
//! - Reconnects are unbounded with a fixed delay; the stream never ends
//! - An optional idle bound turns a silent connection into a reconnect
//! - No resume tokens: the server replays current state on every new watch

use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};
use url::Url;

use crate::config::ClusterConfig;
use crate::discovery::credentials::ClusterCredentials;
use crate::discovery::decode::{decode_line, LineBuffer, MAX_LINE_BYTES};
use crate::discovery::types::ChangeEvent;
use crate::discovery::DiscoveryError;
use crate::observability::metrics;

/// Label every EndpointSlice carries, naming its owning service.
pub const SERVICE_NAME_LABEL: &str = "kubernetes.io/service-name";

/// Something that yields an endless sequence of endpoint changes for a service.
pub trait EndpointSource {
    /// Open the change stream for `service` in `namespace`.
    ///
    /// Errors here are setup failures; once a stream is returned it
    /// handles its own reconnects and never terminates.
    fn watch(
        &self,
        service: &str,
        namespace: &str,
    ) -> Result<BoxStream<'static, ChangeEvent>, DiscoveryError>;
}

/// EndpointSlice watch against the Kubernetes discovery API.
#[derive(Debug, Clone)]
pub struct KubeEndpointSource {
    client: reqwest::Client,
    base_url: Url,
    credentials: ClusterCredentials,
    reconnect_delay: Duration,
    idle_timeout: Option<Duration>,
}

impl KubeEndpointSource {
    pub fn new(
        config: &ClusterConfig,
        credentials: ClusterCredentials,
    ) -> Result<Self, DiscoveryError> {
        let base = config.api_base_url();
        let base_url = Url::parse(&base).map_err(|e| DiscoveryError::InvalidUrl {
            url: base.clone(),
            reason: e.to_string(),
        })?;
        let client = credentials.build_client(config)?;

        Ok(Self {
            client,
            base_url,
            credentials,
            reconnect_delay: config.reconnect_delay(),
            idle_timeout: config.watch_idle_timeout(),
        })
    }

    /// Override the delay between reconnect attempts.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Reopen the watch when no bytes arrive for `limit`.
    pub fn with_idle_timeout(mut self, limit: Duration) -> Self {
        self.idle_timeout = Some(limit);
        self
    }

    /// URL of the label-filtered watch for one service.
    pub fn watch_url(&self, service: &str, namespace: &str) -> Result<Url, DiscoveryError> {
        let path = format!("apis/discovery.k8s.io/v1/namespaces/{namespace}/endpointslices");
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| DiscoveryError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                reason: e.to_string(),
            })?;

        url.query_pairs_mut()
            .append_pair("watch", "true")
            .append_pair("labelSelector", &format!("{SERVICE_NAME_LABEL}={service}"));

        Ok(url)
    }
}

impl EndpointSource for KubeEndpointSource {
    fn watch(
        &self,
        service: &str,
        namespace: &str,
    ) -> Result<BoxStream<'static, ChangeEvent>, DiscoveryError> {
        let url = self.watch_url(service, namespace)?;

        tracing::info!(
            service = %service,
            namespace = %namespace,
            "Watching EndpointSlices"
        );

        let session = WatchSession {
            client: self.client.clone(),
            url,
            token: self.credentials.token().map(str::to_owned),
            reconnect_delay: self.reconnect_delay,
            idle_timeout: self.idle_timeout,
            body: None,
            lines: LineBuffer::new(),
            ready: VecDeque::new(),
        };

        Ok(stream::unfold(session, |mut session| async move {
            let event = session.next_event().await;
            Some((event, session))
        })
        .boxed())
    }
}

type ByteStream = BoxStream<'static, reqwest::Result<Bytes>>;

/// State carried across polls of one watch stream.
struct WatchSession {
    client: reqwest::Client,
    url: Url,
    token: Option<String>,
    reconnect_delay: Duration,
    idle_timeout: Option<Duration>,
    body: Option<ByteStream>,
    lines: LineBuffer,
    ready: VecDeque<ChangeEvent>,
}

impl WatchSession {
    /// Suspend until the next event, reconnecting as often as needed.
    async fn next_event(&mut self) -> ChangeEvent {
        loop {
            if let Some(event) = self.ready.pop_front() {
                metrics::record_watch_event(event.kind());
                return event;
            }

            let Some(body) = self.body.as_mut() else {
                match connect(&self.client, &self.url, self.token.as_deref()).await {
                    Ok(body) => {
                        tracing::debug!(url = %self.url, "Watch stream opened");
                        self.lines.clear();
                        self.body = Some(body);
                    }
                    Err(e) => self.backoff(&e.to_string()).await,
                }
                continue;
            };

            let next = match self.idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, body.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        self.backoff(&format!("no data for {}s", limit.as_secs_f64()))
                            .await;
                        continue;
                    }
                },
                None => body.next().await,
            };

            match next {
                Some(Ok(chunk)) => self.ingest(&chunk),
                Some(Err(e)) => self.backoff(&format!("read failed: {e}")).await,
                None => self.backoff("stream closed by server").await,
            }
        }
    }

    fn ingest(&mut self, chunk: &[u8]) {
        for line in self.lines.push(chunk) {
            match decode_line(&line) {
                Ok(Some(event)) => self.ready.push_back(event),
                Ok(None) => {}
                Err(e) => {
                    metrics::record_decode_failure();
                    tracing::error!(
                        error = %e,
                        line = %String::from_utf8_lossy(&line),
                        "Failed to parse watch event"
                    );
                }
            }
        }

        let oversized = self.lines.take_oversized();
        if oversized > 0 {
            metrics::record_decode_failures(oversized as u64);
            tracing::error!(
                records = oversized,
                limit_bytes = MAX_LINE_BYTES,
                "Dropped oversized watch records"
            );
        }
    }

    async fn backoff(&mut self, reason: &str) {
        self.body = None;
        self.lines.clear();
        metrics::record_reconnect();

        tracing::error!(reason = %reason, "Watch error");
        tracing::info!(
            delay_ms = self.reconnect_delay.as_millis() as u64,
            "Reconnecting watch"
        );
        tokio::time::sleep(self.reconnect_delay).await;
    }
}

/// Issue the watch request and hand back its body.
async fn connect(
    client: &reqwest::Client,
    url: &Url,
    token: Option<&str>,
) -> Result<ByteStream, DiscoveryError> {
    let mut request = client.get(url.clone());
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await.map_err(DiscoveryError::Request)?;
    let status = response.status();
    if !status.is_success() {
        return Err(DiscoveryError::Status(status));
    }

    Ok(response.bytes_stream().boxed())
}
