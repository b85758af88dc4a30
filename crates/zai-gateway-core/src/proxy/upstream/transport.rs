//! Outbound HTTP transport.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::header::HeaderMap;
use std::pin::Pin;
use std::time::Duration;
use zai_gateway_types::models::NetworkConfig;
use zai_gateway_types::ProxyError;

use crate::error::AppResult;

/// Upstream response body as a byte stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ProxyError>> + Send>>;

/// Error bodies larger than this are truncated before logging.
const ERROR_BODY_LIMIT: usize = 8 * 1024;

/// A fully prepared upstream call.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct UpstreamResponse {
    pub status: u16,
    pub body: ByteStream,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse").field("status", &self.status).finish_non_exhaustive()
    }
}

impl UpstreamResponse {
    /// Drain the body as lossy UTF-8, bounded by `ERROR_BODY_LIMIT`.
    pub async fn read_text(mut self) -> String {
        let mut collected = BytesMut::new();
        while let Some(chunk) = self.body.next().await {
            match chunk {
                Ok(bytes) => {
                    let room = ERROR_BODY_LIMIT.saturating_sub(collected.len());
                    collected.extend_from_slice(&bytes[..bytes.len().min(room)]);
                    if room <= bytes.len() {
                        break;
                    }
                },
                Err(e) => {
                    tracing::debug!("Error body read interrupted: {}", e);
                    break;
                },
            }
        }
        String::from_utf8_lossy(&collected).into_owned()
    }
}

/// The network call seam between the orchestrator and the outside world.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// Send one attempt. Connection failures and timeouts are `Transport` errors;
    /// any HTTP status (including non-200) is a successful send.
    async fn send(&self, request: &OutboundRequest) -> Result<UpstreamResponse, ProxyError>;
}

/// Build the shared reqwest client with connect timeout and optional proxies.
pub fn build_http_client(network: &NetworkConfig) -> AppResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(network.connect_timeout())
        .tcp_nodelay(true);

    if let Some(url) = network.http_proxy.as_deref().filter(|u| !u.is_empty()) {
        builder = builder.proxy(reqwest::Proxy::http(url)?);
        tracing::info!("Using HTTP proxy for upstream calls");
    }
    if let Some(url) = network.https_proxy.as_deref().filter(|u| !u.is_empty()) {
        builder = builder.proxy(reqwest::Proxy::https(url)?);
        tracing::info!("Using HTTPS proxy for upstream calls");
    }

    Ok(builder.build()?)
}

/// reqwest-backed transport. Each attempt gets a fresh total-request timeout.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, request_timeout: Duration) -> Self {
        Self { client, request_timeout }
    }

    pub fn from_config(network: &NetworkConfig) -> AppResult<Self> {
        Ok(Self::new(build_http_client(network)?, network.request_timeout()))
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl UpstreamTransport for HttpTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<UpstreamResponse, ProxyError> {
        let response = self
            .client
            .post(&request.url)
            .headers(request.headers.clone())
            .body(request.body.clone())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.bytes_stream().map_err(transport_error);
        Ok(UpstreamResponse { status, body: Box::pin(body) })
    }
}

fn transport_error(e: reqwest::Error) -> ProxyError {
    let kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else {
        "io"
    };
    ProxyError::Transport { message: format!("{kind}: {e}") }
}
