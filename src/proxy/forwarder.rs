//! Upstream forwarder - the single outbound HTTP call
//!
//! One attempt per invocation, bounded by a whole-call timeout. Transport
//! failures are classified into timeout vs unreachable; HTTP-level error
//! statuses are successes and surface to the caller unchanged.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Method};
use tracing::debug;

use super::request::ProxyRequest;
use crate::config::UpstreamConfig;
use crate::{Error, Result};

/// Response headers never relayed or cached. Hop-by-hop per RFC 9110 §7.6.1,
/// plus content-length (recomputed) and content-encoding (bodies arrive
/// already decompressed from the client).
const STRIPPED_HEADERS: [&str; 10] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
    "content-encoding",
];

/// What the forwarder captured from a completed upstream call
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// Upstream HTTP status code, passed through without remapping
    pub status: u16,
    /// End-to-end response headers
    pub headers: Vec<(String, String)>,
    /// Fully buffered response body
    pub body: Bytes,
}

/// Issues outbound calls on a shared HTTP client
#[derive(Clone)]
pub struct UpstreamForwarder {
    client: Client,
    timeout: Duration,
}

impl UpstreamForwarder {
    /// Create a forwarder with the configured whole-call timeout
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    /// Forward a validated request to its target
    ///
    /// Exactly one attempt; no retry. The timeout covers connection
    /// establishment through the end of the body read.
    ///
    /// # Errors
    ///
    /// [`Error::UpstreamTimeout`] when the call exceeds the configured
    /// timeout, [`Error::UpstreamUnreachable`] for any other transport
    /// failure (DNS, connect, TLS). A non-2xx status is not an error.
    pub async fn forward(&self, request: &ProxyRequest) -> Result<UpstreamResponse> {
        let method = Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| Error::Internal(format!("invalid method: {e}")))?;

        let mut outbound = self
            .client
            .request(method, request.target.as_str())
            .timeout(self.timeout);

        if let Some(content_type) = &request.content_type {
            outbound = outbound.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        if !request.body.is_empty() {
            outbound = outbound.body(request.body.clone());
        }

        let response = outbound.send().await.map_err(classify)?;

        let status = response.status().as_u16();
        let headers = relayed_headers(response.headers());
        let body = response.bytes().await.map_err(classify)?;

        debug!(target = %request.target, status, bytes = body.len(), "Upstream call completed");

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// Map a transport failure onto the relay's error taxonomy
fn classify(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::UpstreamTimeout(err.to_string())
    } else {
        Error::UpstreamUnreachable(err.to_string())
    }
}

/// Capture the end-to-end response headers, dropping the stripped set
fn relayed_headers(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| !STRIPPED_HEADERS.contains(&name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
