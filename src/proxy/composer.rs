//! Response composer - cache-or-forward decision
//!
//! Serves a request from the cache when a live entry exists, otherwise runs
//! the upstream call and records the result. Successful upstream responses
//! are cached whatever their status code; forwarding failures never are.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use super::forwarder::UpstreamForwarder;
use super::request::ProxyRequest;
use crate::cache::{CachedResponse, ResponseCache};
use crate::config::CacheConfig;
use crate::{Error, Result};

/// Whether a response came from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Served from a live cache entry; upstream was not contacted
    Hit,
    /// Served from a fresh upstream call that was recorded in the cache
    Miss,
    /// Caching is disabled; upstream contacted, nothing recorded
    Bypass,
}

impl CacheOutcome {
    /// Value of the `x-cache` response header
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "BYPASS",
        }
    }
}

/// The composed result written back to the inbound caller
#[derive(Debug, Clone)]
pub struct RelayResponse {
    /// Status code to serve (upstream's, unmodified)
    pub status: u16,
    /// Headers to serve
    pub headers: Vec<(String, String)>,
    /// Body to serve
    pub body: Bytes,
    /// Cache hit/miss/bypass indicator
    pub cache: CacheOutcome,
}

/// Decides between cache and upstream, and records fresh responses
pub struct ResponseComposer {
    cache: Arc<ResponseCache>,
    forwarder: UpstreamForwarder,
    default_ttl: Duration,
    cache_enabled: bool,
}

impl ResponseComposer {
    /// Create a composer over a shared cache store and forwarder
    pub fn new(cache: Arc<ResponseCache>, forwarder: UpstreamForwarder, config: &CacheConfig) -> Self {
        Self {
            cache,
            forwarder,
            default_ttl: config.default_ttl,
            cache_enabled: config.enabled,
        }
    }

    /// Compose the response for one validated request
    ///
    /// # Errors
    ///
    /// Propagates forwarder failures; nothing is cached on the error path.
    pub async fn compose(&self, request: ProxyRequest) -> Result<RelayResponse> {
        if !self.cache_enabled {
            let upstream = self.forwarder.forward(&request).await?;
            return Ok(RelayResponse {
                status: upstream.status,
                headers: upstream.headers,
                body: upstream.body,
                cache: CacheOutcome::Bypass,
            });
        }

        let key = ResponseCache::build_key(request.method.as_str(), &request.target, &request.body);

        if let Some(cached) = self.cache.get(&key) {
            debug!(key = %key, "Cache hit");
            return Ok(RelayResponse {
                status: cached.status,
                headers: cached.headers,
                body: cached.body,
                cache: CacheOutcome::Hit,
            });
        }

        // The upstream call runs on its own task: a client disconnect drops
        // this future, but the call still completes and the entry still
        // lands in the cache.
        let forwarder = self.forwarder.clone();
        let cache = Arc::clone(&self.cache);
        let ttl = self.default_ttl;
        let task = tokio::spawn(async move {
            let upstream = forwarder.forward(&request).await?;
            cache.put(
                &key,
                CachedResponse {
                    status: upstream.status,
                    headers: upstream.headers.clone(),
                    body: upstream.body.clone(),
                },
                ttl,
            );
            debug!(key = %key, status = upstream.status, "Cached upstream response");
            Ok::<_, Error>(upstream)
        });

        let upstream = task
            .await
            .map_err(|e| Error::Internal(format!("relay task failed: {e}")))??;

        Ok(RelayResponse {
            status: upstream.status,
            headers: upstream.headers,
            body: upstream.body,
            cache: CacheOutcome::Miss,
        })
    }
}
