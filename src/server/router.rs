//! HTTP router and handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, RawQuery, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    trace::TraceLayer,
};
use tracing::{debug, warn};

use super::rate_limit::{RateLimiter, rate_limit_middleware};
use crate::Error;
use crate::cache::ResponseCache;
use crate::config::Config;
use crate::proxy::{ProxyRequest, RelayResponse, ResponseComposer, UpstreamForwarder};

/// Shared application state
pub struct AppState {
    /// Response cache, shared with the composer and the sweep task
    pub cache: Arc<ResponseCache>,
    /// Cache-or-forward decision logic
    pub composer: ResponseComposer,
    /// Inbound rate limiter
    pub limiter: Arc<RateLimiter>,
    /// Maximum buffered inbound body size
    pub max_body_size: usize,
}

impl AppState {
    /// Build the state tree from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> crate::Result<Self> {
        let cache = Arc::new(ResponseCache::new());
        let forwarder = UpstreamForwarder::new(&config.upstream)?;
        let composer = ResponseComposer::new(Arc::clone(&cache), forwarder, &config.cache);
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Ok(Self {
            cache,
            composer,
            limiter,
            max_body_size: config.server.max_body_size,
        })
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    let limiter = Arc::clone(&state.limiter);
    let max_body_size = state.max_body_size;

    Router::new()
        .route("/healthz", get(health_handler))
        .route("/proxy", any(proxy_handler))
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(CatchPanicLayer::new())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// ANY /proxy handler - validate, compose, and write the relayed response
async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match ProxyRequest::from_parts(method, query.as_deref(), &headers, body) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "Rejected inbound request");
            return error_response(&e);
        }
    };

    debug!(method = %request.method, target = %request.target, "Relaying request");

    match state.composer.compose(request).await {
        Ok(relay) => relay_response(relay),
        Err(e) => {
            warn!(error = %e, "Relay failed");
            error_response(&e)
        }
    }
}

/// Health check handler
///
/// Static OK payload plus a cache statistics snapshot for observability.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "ts": chrono::Utc::now().timestamp_millis(),
        "cache": state.cache.stats(),
    }))
}

/// Fallback handler for unknown routes
async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

/// Write a composed relay result back to the inbound caller
fn relay_response(relay: RelayResponse) -> Response {
    let status = StatusCode::from_u16(relay.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut response = Response::new(Body::from(relay.body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &relay.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            headers.insert(name, value);
        }
    }
    headers.insert(
        HeaderName::from_static("x-cache"),
        HeaderValue::from_static(relay.cache.as_str()),
    );

    response
}

/// Map a relay error onto its boundary status and JSON body
fn error_response(err: &Error) -> Response {
    (err.status_code(), Json(json!({ "error": err.to_string() }))).into_response()
}
