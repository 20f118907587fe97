//! Cache Relay Library
//!
//! Minimal caching HTTP forwarding proxy: inbound requests name a target URL,
//! the relay forwards them upstream and serves repeat requests from a
//! short-lived in-memory response cache.
//!
//! # Features
//!
//! - **Forwarding**: any method, body passed through verbatim, one attempt
//! - **Response cache**: TTL expiry, lazy eviction on read plus periodic sweep
//! - **Failure taxonomy**: timeout vs unreachable, surfaced as 504/502 JSON
//! - **Rate limiting**: token-bucket throttle on the inbound surface
//! - **Production ready**: health endpoint, graceful shutdown

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod proxy;
pub mod server;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
