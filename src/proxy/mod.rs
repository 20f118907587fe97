//! Forwarding core: request validation, the upstream call, and response
//! composition against the cache

pub mod composer;
pub mod forwarder;
pub mod request;

pub use composer::{CacheOutcome, RelayResponse, ResponseComposer};
pub use forwarder::{UpstreamForwarder, UpstreamResponse};
pub use request::ProxyRequest;
