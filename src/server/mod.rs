//! HTTP front end: router, rate limiting, and server lifecycle

pub mod rate_limit;
pub mod router;
mod server;

pub use rate_limit::RateLimiter;
pub use router::{AppState, create_router};
pub use server::RelayServer;
