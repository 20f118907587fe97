//! Error types for the cache relay

use std::io;

use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias for the cache relay
pub type Result<T> = std::result::Result<T, Error>;

/// Cache relay errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No target URL in the inbound request
    #[error("Missing target parameter")]
    MissingTarget,

    /// Target is not an absolute http/https URL
    #[error("Invalid target URL: {0}")]
    InvalidTarget(String),

    /// Upstream call exceeded the configured timeout
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// Upstream could not be reached (DNS, connect, TLS)
    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert to the HTTP status code surfaced at the request boundary
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingTarget | Self::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamUnreachable(_) | Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
