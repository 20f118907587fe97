//! Inbound request validation
//!
//! Builds a typed [`ProxyRequest`] from the raw inbound parts, or rejects the
//! request before any upstream activity. Validation is purely syntactic.

use axum::http::{HeaderMap, Method, header};
use bytes::Bytes;
use serde_json::Value;
use url::Url;

use crate::{Error, Result};

/// A validated inbound request, ready to forward
///
/// Constructed once per inbound call and consumed by a single compose step.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// Inbound HTTP method, forwarded verbatim
    pub method: Method,
    /// Absolute http/https URL to forward to
    pub target: Url,
    /// Inbound content-type, forwarded when present
    pub content_type: Option<String>,
    /// Inbound body, forwarded verbatim (empty for bodyless requests)
    pub body: Bytes,
}

impl ProxyRequest {
    /// Validate the raw inbound parts into a `ProxyRequest`
    ///
    /// The target is looked up in order: query parameter `target`, query
    /// parameter `url`, then a string `target` field in a JSON body. The
    /// body is carried verbatim even when the target came from it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingTarget`] when no target is present anywhere,
    /// and [`Error::InvalidTarget`] when the value is not an absolute
    /// http/https URL.
    pub fn from_parts(
        method: Method,
        query: Option<&str>,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Self> {
        let raw_target = extract_target(query, &body).ok_or(Error::MissingTarget)?;
        let target = parse_target(&raw_target)?;

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        Ok(Self {
            method,
            target,
            content_type,
            body,
        })
    }
}

/// Locate the raw target string: query `target`, query `url`, then body field
fn extract_target(query: Option<&str>, body: &[u8]) -> Option<String> {
    if let Some(query) = query {
        let mut url_param = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "target" if !value.is_empty() => return Some(value.into_owned()),
                "url" if url_param.is_none() && !value.is_empty() => {
                    url_param = Some(value.into_owned());
                }
                _ => {}
            }
        }
        if url_param.is_some() {
            return url_param;
        }
    }

    if body.is_empty() {
        return None;
    }
    let parsed: Value = serde_json::from_slice(body).ok()?;
    parsed
        .get("target")
        .and_then(Value::as_str)
        .map(String::from)
}

/// Parse and check the target: absolute URL, http/https, with a host
fn parse_target(raw: &str) -> Result<Url> {
    let target =
        Url::parse(raw).map_err(|e| Error::InvalidTarget(format!("{raw}: {e}")))?;

    if !matches!(target.scheme(), "http" | "https") {
        return Err(Error::InvalidTarget(format!(
            "unsupported scheme '{}'",
            target.scheme()
        )));
    }

    if target.host_str().is_none() {
        return Err(Error::InvalidTarget(format!("{raw}: missing host")));
    }

    Ok(target)
}
