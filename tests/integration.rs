//! Integration tests for the cache relay

use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use axum::http::StatusCode;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use url::Url;

use cache_relay::Error;
use cache_relay::cache::{CachedResponse, ResponseCache};
use cache_relay::config::Config;

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
    assert!(config.cache.enabled);
    assert_eq!(config.cache.default_ttl, Duration::from_secs(60));
    assert_eq!(config.cache.sweep_interval, Duration::from_secs(60));
    assert_eq!(config.upstream.timeout, Duration::from_secs(10));
    assert!(config.rate_limit.enabled);
    assert_eq!(config.rate_limit.requests_per_second, 100);
}

#[test]
fn test_config_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "server:\n  port: 8125\ncache:\n  default_ttl: 30s\nupstream:\n  timeout: 2s"
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.server.port, 8125);
    assert_eq!(config.cache.default_ttl, Duration::from_secs(30));
    assert_eq!(config.upstream.timeout, Duration::from_secs(2));
    // Untouched sections keep their defaults
    assert_eq!(config.server.host, "127.0.0.1");
    assert!(config.rate_limit.enabled);
}

#[test]
fn test_config_missing_file_is_an_error() {
    let err = Config::load(Some(Path::new("/no/such/relay.yaml"))).unwrap_err();

    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_error_status_mapping() {
    assert_eq!(Error::MissingTarget.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        Error::InvalidTarget("bad".into()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        Error::UpstreamTimeout("slow".into()).status_code(),
        StatusCode::GATEWAY_TIMEOUT
    );
    assert_eq!(
        Error::UpstreamUnreachable("refused".into()).status_code(),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        Error::Config("broken".into()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        Error::Internal("oops".into()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_derive_key_is_pure_and_deterministic() {
    let target = Url::parse("https://example.test/data?b=2&a=1").unwrap();

    let key1 = ResponseCache::build_key("GET", &target, b"");
    let key2 = ResponseCache::build_key("GET", &target, b"");
    assert_eq!(key1, key2);

    // Query order does not change request identity
    let reordered = Url::parse("https://example.test/data?a=1&b=2").unwrap();
    assert_eq!(key1, ResponseCache::build_key("GET", &reordered, b""));
}

#[test]
fn test_keys_differ_for_distinct_bodies() {
    let target = Url::parse("https://example.test/data").unwrap();

    let empty_object = ResponseCache::build_key("POST", &target, b"{}");
    let payload = ResponseCache::build_key("POST", &target, br#"{"a":1}"#);

    assert_ne!(empty_object, payload);
}

#[test]
fn test_cache_round_trip_within_ttl() {
    let cache = ResponseCache::new();
    let response = CachedResponse {
        status: 200,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Bytes::from_static(br#"{"a":1}"#),
    };

    cache.put("k", response.clone(), Duration::from_secs(60));

    // Field-for-field equality while the entry is live
    assert_eq!(cache.get("k"), Some(response));
}

#[test]
fn test_cache_expiry_without_explicit_removal() {
    let cache = ResponseCache::new();
    let response = CachedResponse {
        status: 200,
        headers: Vec::new(),
        body: Bytes::from_static(b"x"),
    };

    cache.put("k", response, Duration::from_millis(50));
    std::thread::sleep(Duration::from_millis(80));

    assert_eq!(cache.get("k"), None);
}
