//! Response caching with TTL for relayed upstream responses
//!
//! Provides a thread-safe, TTL-based cache keyed by
//! `{method}:{normalized_target}:{body_hash}` where `body_hash` is the
//! SHA-256 digest of the request body. The normalized target sorts query
//! pairs so logically identical requests share a key.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use url::Url;

/// Thread-safe response cache with TTL expiry
pub struct ResponseCache {
    /// Cache entries keyed by `{method}:{normalized_target}:{body_hash}`
    entries: DashMap<String, CachedEntry>,
    /// Cache statistics
    stats: CacheStats,
}

/// The response payload a cache entry holds.
///
/// Hop-by-hop headers are stripped before insertion; content-type is kept so
/// a hit can be served byte-for-byte as the upstream returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// Upstream HTTP status code
    pub status: u16,
    /// Upstream response headers (end-to-end only)
    pub headers: Vec<(String, String)>,
    /// Raw upstream response body
    pub body: Bytes,
}

/// A cached response with TTL metadata
struct CachedEntry {
    /// The stored payload; never mutated, only replaced wholesale
    response: CachedResponse,
    /// When this entry was cached
    cached_at: Instant,
    /// Time-to-live duration
    ttl: Duration,
}

impl CachedEntry {
    /// Check if this entry has expired
    fn is_expired(&self) -> bool {
        Instant::now().duration_since(self.cached_at) > self.ttl
    }
}

/// Cache statistics tracked atomically
#[derive(Debug)]
pub struct CacheStats {
    /// Total cache hits (entries served from cache)
    pub hits: AtomicU64,
    /// Total cache misses (entries not found or expired)
    pub misses: AtomicU64,
    /// Total evictions (expired entries removed)
    pub evictions: AtomicU64,
}

impl CacheStats {
    /// Create new statistics with all counters at zero
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Get current cache hit count
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Get current cache miss count
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get current eviction count
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Calculate hit rate as a percentage (0.0-1.0)
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

impl ResponseCache {
    /// Create a new empty cache
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            stats: CacheStats::new(),
        }
    }

    /// Get a cached response if it exists and hasn't expired
    ///
    /// Returns `None` if the key doesn't exist or the entry has expired.
    /// Expired entries are evicted on read, whether or not a background
    /// sweep also runs.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(key);
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            } else {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.response.clone())
            }
        } else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Store a response in the cache with the given TTL
    ///
    /// Inserts or overwrites unconditionally; replacement is atomic
    /// substitution, never an in-place update.
    pub fn put(&self, key: &str, response: CachedResponse, ttl: Duration) {
        let entry = CachedEntry {
            response,
            cached_at: Instant::now(),
            ttl,
        };
        self.entries.insert(key.to_string(), entry);
    }

    /// Number of entries currently stored, expired or not
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.stats.hits(),
            misses: self.stats.misses(),
            evictions: self.stats.evictions(),
            size: self.entries.len(),
            hit_rate: self.stats.hit_rate(),
        }
    }

    /// Build a cache key from method, target URL, and request body
    ///
    /// The key format is `{method}:{normalized_target}:{body_hash}`. The
    /// method contains no `:` and the digest has a fixed length, so the key
    /// is unambiguous even though the target itself contains colons.
    #[must_use]
    pub fn build_key(method: &str, target: &Url, body: &[u8]) -> String {
        format!(
            "{}:{}:{}",
            method,
            Self::normalize_target(target),
            Self::hash_body(body)
        )
    }

    /// Normalize a target URL to scheme + host + port + path + sorted query
    fn normalize_target(target: &Url) -> String {
        let mut normalized = String::new();
        let _ = write!(
            normalized,
            "{}://{}",
            target.scheme(),
            target.host_str().unwrap_or_default()
        );
        // `port()` is None for scheme defaults, keeping 80/443 implicit
        if let Some(port) = target.port() {
            let _ = write!(normalized, ":{port}");
        }
        normalized.push_str(target.path());

        let mut pairs: Vec<(String, String)> = target
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if !pairs.is_empty() {
            pairs.sort();
            for (i, (key, value)) in pairs.iter().enumerate() {
                normalized.push(if i == 0 { '?' } else { '&' });
                let _ = write!(normalized, "{key}={value}");
            }
        }

        normalized
    }

    /// Compute the SHA-256 hex digest of the request body
    fn hash_body(body: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(body);
        let result = hasher.finalize();
        result.iter().map(|b| format!("{b:02x}")).collect::<String>()
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Evict expired entries (background maintenance)
    pub fn evict_expired(&self) {
        let keys_to_remove: Vec<String> = self
            .entries
            .iter()
            .filter_map(|entry| {
                if entry.value().is_expired() {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect();

        let count = keys_to_remove.len();
        for key in keys_to_remove {
            self.entries.remove(&key);
        }

        if count > 0 {
            self.stats
                .evictions
                .fetch_add(count as u64, Ordering::Relaxed);
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of cache statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStatsSnapshot {
    /// Total cache hits
    pub hits: u64,
    /// Total cache misses
    pub misses: u64,
    /// Total evictions
    pub evictions: u64,
    /// Current number of entries
    pub size: usize,
    /// Hit rate (0.0-1.0)
    pub hit_rate: f64,
}
