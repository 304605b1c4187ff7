//! Opt-in reply cache for the advisor.
//!
//! The advisor prompt is deterministic per (model, message, language), so
//! replies can be cached. Uses moka's async LRU + TTL cache keyed on a
//! content hash; without a cache configured, no allocation happens.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use moka::future::Cache;

use crate::telemetry;

/// Configuration for the advisor reply cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached replies. Default: 10,000.
    pub max_entries: u64,
    /// Time-to-live for cached replies. Default: 1 hour.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// In-memory advisor reply cache.
pub struct ReplyCache {
    cache: Cache<u64, String>,
}

impl ReplyCache {
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { cache }
    }

    /// Look up a cached reply. Emits cache hit/miss metrics.
    pub async fn get(&self, model: &str, message: &str, language: &str) -> Option<String> {
        let key = cache_key(model, message, language);
        match self.cache.get(&key).await {
            Some(reply) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                Some(reply)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    pub async fn insert(&self, model: &str, message: &str, language: &str, reply: String) {
        self.cache
            .insert(cache_key(model, message, language), reply)
            .await;
    }
}

/// Content hash of (model, message, language).
///
/// `DefaultHasher` is deterministic within a process lifetime, which is
/// sufficient for an in-memory cache.
fn cache_key(model: &str, message: &str, language: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    model.hash(&mut hasher);
    message.hash(&mut hasher);
    language.hash(&mut hasher);
    hasher.finish()
}
