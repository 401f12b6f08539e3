//! Response caching for repeated generation requests.
//!
//! The cache is content-addressed: identical logical requests (same provider,
//! model, messages and options) map to the same key and share one stored
//! response until its TTL elapses.
//!
//! ## Layers
//!
//! - [`CacheStore`]: opaque get/set-with-TTL backend. Any external key/value
//!   service can implement it.
//! - [`InMemoryCacheStore`]: process-local backend with TTL expiry and LRU
//!   eviction.
//! - [`ResponseCache`]: key derivation and (de)serialization of
//!   [`GenerationResponse`] on top of a store. Backend failures are reported
//!   and degrade to a miss.
//!
//! ## Concurrency
//!
//! There is no single-flight protection. Two concurrent identical requests
//! that both miss will both dispatch, and the later write wins.

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::CacheError;
use crate::traits::{ChatMessage, ToolDefinition};
use crate::types::{GenerationRequest, GenerationResponse};

/// Configuration for the response cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether responses are cached at all.
    pub enabled: bool,
    /// Time-to-live for cache entries.
    pub ttl: Duration,
    /// Maximum number of entries kept by the in-memory store.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(3600), // 1 hour
            max_entries: 1000,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with specified max entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Default::default()
        }
    }

    /// Set the TTL for cache entries.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable caching.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: usize,
    /// Number of cache misses.
    pub misses: usize,
    /// Current number of entries.
    pub entries: usize,
    /// Number of evictions (expired or LRU).
    pub evictions: usize,
}

impl CacheStats {
    /// Get the cache hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Key/value backend supporting get and set-with-TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a live value. Expired entries are absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove every entry.
    async fn clear(&self) -> Result<(), CacheError> {
        Err(CacheError::Backend("clear not supported by this store".into()))
    }

    /// Backend-side statistics, if the store keeps any.
    async fn stats(&self) -> Option<CacheStats> {
        None
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
    last_access: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory store with per-entry TTL and least-recently-used eviction.
#[derive(Debug)]
pub struct InMemoryCacheStore {
    max_entries: usize,
    entries: RwLock<HashMap<String, CacheEntry>>,
    stats: RwLock<CacheStats>,
}

impl InMemoryCacheStore {
    /// Create a store holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    async fn evict_lru(&self, entries: &mut HashMap<String, CacheEntry>) {
        if let Some(key) = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(k, _)| k.clone())
        {
            entries.remove(&key);
            self.stats.write().await.evictions += 1;
        }
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new(CacheConfig::default().max_entries)
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if let Some(entry) = entries.get_mut(key) {
            if entry.is_expired(now) {
                entries.remove(key);
                let mut stats = self.stats.write().await;
                stats.misses += 1;
                stats.evictions += 1;
                return Ok(None);
            }

            entry.last_access = now;
            self.stats.write().await.hits += 1;
            return Ok(Some(entry.value.clone()));
        }

        self.stats.write().await.misses += 1;
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            self.evict_lru(&mut entries).await;
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
                last_access: now,
            },
        );
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        let evicted = entries.len();
        entries.clear();
        self.stats.write().await.evictions += evicted;
        Ok(())
    }

    async fn stats(&self) -> Option<CacheStats> {
        let stats = *self.stats.read().await;
        let entries = self.entries.read().await.len();
        Some(CacheStats { entries, ..stats })
    }
}

// ============================================================================
// Response cache
// ============================================================================

/// Semantically significant request fields, in fixed order.
///
/// The stream flag is excluded so unary and streamed calls share entries.
#[derive(Serialize)]
struct CacheKeyInput<'a> {
    provider: &'a str,
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    top_p: Option<f32>,
    stop: &'a [String],
    tools: &'a [ToolDefinition],
}

/// Derive the cache key of a request: hex SHA-256 over its canonical JSON.
pub fn cache_key(request: &GenerationRequest) -> Result<String, CacheError> {
    let input = CacheKeyInput {
        provider: &request.provider,
        model: &request.model,
        messages: &request.messages,
        temperature: request.options.temperature,
        max_tokens: request.options.max_tokens,
        top_p: request.options.top_p,
        stop: &request.options.stop,
        tools: &request.options.tools,
    };
    let canonical = serde_json::to_vec(&input)?;

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(hex::encode(hasher.finalize()))
}

/// Typed response cache over an opaque [`CacheStore`].
///
/// Never fails its caller: read errors count as misses and write errors are
/// logged and dropped.
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ResponseCache {
    /// Create a cache over `store`.
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Create a cache over a fresh [`InMemoryCacheStore`].
    pub fn in_memory(config: CacheConfig) -> Self {
        let store = Arc::new(InMemoryCacheStore::new(config.max_entries));
        Self::new(store, config)
    }

    /// Whether reads and writes are performed.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// TTL applied to new entries.
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Cache key for `request`, or `None` when caching is disabled or the
    /// request cannot be canonicalized.
    pub fn key_for(&self, request: &GenerationRequest) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        match cache_key(request) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(request_id = %request.id, error = %e, "Failed to derive cache key");
                None
            }
        }
    }

    /// Look up a stored response.
    pub async fn get(&self, key: &str) -> Option<GenerationResponse> {
        if !self.config.enabled {
            return None;
        }

        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache read failed, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        match serde_json::from_str::<GenerationResponse>(&raw) {
            Ok(response) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key, "Cache hit");
                Some(response)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Corrupt cache entry, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a completed response under `key` with the configured TTL.
    pub async fn put(&self, key: &str, response: &GenerationResponse) {
        if !self.config.enabled {
            return;
        }

        let value = match serde_json::to_string(response) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to serialize response for cache");
                return;
            }
        };

        if let Err(e) = self.store.set(key, value, self.config.ttl).await {
            tracing::warn!(key, error = %e, "Cache write failed");
        }
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let backend = self.store.stats().await.unwrap_or_default();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: backend.entries,
            evictions: backend.evictions,
        }
    }

    /// Clear all cache entries.
    pub async fn clear(&self) {
        if let Err(e) = self.store.clear().await {
            tracing::warn!(error = %e, "Cache clear failed");
        }
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("config", &self.config)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenerationOptions;

    fn request(content: &str) -> GenerationRequest {
        GenerationRequest::new("openai", "gpt-4o-mini", vec![ChatMessage::user(content)])
    }

    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }
    }

    #[test]
    fn test_cache_key_is_stable() {
        let a = request("hi");
        let b = request("hi");
        // Different ids, same logical request.
        assert_ne!(a.id, b.id);
        assert_eq!(cache_key(&a).unwrap(), cache_key(&b).unwrap());
        assert_eq!(cache_key(&a).unwrap().len(), 64);
    }

    #[test]
    fn test_cache_key_covers_significant_fields() {
        let base = cache_key(&request("hi")).unwrap();

        assert_ne!(base, cache_key(&request("hello")).unwrap());
        assert_ne!(
            base,
            cache_key(&request("hi").retarget("openai", "gpt-4o")).unwrap()
        );
        assert_ne!(
            base,
            cache_key(&request("hi").with_options(GenerationOptions::with_temperature(0.5)))
                .unwrap()
        );
    }

    #[test]
    fn test_cache_key_ignores_stream_flag_and_metadata() {
        let base = cache_key(&request("hi")).unwrap();

        let streamed = request("hi").with_options(GenerationOptions {
            stream: true,
            ..Default::default()
        });
        assert_eq!(base, cache_key(&streamed).unwrap());
        assert_eq!(base, cache_key(&request("hi").without_fallback()).unwrap());
    }

    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::new(500)
            .with_ttl(Duration::from_secs(600))
            .with_enabled(false);

        assert_eq!(config.max_entries, 500);
        assert_eq!(config.ttl, Duration::from_secs(600));
        assert!(!config.enabled);
    }

    #[tokio::test]
    async fn test_store_hit_and_miss() {
        let store = InMemoryCacheStore::new(10);
        assert_eq!(store.get("k").await.unwrap(), None);

        store
            .set("k", "v".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".into()));

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_ttl_expiry() {
        let store = InMemoryCacheStore::new(10);
        store
            .set("k", "v".into(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.get("k").await.unwrap().is_none());
        assert_eq!(store.stats().await.unwrap().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_evicts_least_recently_used() {
        let store = InMemoryCacheStore::new(2);
        let ttl = Duration::from_secs(60);

        store.set("a", "1".into(), ttl).await.unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;
        store.set("b", "2".into(), ttl).await.unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;
        // Touch "a" so "b" becomes least recently used.
        store.get("a").await.unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;
        store.set("c", "3".into(), ttl).await.unwrap();

        assert!(store.get("a").await.unwrap().is_some());
        assert!(store.get("b").await.unwrap().is_none());
        assert!(store.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_response_round_trip_and_stats() {
        let cache = ResponseCache::in_memory(CacheConfig::default());
        let req = request("hi");
        let key = cache.key_for(&req).unwrap();

        assert!(cache.get(&key).await.is_none());

        let response = GenerationResponse::new(&req, "hello").with_usage(1, 2);
        cache.put(&key, &response).await;
        assert_eq!(cache.get(&key).await, Some(response));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);

        cache.clear().await;
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_disabled_cache() {
        let cache = ResponseCache::in_memory(CacheConfig::default().with_enabled(false));
        let req = request("hi");
        assert!(cache.key_for(&req).is_none());

        cache.put("k", &GenerationResponse::new(&req, "x")).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_backend_failures_degrade_to_miss() {
        let cache = ResponseCache::new(Arc::new(FailingStore), CacheConfig::default());
        let req = request("hi");

        cache.put("k", &GenerationResponse::new(&req, "x")).await;
        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.stats().await.misses, 1);
        // Default clear is unsupported; reported, not raised.
        cache.clear().await;
    }

    #[test]
    fn test_hit_rate() {
        let mut stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);

        stats.hits = 3;
        stats.misses = 1;
        assert_eq!(stats.hit_rate(), 0.75);
    }
}
