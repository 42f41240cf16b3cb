//! Content-addressed response cache with TTL and insertion-order eviction.
//!
//! [`ResponseCache`] maps a digest of (tag, payload) — see [`content_key`] —
//! to a previously obtained backend result, so identical inputs never pay
//! for a second remote call within the TTL. Expiry is lazy: an expired entry
//! is noticed and removed on lookup. When the cache is full, the
//! oldest-inserted entry goes first — insertion order, not access order, so
//! even a frequently-read entry ages out of a full cache.
//!
//! The cache is content-agnostic: key derivation is the caller's job and the
//! stored value is never inspected. Absence is `None`, never an error.
//!
//! A single coarse mutex guards the map and the insertion queue. Hold times
//! are bounded (no await, no allocation-heavy work under the lock); the
//! remote calls this cache fronts dominate latency by orders of magnitude,
//! so correctness wins over lock granularity here.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::telemetry;

/// Configuration for the response cache.
///
/// ```rust
/// # use muninn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(10_000)
///     .ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 1,024.
    pub max_entries: usize,
    /// Time-to-live for cached entries. Default: 1 hour.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_024,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

struct Inner<V> {
    entries: HashMap<u64, CacheEntry<V>>,
    // Keys in insertion order; front is the eviction candidate.
    insertion_order: VecDeque<u64>,
}

/// In-memory, process-lifetime response cache.
///
/// Generic over the (opaque) cached value, which is cloned out on hits.
/// Shared across coordinators as `Arc<ResponseCache<V>>`.
pub struct ResponseCache<V> {
    config: CacheConfig,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> ResponseCache<V> {
    /// Create a new cache with the given configuration. A zero capacity is
    /// clamped to one so `store` always has somewhere to put an entry.
    pub fn new(config: CacheConfig) -> Self {
        let config = CacheConfig {
            max_entries: config.max_entries.max(1),
            ..config
        };
        Self {
            config,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
        }
    }

    /// Look up a cached value.
    ///
    /// Returns `None` on miss. An entry past its TTL counts as a miss and is
    /// removed on the spot. Emits cache hit/miss metrics.
    pub fn lookup(&self, key: u64) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap();
        let expired = match inner.entries.get(&key) {
            Some(entry) if now < entry.expires_at => {
                let value = entry.value.clone();
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.entries.remove(&key);
            inner.insertion_order.retain(|k| *k != key);
            metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(1);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        None
    }

    /// Insert or overwrite a value under `key`.
    ///
    /// A new key at capacity evicts the single oldest-inserted entry first.
    /// Overwriting refreshes the TTL but keeps the key's original place in
    /// the eviction order.
    pub fn store(&self, key: u64, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.config.ttl,
        };
        let mut inner = self.inner.lock().unwrap();
        if inner.entries.contains_key(&key) {
            inner.entries.insert(key, entry);
            return;
        }
        if inner.entries.len() >= self.config.max_entries {
            if let Some(oldest) = inner.insertion_order.pop_front() {
                inner.entries.remove(&oldest);
                metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(1);
            }
        }
        inner.insertion_order.push_back(key);
        inner.entries.insert(key, entry);
    }

    /// Sweep out every expired entry, returning how many were removed.
    ///
    /// Optional housekeeping for long-lived caches; lookups already expire
    /// lazily, so calling this is never required for correctness.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap();
        let before = inner.entries.len();
        let Inner {
            entries,
            insertion_order,
        } = &mut *inner;
        entries.retain(|_, entry| now < entry.expires_at);
        let removed = before - entries.len();
        if removed > 0 {
            insertion_order.retain(|key| entries.contains_key(key));
            metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(removed as u64);
        }
        removed
    }

    /// Number of entries currently in the cache (expired ones included
    /// until they are noticed).
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict all entries.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.insertion_order.clear();
    }
}

/// Compute the cache key for a request's semantic content.
///
/// Uses `DefaultHasher` (SipHash) over the classification tag and the raw
/// payload bytes. Deterministic within a process lifetime, which is all an
/// in-memory cache needs; a future shared backend would swap in a stable
/// cross-process hash.
pub fn content_key(tag: &str, payload: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    tag.hash(&mut hasher);
    payload.hash(&mut hasher);
    hasher.finish()
}
