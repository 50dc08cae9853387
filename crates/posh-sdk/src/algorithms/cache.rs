//! # TTL Read Cache
//!
//! Bounded key/value store with a fixed time-to-live per entry.
//!
//! ## Eviction
//!
//! - Expiry is lazy: `get` treats an entry as absent once `now >= expires_at`
//!   and removes it on the spot. There is no background sweeper.
//! - Capacity is enforced on insert: a new key arriving at a full cache
//!   evicts the oldest-inserted entry. Reads never reorder entries, so the
//!   LRU order of the backing map is insertion order.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::ports::{Clock, SystemClock};

#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: u64,
}

/// TTL cache with insertion-order eviction.
pub struct TtlCache<V> {
    entries: LruCache<String, CacheEntry<V>>,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Cache backed by the wall clock.
    pub fn new(ttl_ms: u64, max_size: usize) -> Self {
        Self::with_clock(ttl_ms, max_size, Arc::new(SystemClock))
    }

    /// Cache reading time from `clock`.
    pub fn with_clock(ttl_ms: u64, max_size: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: LruCache::new(capacity(max_size)),
            ttl_ms,
            clock,
        }
    }

    /// Store `value` under `key` with expiry `now + ttl`. Overwriting an
    /// existing key refreshes its expiry but keeps its insertion position.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        let entry = CacheEntry {
            value,
            expires_at: self.clock.now_millis().saturating_add(self.ttl_ms),
        };

        if let Some(existing) = self.entries.peek_mut(&key) {
            *existing = entry;
            return;
        }

        if let Some((evicted, _)) = self.entries.push(key, entry) {
            tracing::trace!(cache_key = %evicted, "Cache full, evicted oldest entry");
        }
    }

    /// Fresh value for `key`, removing it if expired.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_millis();
        let expires_at = self.entries.peek(key)?.expires_at;
        if now >= expires_at {
            self.entries.pop(key);
            return None;
        }
        self.entries.peek(key).map(|e| e.value.clone())
    }

    /// True when `get` would return a value. Does not remove expired entries.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now_millis();
        self.entries
            .peek(key)
            .map_or(false, |entry| now < entry.expires_at)
    }

    /// Remove one entry. Returns whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.pop(key).is_some()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Entry lifetime in milliseconds.
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    /// Apply new sizing. Shrinking evicts oldest entries first.
    pub fn reconfigure(&mut self, ttl_ms: u64, max_size: usize) {
        self.ttl_ms = ttl_ms;
        self.entries.resize(capacity(max_size));
    }
}

fn capacity(max_size: usize) -> NonZeroUsize {
    NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN)
}
