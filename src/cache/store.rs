//! Cache Store Module
//!
//! TTL-aware wrapper around [`LruStore`], shared by all callers of one group.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::cache::{ByteView, CacheEntry, CacheUsage, LruStore};

// == Cache Store ==
/// Thread-safe LRU cache with lazy per-entry expiry.
///
/// The underlying store is only allocated on first write, so a group that
/// never sees traffic costs nothing. Expired entries are dropped when they
/// are next looked up; there is no background sweeper.
#[derive(Debug)]
pub struct CacheStore {
    /// Byte budget handed to the LRU store, <= 0 means unbounded
    max_bytes: i64,
    lru: RwLock<Option<LruStore<CacheEntry>>>,
    /// Counts every store-level removal: capacity evictions, expiry and
    /// explicit removes alike
    removals: Arc<AtomicU64>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty cache with the given byte budget.
    pub fn new(max_bytes: i64) -> Self {
        Self {
            max_bytes,
            lru: RwLock::new(None),
            removals: Arc::new(AtomicU64::new(0)),
        }
    }

    // == Add ==
    /// Stores a value. A non-zero `ttl` sets the expiry to now + ttl; a zero
    /// `ttl` clears any previous expiry for the key.
    pub fn add(&self, key: &str, value: ByteView, ttl: Duration) {
        let mut guard = self.lru.write();
        let removals = self.removals.clone();
        let lru = guard.get_or_insert_with(|| {
            LruStore::with_eviction_callback(self.max_bytes, move |_, _| {
                removals.fetch_add(1, Ordering::Relaxed);
            })
        });
        lru.add(key, CacheEntry::new(value, ttl));
    }

    // == Get ==
    /// Retrieves a live value, promoting it to most recently used.
    ///
    /// An expired entry is removed on the spot and reported as a miss.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        // Promotion mutates the ordering, so even lookups take the write lock
        let mut guard = self.lru.write();
        let lru = guard.as_mut()?;

        if lru.peek(key)?.is_expired() {
            lru.remove_key(key);
            return None;
        }
        lru.get(key).map(|entry| entry.value.clone())
    }

    // == Remove ==
    /// Removes a key unconditionally. No-op if absent.
    pub fn remove(&self, key: &str) {
        if let Some(lru) = self.lru.write().as_mut() {
            lru.remove_key(key);
        }
    }

    // == Stats ==
    /// Returns entry count, resident bytes and cumulative removals.
    pub fn usage(&self) -> CacheUsage {
        let guard = self.lru.read();
        let removals = self.removals.load(Ordering::Relaxed);
        match guard.as_ref() {
            Some(lru) => CacheUsage {
                entries: lru.len(),
                bytes: lru.bytes(),
                evictions: removals,
            },
            None => CacheUsage {
                entries: 0,
                bytes: 0,
                evictions: removals,
            },
        }
    }

    // == Is Initialized ==
    /// Returns true once the first write has allocated the store.
    pub fn is_initialized(&self) -> bool {
        self.lru.read().is_some()
    }
}
