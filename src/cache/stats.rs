//! Cache Statistics Module
//!
//! Point-in-time snapshots of group counters and store usage.

use serde::Serialize;

// == Cache Usage ==
/// What the store currently holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheUsage {
    /// Resident entries
    pub entries: usize,
    /// Sum of key and value bytes of resident entries
    pub bytes: i64,
    /// Cumulative removals (capacity, expiry and explicit)
    pub evictions: u64,
}

// == Group Stats ==
/// Immutable snapshot of a group's counters and store usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupStats {
    /// Group name
    pub name: String,
    /// Lookups served from the local cache
    pub hits: u64,
    /// Lookups that had to load
    pub misses: u64,
    /// Loads actually executed (after deduplication)
    pub loads: u64,
    /// Loads answered by a remote peer
    pub peer_loads: u64,
    /// Remote attempts that failed and fell back to the source
    pub peer_failures: u64,
    /// Loads answered by the source callback
    pub local_loads: u64,
    /// Resident entries
    pub entries: usize,
    /// Resident bytes
    pub cache_bytes: i64,
    /// Cumulative store removals
    pub evictions: u64,
}

impl GroupStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
