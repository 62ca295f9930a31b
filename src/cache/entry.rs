//! Cache Entry Module
//!
//! Defines the value stored per key, with optional expiry.

use std::time::{Duration, Instant};

use crate::cache::{ByteLen, ByteView};

// == Cache Entry ==
/// A cached value plus its absolute expiry instant.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: ByteView,
    /// Expiration instant, None = never expires
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry. A zero `ttl` means the entry never expires, and
    /// so does one too large to represent as an instant.
    pub fn new(value: ByteView, ttl: Duration) -> Self {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Instant::now().checked_add(ttl)
        };

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Expired means strictly past the expiry instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a given instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }
}

impl ByteLen for CacheEntry {
    fn byte_len(&self) -> usize {
        self.value.len()
    }
}
