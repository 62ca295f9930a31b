//! Cache Module
//!
//! Byte-bounded LRU storage with lazy TTL expiration.

mod byteview;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use byteview::ByteView;
pub use entry::CacheEntry;
pub use lru::{ByteLen, EvictionCallback, LruStore};
pub use stats::{CacheUsage, GroupStats};
pub use store::CacheStore;
