//! Peercache - an embeddable peer-replicated read-through cache
//!
//! Values are served from a byte-bounded LRU with optional TTL; misses are
//! loaded once per key, from the peer that owns the key on a consistent-hash
//! ring or from a caller-supplied source.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod group;
pub mod models;
pub mod peers;

pub use api::AppState;
pub use cache::{ByteView, GroupStats};
pub use config::Config;
pub use error::{CacheError, Result};
pub use group::{Getter, Group, GroupOptions, GroupRegistry};
pub use peers::{HttpPool, PeerGetter, PeerPicker};
