//! Peers Module
//!
//! Routing keys to the peer that owns them and fetching values from it.
//!
//! - [`PeerPicker`] decides which peer owns a key
//! - [`PeerGetter`] fetches a value from one peer
//! - [`HttpPool`] implements both over HTTP and serves the peer endpoint

mod hash_ring;
mod pool;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

pub use hash_ring::{HashFn, HashRing, DEFAULT_REPLICAS};
pub use pool::{HttpGetter, HttpPool, DEFAULT_BASE_PATH, DEFAULT_PEER_TIMEOUT};

// == Peer Getter ==
/// Fetches a value for `(group, key)` from one remote peer.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    /// Returns the raw value bytes, or `PeerUnavailable` on any failure.
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes>;
}

// == Peer Picker ==
/// Chooses the remote peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns None when the key should be loaded locally.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}
