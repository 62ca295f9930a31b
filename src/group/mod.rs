//! Group Module
//!
//! A group is a named cache plus the loader that fills it: local cache first,
//! then the peer owning the key, then the source callback.

mod getter;
mod loader;
mod registry;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::cache::{ByteView, CacheStore, GroupStats};
use crate::error::{CacheError, Result};
use crate::peers::{PeerGetter, PeerPicker};

pub use getter::Getter;
pub use loader::SingleFlight;
pub use registry::GroupRegistry;

// == Group Options ==
/// Per-group settings fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    /// TTL applied to every populated entry, zero = never expires
    pub ttl: Duration,
}

impl GroupOptions {
    /// Sets the default per-entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    peer_loads: AtomicU64,
    peer_failures: AtomicU64,
    local_loads: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

// == Group ==
/// Named read-through cache.
///
/// Created through [`GroupRegistry`] so the peer server can find it by name.
pub struct Group {
    name: String,
    getter: Arc<dyn Getter>,
    main_cache: CacheStore,
    peers: OnceCell<Arc<dyn PeerPicker>>,
    loader: SingleFlight<ByteView>,
    default_ttl: Duration,
    counters: Counters,
}

impl Group {
    pub(crate) fn new(
        name: &str,
        cache_bytes: i64,
        getter: Arc<dyn Getter>,
        options: GroupOptions,
    ) -> Self {
        Self {
            name: name.to_string(),
            getter,
            main_cache: CacheStore::new(cache_bytes),
            peers: OnceCell::new(),
            loader: SingleFlight::new(),
            default_ttl: options.ttl,
            counters: Counters::default(),
        }
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    // == Get ==
    /// Returns the value for `key`, loading it on a miss.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        if let Some(value) = self.main_cache.get(key) {
            bump(&self.counters.hits);
            debug!(group = %self.name, key, "cache hit");
            return Ok(value);
        }

        bump(&self.counters.misses);
        self.load(key).await
    }

    // == Register Peers ==
    /// Associates the peer picker used to route misses.
    ///
    /// # Panics
    /// If called more than once: re-registering would reroute keys mid-flight.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) {
        if self.peers.set(peers).is_err() {
            panic!("peer picker already registered for group {}", self.name);
        }
    }

    // == Get Many ==
    /// Resolves each key independently through [`get`](Self::get).
    ///
    /// Returns found values and per-key errors; one key failing does not
    /// affect the others.
    pub async fn get_many<S: AsRef<str>>(
        &self,
        keys: &[S],
    ) -> (HashMap<String, ByteView>, HashMap<String, CacheError>) {
        let mut values = HashMap::with_capacity(keys.len());
        let mut errors = HashMap::new();

        for key in keys {
            let key = key.as_ref();
            match self.get(key).await {
                Ok(value) => {
                    values.insert(key.to_string(), value);
                }
                Err(err) => {
                    errors.insert(key.to_string(), err);
                }
            }
        }
        (values, errors)
    }

    // == Remove ==
    /// Drops a key from the local cache only; peers are not told.
    pub fn remove(&self, key: &str) {
        self.main_cache.remove(key);
    }

    /// Drops several keys from the local cache.
    pub fn remove_many<S: AsRef<str>>(&self, keys: &[S]) {
        for key in keys {
            self.main_cache.remove(key.as_ref());
        }
    }

    // == Stats ==
    /// Snapshot of counters and cache usage.
    pub fn stats(&self) -> GroupStats {
        let usage = self.main_cache.usage();
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        GroupStats {
            name: self.name.clone(),
            hits: load(&self.counters.hits),
            misses: load(&self.counters.misses),
            loads: load(&self.counters.loads),
            peer_loads: load(&self.counters.peer_loads),
            peer_failures: load(&self.counters.peer_failures),
            local_loads: load(&self.counters.local_loads),
            entries: usage.entries,
            cache_bytes: usage.bytes,
            evictions: usage.evictions,
        }
    }

    // == Load ==
    async fn load(&self, key: &str) -> Result<ByteView> {
        self.loader
            .run(key, || async {
                bump(&self.counters.loads);

                if let Some(peer) = self.peers.get().and_then(|peers| peers.pick_peer(key)) {
                    match self.get_from_peer(peer.as_ref(), key).await {
                        Ok(value) => {
                            bump(&self.counters.peer_loads);
                            self.populate_cache(key, value.clone());
                            return Ok(value);
                        }
                        Err(err) => {
                            bump(&self.counters.peer_failures);
                            warn!(group = %self.name, key, error = %err, "failed to get from peer");
                        }
                    }
                }

                self.get_locally(key).await
            })
            .await
    }

    async fn get_from_peer(&self, peer: &dyn PeerGetter, key: &str) -> Result<ByteView> {
        let bytes = peer.fetch(&self.name, key).await?;
        Ok(ByteView::from_owned(bytes))
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView> {
        bump(&self.counters.local_loads);

        let bytes = self.getter.get(key).await.map_err(|err| {
            debug!(group = %self.name, key, error = %err, "source has no value");
            CacheError::NotFound(key.to_string())
        })?;

        let value = ByteView::copy_from(&bytes);
        self.populate_cache(key, value.clone());
        Ok(value)
    }

    fn populate_cache(&self, key: &str, value: ByteView) {
        self.main_cache.add(key, value, self.default_ttl);
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("default_ttl", &self.default_ttl)
            .field("peers_registered", &self.peers.get().is_some())
            .field("main_cache", &self.main_cache)
            .finish()
    }
}
