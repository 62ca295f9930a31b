//! Consistent Hash Ring
//!
//! Maps keys onto peer identifiers through virtual nodes on a sorted ring.

use std::fmt;
use std::sync::Arc;

/// 32-bit hash used to place virtual nodes and keys on the ring.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// Virtual nodes per peer when none is configured.
pub const DEFAULT_REPLICAS: usize = 50;

// == Hash Ring ==
/// Consistent-hash ring of `(hash, peer)` points sorted by hash.
///
/// Each peer contributes `replicas` points, placed at
/// `hash("{i}{peer}")` for `i` in `0..replicas`.
#[derive(Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    points: Vec<(u32, String)>,
}

impl HashRing {
    // == Constructors ==
    /// Creates an empty ring hashing with CRC-32C.
    pub fn new(replicas: usize) -> Self {
        Self::with_hash(replicas, Arc::new(crc32c::crc32c))
    }

    /// Creates an empty ring with a custom hash function.
    pub fn with_hash(replicas: usize, hash: HashFn) -> Self {
        let replicas = if replicas == 0 {
            DEFAULT_REPLICAS
        } else {
            replicas
        };
        Self {
            hash,
            replicas,
            points: Vec::new(),
        }
    }

    // == Set Peers ==
    /// Replaces the ring contents with the given peers.
    pub fn set_peers<S: AsRef<str>>(&mut self, peers: &[S]) {
        self.points.clear();
        self.points.reserve(peers.len() * self.replicas);

        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let point = (self.hash)(format!("{i}{peer}").as_bytes());
                self.points.push((point, peer.to_string()));
            }
        }
        self.points.sort_by_key(|(point, _)| *point);
    }

    // == Get ==
    /// Returns the peer owning `key`, or None if the ring is empty.
    ///
    /// The owner is the first point at or after the key's hash, wrapping
    /// around to the start of the ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.points.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.points.partition_point(|(point, _)| *point < hash);
        let (_, peer) = &self.points[idx % self.points.len()];
        Some(peer.as_str())
    }

    // == Introspection ==
    /// Returns true if no peers are registered.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("points", &self.points.len())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    /// Hashes decimal strings to their numeric value.
    fn numeric_ring(replicas: usize) -> HashRing {
        HashRing::with_hash(
            replicas,
            Arc::new(|data: &[u8]| std::str::from_utf8(data).unwrap().parse::<u32>().unwrap()),
        )
    }

    #[test]
    fn test_empty_ring() {
        let ring = HashRing::new(DEFAULT_REPLICAS);
        assert!(ring.is_empty());
        assert_eq!(ring.get("anything"), None);
    }

    #[test]
    fn test_ring_lookup_and_wraparound() {
        let mut ring = numeric_ring(3);
        // Points: 2, 4, 6, 12, 14, 16, 22, 24, 26
        ring.set_peers(&["6", "4", "2"]);

        assert_eq!(ring.get("2"), Some("2"));
        assert_eq!(ring.get("11"), Some("2"));
        assert_eq!(ring.get("23"), Some("4"));
        assert_eq!(ring.get("27"), Some("2"));
    }

    #[test]
    fn test_set_peers_replaces() {
        let mut ring = numeric_ring(3);
        ring.set_peers(&["6", "4", "2"]);
        ring.set_peers(&["8"]);

        // Points: 8, 18, 28
        assert_eq!(ring.get("2"), Some("8"));
        assert_eq!(ring.get("11"), Some("8"));
        assert_eq!(ring.get("27"), Some("8"));
    }

    #[test]
    fn test_zero_replicas_uses_default() {
        let mut ring = HashRing::new(0);
        ring.set_peers(&["a", "b"]);
        assert_eq!(ring.points.len(), 2 * DEFAULT_REPLICAS);
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let mut ring = HashRing::new(DEFAULT_REPLICAS);
        ring.set_peers(&["http://a:8001", "http://b:8002", "http://c:8003"]);

        for i in 0..100 {
            let key = format!("user_{i:06}");
            assert_eq!(ring.get(&key), ring.get(&key));
        }
    }
}
