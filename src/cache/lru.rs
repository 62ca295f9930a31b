//! LRU Store Module
//!
//! Byte-bounded map ordered by recency of use.
//!
//! Nodes live in a slab (`Vec<Option<Node>>`) and link to each other by
//! index, which gives O(1) promote, O(1) evict-from-back and O(1) removal by
//! key without any unsafe pointer juggling.

use std::collections::HashMap;
use std::fmt;

// == Byte Length ==
/// Values stored in an [`LruStore`] report their size for byte accounting.
pub trait ByteLen {
    /// Number of bytes this value accounts for.
    fn byte_len(&self) -> usize;
}

impl ByteLen for String {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteLen for Vec<u8> {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteLen for crate::cache::ByteView {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

/// Called with every entry leaving the store, whatever the reason.
pub type EvictionCallback<V> = Box<dyn FnMut(&str, &V) + Send + Sync>;

#[derive(Debug)]
struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Store ==
/// Fixed byte-budget store with least-recently-used eviction.
///
/// - Head = most recently used
/// - Tail = least recently used
///
/// Each entry costs `key.len() + value.byte_len()` bytes. A budget of zero or
/// less disables eviction.
pub struct LruStore<V> {
    /// Byte budget, <= 0 means unbounded
    max_bytes: i64,
    /// Sum of key and value sizes of resident entries
    used_bytes: i64,
    nodes: Vec<Option<Node<V>>>,
    /// Reusable slots in `nodes`
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    index: HashMap<String, usize>,
    on_evicted: Option<EvictionCallback<V>>,
}

impl<V: ByteLen> LruStore<V> {
    // == Constructors ==
    /// Creates an empty store with the given byte budget.
    pub fn new(max_bytes: i64) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            index: HashMap::new(),
            on_evicted: None,
        }
    }

    /// Creates an empty store that reports every removal to `on_evicted`.
    pub fn with_eviction_callback<F>(max_bytes: i64, on_evicted: F) -> Self
    where
        F: FnMut(&str, &V) + Send + Sync + 'static,
    {
        let mut store = Self::new(max_bytes);
        store.on_evicted = Some(Box::new(on_evicted));
        store
    }

    // == Get ==
    /// Looks up a key and marks it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.detach(idx);
        self.push_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    // == Peek ==
    /// Looks up a key without touching its recency.
    pub fn peek(&self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    // == Add ==
    /// Inserts or replaces a value and marks it most recently used.
    ///
    /// Evicts from the tail afterwards until the store fits its budget.
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        let new_len = value.byte_len() as i64;

        if let Some(&idx) = self.index.get(&key) {
            let Some(node) = self.node_mut(idx) else {
                return;
            };
            let old_len = node.value.byte_len() as i64;
            node.value = value;
            self.used_bytes += new_len - old_len;
            self.detach(idx);
            self.push_front(idx);
        } else {
            self.used_bytes += key.len() as i64 + new_len;
            let node = Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            };
            let idx = match self.free.pop() {
                Some(slot) => {
                    self.nodes[slot] = Some(node);
                    slot
                }
                None => {
                    self.nodes.push(Some(node));
                    self.nodes.len() - 1
                }
            };
            self.index.insert(key, idx);
            self.push_front(idx);
        }

        while self.max_bytes > 0 && self.used_bytes > self.max_bytes {
            if !self.remove_oldest() {
                break;
            }
        }
    }

    // == Remove Oldest ==
    /// Evicts the least recently used entry. Returns false if empty.
    pub fn remove_oldest(&mut self) -> bool {
        match self.tail {
            Some(idx) => self.remove_node(idx).is_some(),
            None => false,
        }
    }

    // == Remove Key ==
    /// Removes a specific key, returning its value. No-op if absent.
    ///
    /// The eviction callback fires here too.
    pub fn remove_key(&mut self, key: &str) -> Option<V> {
        let idx = *self.index.get(key)?;
        self.remove_node(idx).map(|(_, value)| value)
    }

    // == Introspection ==
    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bytes currently accounted for.
    pub fn bytes(&self) -> i64 {
        self.used_bytes
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.nodes[cursor?].as_ref()?;
            cursor = node.next;
            Some((node.key.as_str(), &node.value))
        })
    }

    // == List Plumbing ==
    // Linked and indexed slots are always occupied
    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<V>> {
        let node = self.nodes.get_mut(idx).and_then(Option::as_mut);
        debug_assert!(node.is_some(), "lru slot {idx} is vacant");
        node
    }

    fn detach(&mut self, idx: usize) {
        let Some(node) = self.node_mut(idx) else {
            return;
        };
        let (prev, next) = (node.prev.take(), node.next.take());

        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        let Some(node) = self.node_mut(idx) else {
            return;
        };
        node.prev = None;
        node.next = old_head;

        match old_head {
            Some(h) => {
                if let Some(node) = self.node_mut(h) {
                    node.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn remove_node(&mut self, idx: usize) -> Option<(String, V)> {
        self.detach(idx);
        let node = self.nodes.get_mut(idx)?.take()?;
        self.free.push(idx);
        self.index.remove(&node.key);
        self.used_bytes -= (node.key.len() + node.value.byte_len()) as i64;

        if let Some(callback) = self.on_evicted.as_mut() {
            callback(&node.key, &node.value);
        }
        Some((node.key, node.value))
    }
}

impl<V> fmt::Debug for LruStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStore")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.index.len())
            .finish()
    }
}
