//! ByteView Module
//!
//! Immutable view over cached bytes.

use std::fmt;

use bytes::Bytes;

// == ByteView ==
/// Read-only cached value.
///
/// Always owns its bytes: anything coming from a caller is copied on the way
/// in, so later writes to the caller's buffer never show up in the cache.
/// Cloning is cheap (reference counted).
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    // == Constructors ==
    /// Copies `data` into a new view.
    pub fn copy_from(data: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(data),
        }
    }

    /// Wraps an already-owned buffer without copying.
    ///
    /// Used for bodies received from peers, which nobody else holds.
    pub fn from_owned(bytes: Bytes) -> Self {
        Self { bytes }
    }

    // == Accessors ==
    /// Number of bytes in the view.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the view holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow the raw bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns a fresh copy of the bytes that the caller may mutate freely.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Cheap handle on the underlying buffer, for writing into responses.
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView")
            .field("len", &self.bytes.len())
            .field("value", &String::from_utf8_lossy(&self.bytes))
            .finish()
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> Self {
        Self::copy_from(s.as_bytes())
    }
}

impl From<&[u8]> for ByteView {
    fn from(data: &[u8]) -> Self {
        Self::copy_from(data)
    }
}
