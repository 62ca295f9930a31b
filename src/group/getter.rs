//! Source Callback
//!
//! Where a group loads values from when neither its cache nor a peer has them.

use async_trait::async_trait;

// == Getter ==
/// Loads the authoritative value for a key.
///
/// Called at most once per key per in-flight window, but concurrently for
/// different keys. Implementations should not cache on their own.
#[async_trait]
pub trait Getter: Send + Sync {
    /// Returns the value bytes, or an error if the key does not exist.
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

/// Plain synchronous closures are getters.
#[async_trait]
impl<F> Getter for F
where
    F: Fn(&str) -> anyhow::Result<Vec<u8>> + Send + Sync,
{
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        self(key)
    }
}
