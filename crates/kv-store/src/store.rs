use async_trait::async_trait;

use crate::Result;

/// Core trait for key/value store backends.
///
/// The store holds one opaque blob per collection key and nothing else; it
/// performs no retries and takes no locks. Callers own retry policy. All
/// implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the blob stored under `key`.
    ///
    /// Returns `None` when the key is absent. Absence is an ordinary
    /// outcome, not an error.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, overwriting any previous blob.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Removes `key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}
