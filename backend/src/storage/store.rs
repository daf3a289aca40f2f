//! Key-value store abstraction (browser `localStorage` equivalent).

use super::error::StorageResult;

/// String blobs addressed by key.
///
/// Implementations must be safe to share between request handlers; writes are
/// durable once `set`/`remove` return `Ok`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;
}
