pub mod disk;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// A string key-value store for locally persisted client state.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
