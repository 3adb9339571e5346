use super::KeyValueStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Volatile store, used where nothing should outlive the process.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.inner.lock().await;
        let value = entries.get(key).cloned();
        debug!(key, hit = value.is_some(), "Store GET");
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.inner.lock().await;
        debug!(key, "Store PUT");
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.inner.lock().await;
        entries.remove(key);
        debug!(key, "Store REMOVE");
        Ok(())
    }
}
