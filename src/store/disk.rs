use super::KeyValueStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

/// Fjall-backed store; every write is synced before returning.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path, partition: &str) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open keyspace at {}", path.display()))?;
        let partition = keyspace
            .open_partition(partition, PartitionCreateOptions::default())
            .with_context(|| format!("Failed to open partition: {partition}"))?;

        debug!("Opened disk store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl KeyValueStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .partition
            .get(key)
            .with_context(|| format!("Failed to read key: {key}"))?;
        debug!(key, hit = value.is_some(), "Store GET");

        value
            .map(|bytes| String::from_utf8(bytes.to_vec()))
            .transpose()
            .with_context(|| format!("Stored value for {key} is not UTF-8"))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.partition
            .insert(key, value)
            .with_context(|| format!("Failed to write key: {key}"))?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(key, "Store PUT");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.partition
            .remove(key)
            .with_context(|| format!("Failed to remove key: {key}"))?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(key, "Store REMOVE");
        Ok(())
    }
}
