//! In-memory store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Bucket, Store, StoreError};

/// Store that keeps everything in process memory
///
/// Used by tests and by ephemeral engines that do not need to survive a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<(Bucket, String), Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put(&self, bucket: Bucket, id: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert((bucket, id.to_string()), value);
        Ok(())
    }

    async fn get(&self, bucket: Bucket, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(bucket, id.to_string())).cloned())
    }

    async fn list(&self, bucket: Bucket) -> Result<Vec<Vec<u8>>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|((b, _), _)| *b == bucket)
            .map(|(_, value)| value.clone())
            .collect())
    }

    async fn delete(&self, bucket: Bucket, id: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(&(bucket, id.to_string())).is_some())
    }
}
