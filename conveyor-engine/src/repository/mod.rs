//! Entity repositories
//!
//! Translate between domain entities and the opaque bytes a [`Store`] keeps.
//! Entities are stored as field-tagged JSON.

pub mod jobs;
pub mod pipelines;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::store::{Bucket, Store, StoreError};

async fn save_entity<T: Serialize>(
    store: &dyn Store,
    bucket: Bucket,
    id: &str,
    entity: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(entity)?;
    store.put(bucket, id, bytes).await
}

async fn find_entity<T: DeserializeOwned>(
    store: &dyn Store,
    bucket: Bucket,
    id: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(bucket, id).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Decode every record in the bucket; undecodable records are logged and skipped
async fn load_entities<T: DeserializeOwned>(
    store: &dyn Store,
    bucket: Bucket,
) -> Result<Vec<T>, StoreError> {
    let mut entities = Vec::new();
    for bytes in store.list(bucket).await? {
        match serde_json::from_slice(&bytes) {
            Ok(entity) => entities.push(entity),
            Err(e) => warn!("Skipping corrupt record in {}: {}", bucket, e),
        }
    }
    Ok(entities)
}
