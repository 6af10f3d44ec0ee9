//! Pipeline persistence

use conveyor_core::domain::pipeline::Pipeline;

use super::{find_entity, load_entities, save_entity};
use crate::store::{Bucket, Store, StoreError};

pub async fn save(store: &dyn Store, pipeline: &Pipeline) -> Result<(), StoreError> {
    save_entity(store, Bucket::Pipelines, &pipeline.id, pipeline).await
}

pub async fn find(store: &dyn Store, id: &str) -> Result<Option<Pipeline>, StoreError> {
    find_entity(store, Bucket::Pipelines, id).await
}

pub async fn load_all(store: &dyn Store) -> Result<Vec<Pipeline>, StoreError> {
    load_entities(store, Bucket::Pipelines).await
}

pub async fn delete(store: &dyn Store, id: &str) -> Result<bool, StoreError> {
    store.delete(Bucket::Pipelines, id).await
}
