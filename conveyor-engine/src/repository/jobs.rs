//! Job persistence

use conveyor_core::domain::job::Job;

use super::{find_entity, load_entities, save_entity};
use crate::store::{Bucket, Store, StoreError};

pub async fn save(store: &dyn Store, job: &Job) -> Result<(), StoreError> {
    save_entity(store, Bucket::Jobs, &job.id, job).await
}

pub async fn find(store: &dyn Store, id: &str) -> Result<Option<Job>, StoreError> {
    find_entity(store, Bucket::Jobs, id).await
}

pub async fn load_all(store: &dyn Store) -> Result<Vec<Job>, StoreError> {
    load_entities(store, Bucket::Jobs).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_save_and_find() {
        let store = MemoryStore::new();
        let job = Job::new("j1", "echo", vec!["hello".to_string()]);

        save(&store, &job).await.unwrap();
        let found = find(&store, "j1").await.unwrap();
        assert_eq!(found, Some(job));
        assert!(find(&store, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_all_skips_corrupt_records() {
        let store = MemoryStore::new();
        save(&store, &Job::new("ok", "true", vec![])).await.unwrap();
        store
            .put(Bucket::Jobs, "broken", b"{not json".to_vec())
            .await
            .unwrap();

        let jobs = load_all(&store).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "ok");
    }
}
