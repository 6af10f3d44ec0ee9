//! Persistence boundary
//!
//! The engine persists entities through the [`Store`] trait: opaque byte
//! values keyed by ID inside one bucket per entity kind. Serialization lives
//! in [`crate::repository`]; stores never look inside the bytes.

mod file;
mod memory;
mod postgres;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Namespace for one entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Jobs,
    Pipelines,
}

impl Bucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Jobs => "jobs",
            Bucket::Pipelines => "pipelines",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Key-value store over opaque byte values
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or replace the value stored under `id`
    async fn put(&self, bucket: Bucket, id: &str, value: Vec<u8>) -> Result<(), StoreError>;

    async fn get(&self, bucket: Bucket, id: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Every value in the bucket, in no particular order
    async fn list(&self, bucket: Bucket) -> Result<Vec<Vec<u8>>, StoreError>;

    /// Remove the value under `id`; returns whether there was one
    async fn delete(&self, bucket: Bucket, id: &str) -> Result<bool, StoreError>;
}
