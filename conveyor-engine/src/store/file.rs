//! File system store
//!
//! Entities are stored as individual JSON files, one directory per bucket:
//! ```text
//! {root}/
//! ├── jobs/
//! │   └── {id}.json
//! └── pipelines/
//!     └── {id}.json
//! ```
//! Writes go to a temporary file first and are renamed into place, so a
//! crash never leaves a truncated record behind.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{Bucket, Store, StoreError};

const EXTENSION: &str = "json";

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        for bucket in [Bucket::Jobs, Bucket::Pipelines] {
            fs::create_dir_all(root.join(bucket.as_str())).await?;
        }

        debug!("FileStore initialized at {:?}", root);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, bucket: Bucket, id: &str) -> Result<PathBuf, StoreError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' cannot be used as a file name", id),
            )
            .into());
        }
        Ok(self
            .root
            .join(bucket.as_str())
            .join(format!("{}.{}", id, EXTENSION)))
    }
}

#[async_trait]
impl Store for FileStore {
    async fn put(&self, bucket: Bucket, id: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let path = self.entry_path(bucket, id)?;
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;

        debug!("Saved {} '{}' to {:?}", bucket, id, path);
        Ok(())
    }

    async fn get(&self, bucket: Bucket, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.entry_path(bucket, id)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, bucket: Bucket) -> Result<Vec<Vec<u8>>, StoreError> {
        let mut values = Vec::new();
        let mut entries = fs::read_dir(self.root.join(bucket.as_str())).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            values.push(fs::read(&path).await?);
        }

        Ok(values)
    }

    async fn delete(&self, bucket: Bucket, id: &str) -> Result<bool, StoreError> {
        let path = self.entry_path(bucket, id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted {} '{}'", bucket, id);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
