use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blob store seam. The domain only needs put/delete; everything else
/// (serving, signing, retention) belongs to the storage backend.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Fresh storage key under an entity prefix, e.g. `tenders/<id>/<uuid>`.
pub fn blob_key(prefix: &str) -> String {
    format!("{}/{}", prefix, uuid::Uuid::new_v4())
}

/// Local-disk backend: blobs live under `root`, keyed by
/// `<entity>/<uuid>` relative paths.
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStorage for FsStorage {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(%key, size = bytes.len(), "Stored blob");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        tokio::fs::remove_file(self.path_for(key)).await?;
        debug!(%key, "Deleted blob");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let key = blob_key("tender-docs");

        storage.put(&key, b"contract drawings").await.unwrap();
        assert_eq!(
            tokio::fs::read(dir.path().join(&key)).await.unwrap(),
            b"contract drawings"
        );

        storage.delete(&key).await.unwrap();
        assert!(!dir.path().join(&key).exists());
    }

    #[tokio::test]
    async fn delete_of_missing_blob_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        assert!(storage.delete("tender-docs/nope").await.is_err());
    }
}
