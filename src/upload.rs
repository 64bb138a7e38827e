//! Upload storage.
//!
//! The [`upload`](crate::middleware::upload) middleware hands each received
//! file to an [`UploadStore`] and attaches the returned [`StoredFile`] to the
//! request. Where and how bytes land is the store's business.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

use crate::error::Error;

/// A file read from a multipart body, not yet stored.
#[derive(Clone, Debug)]
pub struct IncomingFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Where a store put a file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredFile {
    /// Storage path as reported by the store, e.g. `public/uploads/3f2a…`.
    pub path: String,
    pub original_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[async_trait]
pub trait UploadStore: Send + Sync {
    async fn store(&self, file: IncomingFile) -> Result<StoredFile, Error>;
}

/// Writes each upload to `{dir}/{random id}`.
#[derive(Clone, Debug)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl UploadStore for DiskStore {
    async fn store(&self, file: IncomingFile) -> Result<StoredFile, Error> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let target = self.dir.join(Uuid::new_v4().simple().to_string());
        tokio::fs::write(&target, &file.data).await?;
        debug!(path = %target.display(), size = file.data.len(), "stored upload");

        Ok(StoredFile {
            path: target.to_string_lossy().replace('\\', "/"),
            original_name: file.file_name,
            content_type: file.content_type,
            size: file.data.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disk_store_writes_under_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DiskStore::new(tmp.path().join("uploads"));

        let stored = store
            .store(IncomingFile {
                field: "file".into(),
                file_name: Some("cv.pdf".into()),
                content_type: Some("application/pdf".into()),
                data: Bytes::from_static(b"%PDF-1.7"),
            })
            .await
            .unwrap();

        assert!(stored.path.contains("uploads/"));
        assert_eq!(stored.size, 8);
        assert_eq!(stored.original_name.as_deref(), Some("cv.pdf"));
        assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), b"%PDF-1.7");
    }
}
