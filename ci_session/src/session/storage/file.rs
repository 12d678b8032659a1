use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::errors::StorageError;
use super::types::{FileStorage, SessionStorage};
use crate::session::types::SessionId;

const FILE_PREFIX: &str = "ci_session";

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        tracing::info!("Using session directory {}", dir.display());
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{id}"))
    }

    fn temp_path_for(&self, id: &SessionId) -> PathBuf {
        self.dir
            .join(format!(".{FILE_PREFIX}{id}.{}.tmp", uuid::Uuid::new_v4()))
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn read(&self, id: &SessionId) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(id);
        tokio::fs::read(&path)
            .await
            .map_err(|e| StorageError::from_io(id.as_str(), e))
    }

    /// Writes to a temp file in the same directory, then renames it over the
    /// session file so a concurrent reader sees either the old or new payload.
    async fn write(&self, id: &SessionId, payload: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(id);
        let tmp = self.temp_path_for(id);

        if let Err(e) = tokio::fs::write(&tmp, payload).await {
            tracing::error!("Failed to write {}: {}", tmp.display(), e);
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::Io(e.to_string()));
        }

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            tracing::error!("Failed to rename {} to {}: {}", tmp.display(), path.display(), e);
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::Io(e.to_string()));
        }

        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<(), StorageError> {
        tokio::fs::remove_file(self.path_for(id))
            .await
            .map_err(|e| StorageError::from_io(id.as_str(), e))
    }
}
