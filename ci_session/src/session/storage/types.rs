use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

use super::errors::StorageError;
use crate::session::types::SessionId;

/// Session files in one directory, named `ci_session{id}` like CodeIgniter's
/// file driver.
pub struct FileStorage {
    pub(super) dir: PathBuf,
}

/// Process-local storage, for tests and demos without a PHP side.
pub struct MemoryStorage {
    pub(super) entries: Mutex<HashMap<String, Vec<u8>>>,
}

/// Where serialized session payloads live.
#[async_trait]
pub trait SessionStorage: Send + Sync + 'static {
    /// Read the raw payload. A missing session is [`StorageError::NotFound`].
    async fn read(&self, id: &SessionId) -> Result<Vec<u8>, StorageError>;

    /// Replace the payload. Readers never observe a partial write.
    async fn write(&self, id: &SessionId, payload: &[u8]) -> Result<(), StorageError>;

    /// Delete the payload. A missing session is [`StorageError::NotFound`].
    async fn remove(&self, id: &SessionId) -> Result<(), StorageError>;
}
