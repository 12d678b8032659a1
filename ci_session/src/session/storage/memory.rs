use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::errors::StorageError;
use super::types::{MemoryStorage, SessionStorage};
use crate::session::types::SessionId;

impl MemoryStorage {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory session storage");
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn read(&self, id: &SessionId) -> Result<Vec<u8>, StorageError> {
        self.entries
            .lock()
            .await
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn write(&self, id: &SessionId, payload: &[u8]) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .insert(id.to_string(), payload.to_vec());
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }
}
