use std::sync::Arc;

use crate::config::SessionConfig;

use super::errors::SessionError;
use super::record::SessionRecord;
use super::storage::{FileStorage, SessionStorage};
use super::types::{SessionData, SessionId};

/// Loads, creates, persists and deletes session records.
///
/// Cloning is cheap; clones share the same storage.
#[derive(Clone)]
pub struct SessionStore {
    config: SessionConfig,
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    /// Store backed by `ci_session{id}` files in `config.session_dir`.
    pub fn new(config: SessionConfig) -> Self {
        let storage = Arc::new(FileStorage::new(config.session_dir.clone()));
        Self { config, storage }
    }

    pub fn with_storage(config: SessionConfig, storage: Arc<dyn SessionStorage>) -> Self {
        Self { config, storage }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Reads and decodes the session `id`.
    ///
    /// A missing session is `NotFound`; bytes that are not PHP session data
    /// are `Decode`, never an empty session.
    pub async fn load(&self, id: &SessionId) -> Result<SessionRecord, SessionError> {
        let payload = self.storage.read(id).await.inspect_err(|e| {
            tracing::debug!("Failed to read session {}: {}", id, e);
        })?;
        let data = SessionData::decode(&payload).inspect_err(|e| {
            tracing::warn!("Session {} is not valid PHP session data: {}", id, e);
        })?;
        tracing::debug!("Loaded session {} ({} variables)", id, data.len());
        Ok(SessionRecord::new(id.clone(), data, self.storage.clone()))
    }

    /// New, empty, not yet persisted session with a random id.
    pub fn create(&self) -> Result<SessionRecord, SessionError> {
        let id = SessionId::generate()?;
        tracing::debug!("Created session {}", id);
        Ok(SessionRecord::new(id, SessionData::new(), self.storage.clone()))
    }

    /// Stamps `__ci_last_regenerate` and writes the record back.
    pub async fn persist(&self, record: &SessionRecord) -> Result<(), SessionError> {
        record.persist().await.inspect_err(|e| {
            tracing::error!("Failed to persist session {}: {}", record.id(), e);
        })
    }

    /// Removes the session's backing data, e.g. on logout.
    pub async fn delete(&self, id: &SessionId) -> Result<(), SessionError> {
        self.storage.remove(id).await?;
        tracing::debug!("Deleted session {}", id);
        Ok(())
    }

    /// Removes the backing data and stops `record` from being written back.
    pub async fn destroy(&self, record: &SessionRecord) -> Result<(), SessionError> {
        record.destroy().await?;
        tracing::debug!("Destroyed session {}", record.id());
        Ok(())
    }
}
