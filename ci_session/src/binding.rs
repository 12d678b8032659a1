//! Turns a transport-level token into a session record and back.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;

use crate::config::SessionConfig;
use crate::session::{SessionError, SessionId, SessionRecord, SessionStorage, SessionStore};

/// Entry point for request handling code.
///
/// Persistence is never automatic: call [`persist`](Self::persist) once the
/// request is done with the record, or run the request inside
/// [`scoped`](Self::scoped).
#[derive(Clone)]
pub struct SessionBinding {
    store: SessionStore,
}

impl SessionBinding {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            store: SessionStore::new(config),
        }
    }

    pub fn with_storage(config: SessionConfig, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            store: SessionStore::with_storage(config, storage),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        self.store.config()
    }

    /// Loads the session named by an untrusted cookie value.
    ///
    /// Empty or malformed tokens are `InvalidArgument`. Sessions whose
    /// `__ci_last_regenerate` is older than the configured expiry are
    /// `Expired`; sessions without the stamp are accepted.
    #[tracing::instrument(skip(self, token))]
    pub async fn resolve_from_token(&self, token: &str) -> Result<Arc<SessionRecord>, SessionError> {
        let id = SessionId::parse(token).inspect_err(|e| {
            tracing::debug!("Rejected session token: {}", e);
        })?;
        let record = self.store.load(&id).await?;
        self.check_expiry(&record).await?;
        Ok(Arc::new(record))
    }

    /// New session; its id is what the caller puts in the cookie.
    pub fn create_and_bind(&self) -> Result<Arc<SessionRecord>, SessionError> {
        Ok(Arc::new(self.store.create()?))
    }

    pub async fn persist(&self, record: &SessionRecord) -> Result<(), SessionError> {
        self.store.persist(record).await
    }

    /// Deletes the session behind `record` and keeps it from being written
    /// back by a later persist.
    pub async fn destroy(&self, record: &SessionRecord) -> Result<(), SessionError> {
        self.store.destroy(record).await
    }

    /// Deletes the backing file of a session that was never loaded.
    pub async fn delete(&self, id: &SessionId) -> Result<(), SessionError> {
        self.store.delete(id).await
    }

    /// Runs `f` with the record and persists afterwards, whether `f`
    /// succeeded or failed.
    ///
    /// If `f` fails, its error is returned and a persistence failure is only
    /// logged.
    pub async fn scoped<F, Fut, T, E>(&self, record: Arc<SessionRecord>, f: F) -> Result<T, E>
    where
        F: FnOnce(Arc<SessionRecord>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<SessionError>,
    {
        let result = f(record.clone()).await;
        let persisted = self.persist(&record).await;
        match (result, persisted) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(E::from(e)),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(persist_err)) => {
                tracing::error!(
                    "Failed to persist session {} after error: {}",
                    record.id(),
                    persist_err
                );
                Err(e)
            }
        }
    }

    async fn check_expiry(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let Some(last) = record.last_regenerate().await else {
            return Ok(());
        };
        let age = Utc::now().timestamp().saturating_sub(last);
        let expiry = i64::try_from(self.config().expiry_secs).unwrap_or(i64::MAX);
        if age > expiry {
            tracing::debug!("Session {} expired {}s ago", record.id(), age);
            return Err(SessionError::Expired);
        }
        Ok(())
    }
}
