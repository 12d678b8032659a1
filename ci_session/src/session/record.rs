use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;

use crate::php::PhpValue;

use super::errors::SessionError;
use super::storage::{SessionStorage, StorageError};
use super::types::{CI_LAST_REGENERATE_KEY, CI_VARS_KEY, CiVarMark, CiVars, SessionData, SessionId};

/// One session, loaded or freshly created.
///
/// All field access goes through an instance-wide lock, so concurrent tasks
/// sharing one `Arc<SessionRecord>` never lose each other's updates. Two
/// records loaded separately for the same id are independent copies: the
/// last one persisted wins.
pub struct SessionRecord {
    id: SessionId,
    data: Mutex<SessionData>,
    storage: Arc<dyn SessionStorage>,
    destroyed: AtomicBool,
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("id", &self.id)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

fn require_key(key: &str) -> Result<(), SessionError> {
    if key.is_empty() {
        return Err(SessionError::InvalidArgument(
            "Key cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Keys that PHP's session encoder could not write back.
fn require_writable_key(key: &str) -> Result<(), SessionError> {
    require_key(key)?;
    if key.contains(['|', '!']) {
        return Err(SessionError::InvalidArgument(format!(
            "Key cannot contain '|' or '!': {key}"
        )));
    }
    Ok(())
}

impl SessionRecord {
    pub(crate) fn new(id: SessionId, data: SessionData, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            id,
            data: Mutex::new(data),
            storage,
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Copy of every variable, reserved ones included.
    pub async fn snapshot(&self) -> SessionData {
        self.data.lock().await.clone()
    }

    /// In-memory lookup.
    pub async fn get(&self, key: &str) -> Result<PhpValue, SessionError> {
        require_key(key)?;
        self.data
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(format!("session key {key}")))
    }

    /// Same as [`get`](Self::get); CodeIgniter's `userdata()`.
    pub async fn get_user_data(&self, key: &str) -> Result<PhpValue, SessionError> {
        self.get(key).await
    }

    /// Re-reads the backing file before looking `key` up.
    ///
    /// The freshly decoded data replaces the in-memory copy, so mutations not
    /// yet persisted are discarded.
    pub async fn get_fresh(&self, key: &str) -> Result<PhpValue, SessionError> {
        require_key(key)?;
        let mut data = self.data.lock().await;
        let payload = self.storage.read(&self.id).await?;
        *data = SessionData::decode(&payload).inspect_err(|e| {
            tracing::warn!("Failed to decode session {}: {}", self.id, e);
        })?;
        data.get(key)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(format!("session key {key}")))
    }

    pub async fn has(&self, key: &str) -> bool {
        self.data.lock().await.contains_key(key)
    }

    pub async fn set_user_data(
        &self,
        key: &str,
        value: impl Into<PhpValue>,
    ) -> Result<(), SessionError> {
        require_writable_key(key)?;
        self.data.lock().await.insert(key, value);
        Ok(())
    }

    /// Removes a variable together with any flash or tempdata marker.
    pub async fn unset_user_data(&self, key: &str) -> Result<Option<PhpValue>, SessionError> {
        require_key(key)?;
        let mut data = self.data.lock().await;
        data.unmark_ci_var(key)?;
        Ok(data.remove(key))
    }

    /// Stores `value` and marks it `new` in `__ci_vars`.
    pub async fn set_flash(
        &self,
        key: &str,
        value: impl Into<PhpValue>,
    ) -> Result<(), SessionError> {
        require_writable_key(key)?;
        let mut data = self.data.lock().await;
        data.merge_ci_var(key, CiVarMark::New)?;
        data.insert(key, value);
        Ok(())
    }

    /// Returns a flash value and consumes it.
    ///
    /// The value is removed from the session right away and its marker set
    /// to `old`. A missing key yields an empty string without touching the
    /// session.
    pub async fn get_flash(&self, key: &str) -> Result<PhpValue, SessionError> {
        require_key(key)?;
        let mut data = self.data.lock().await;
        if !data.contains_key(key) {
            return Ok(PhpValue::from(""));
        }
        data.merge_ci_var(key, CiVarMark::Old)?;
        Ok(data.remove(key).unwrap_or(PhpValue::Null))
    }

    /// [`get_flash`](Self::get_flash) rendered as a string.
    pub async fn get_flash_string(&self, key: &str) -> Result<String, SessionError> {
        Ok(self.get_flash(key).await?.to_string())
    }

    /// Stores `value` as tempdata that expires `ttl_secs` from now.
    pub async fn set_tempdata(
        &self,
        key: &str,
        value: impl Into<PhpValue>,
        ttl_secs: i64,
    ) -> Result<(), SessionError> {
        require_writable_key(key)?;
        let expires_at = Utc::now().timestamp().saturating_add(ttl_secs);
        let mut data = self.data.lock().await;
        data.merge_ci_var(key, CiVarMark::ExpiresAt(expires_at))?;
        data.insert(key, value);
        Ok(())
    }

    /// Returns tempdata that has not expired. Expired entries are dropped
    /// together with their marker and reported as `NotFound`.
    pub async fn get_tempdata(&self, key: &str) -> Result<PhpValue, SessionError> {
        require_key(key)?;
        let mut data = self.data.lock().await;
        let not_found = || SessionError::NotFound(format!("tempdata {key}"));

        let Some(CiVarMark::ExpiresAt(expires_at)) = data.ci_vars()?.mark(key) else {
            return Err(not_found());
        };
        if expires_at < Utc::now().timestamp() {
            tracing::debug!("Tempdata {} in session {} expired", key, self.id);
            data.unmark_ci_var(key)?;
            data.remove(key);
            return Err(not_found());
        }
        data.get(key).cloned().ok_or_else(not_found)
    }

    pub async fn ci_vars(&self) -> Result<CiVars, SessionError> {
        self.data.lock().await.ci_vars()
    }

    pub async fn flash_keys(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.ci_vars().await?.flash_keys())
    }

    pub async fn last_regenerate(&self) -> Option<i64> {
        self.data.lock().await.last_regenerate()
    }

    /// Stamps `__ci_last_regenerate`, encodes and writes the session.
    ///
    /// Holds the instance lock across the write, so a persist never
    /// interleaves with a mutation on the same record. A destroyed record is
    /// not written back.
    pub(crate) async fn persist(&self) -> Result<(), SessionError> {
        let mut data = self.data.lock().await;
        if self.is_destroyed() {
            tracing::debug!("Skipping persist of destroyed session {}", self.id);
            return Ok(());
        }
        data.insert(CI_LAST_REGENERATE_KEY, Utc::now().timestamp());
        let payload = data.encode()?;
        self.storage.write(&self.id, payload.as_bytes()).await?;
        tracing::debug!("Persisted session {} ({} variables)", self.id, data.len());
        Ok(())
    }

    pub(crate) async fn destroy(&self) -> Result<(), SessionError> {
        let _data = self.data.lock().await;
        match self.storage.remove(&self.id).await {
            Ok(()) | Err(StorageError::NotFound(_)) => {
                self.destroyed.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// True once any flash or tempdata operation has created `__ci_vars`.
    pub async fn has_ci_vars(&self) -> bool {
        self.has(CI_VARS_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::storage::MemoryStorage;

    fn new_record() -> SessionRecord {
        SessionRecord::new(
            SessionId::parse("test_record").unwrap(),
            SessionData::new(),
            Arc::new(MemoryStorage::new()),
        )
    }

    #[tokio::test]
    async fn test_set_and_get_user_data() {
        let record = new_record();

        record.set_user_data("uid", "42").await.unwrap();
        record.set_user_data("count", 3).await.unwrap();

        assert_eq!(record.get("uid").await.unwrap(), PhpValue::from("42"));
        assert_eq!(record.get_user_data("count").await.unwrap(), PhpValue::Int(3));
        assert!(!record.has_ci_vars().await);
    }

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let record = new_record();

        let result = record.get("missing").await;

        assert!(matches!(result, Err(SessionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected_without_mutation() {
        let record = new_record();

        assert!(matches!(
            record.get("").await,
            Err(SessionError::InvalidArgument(_))
        ));
        assert!(matches!(
            record.set_user_data("", "x").await,
            Err(SessionError::InvalidArgument(_))
        ));
        assert!(matches!(
            record.set_flash("", "x").await,
            Err(SessionError::InvalidArgument(_))
        ));
        assert!(matches!(
            record.get_flash("").await,
            Err(SessionError::InvalidArgument(_))
        ));

        assert!(record.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_separator_in_key_is_rejected() {
        let record = new_record();

        let result = record.set_user_data("a|b", "x").await;

        assert!(matches!(result, Err(SessionError::InvalidArgument(_))));
        assert!(record.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_flash_lifecycle() {
        // Given a flash value
        let record = new_record();
        record.set_flash("info", "hi").await.unwrap();

        // Then it is readable as plain data and marked new
        assert_eq!(record.get("info").await.unwrap(), PhpValue::from("hi"));
        assert_eq!(
            record.ci_vars().await.unwrap().mark("info"),
            Some(CiVarMark::New)
        );

        // When reading it as flash
        let value = record.get_flash("info").await.unwrap();

        // Then it is returned, removed and marked old
        assert_eq!(value, PhpValue::from("hi"));
        assert!(!record.has("info").await);
        assert_eq!(
            record.ci_vars().await.unwrap().mark("info"),
            Some(CiVarMark::Old)
        );

        // And a second read yields an empty string
        assert_eq!(record.get_flash("info").await.unwrap(), PhpValue::from(""));
    }

    /// Flash values are consumed by the first read within the same request,
    /// unlike CodeIgniter, which keeps them readable until the next request.
    #[tokio::test]
    async fn test_flash_is_consumed_immediately_not_on_next_request() {
        let record = new_record();
        record.set_flash("info", "hi").await.unwrap();

        let _ = record.get_flash("info").await.unwrap();

        assert!(matches!(
            record.get("info").await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_flash_merge_keeps_other_markers() {
        let record = new_record();

        record.set_flash("a", "1").await.unwrap();
        record.set_flash("b", "2").await.unwrap();

        let vars = record.ci_vars().await.unwrap();
        assert_eq!(vars.mark("a"), Some(CiVarMark::New));
        assert_eq!(vars.mark("b"), Some(CiVarMark::New));
        assert_eq!(record.flash_keys().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_get_flash_of_missing_key_does_not_create_ci_vars() {
        let record = new_record();

        assert_eq!(record.get_flash_string("nothing").await.unwrap(), "");

        assert!(!record.has_ci_vars().await);
    }

    #[tokio::test]
    async fn test_unset_user_data_drops_marker() {
        let record = new_record();
        record.set_flash("info", "hi").await.unwrap();
        record.set_flash("warn", "careful").await.unwrap();

        let removed = record.unset_user_data("info").await.unwrap();

        assert_eq!(removed, Some(PhpValue::from("hi")));
        let vars = record.ci_vars().await.unwrap();
        assert_eq!(vars.mark("info"), None);
        assert_eq!(vars.mark("warn"), Some(CiVarMark::New));
    }

    #[tokio::test]
    async fn test_tempdata() {
        let record = new_record();

        record.set_tempdata("otp", "123456", 300).await.unwrap();
        record.set_tempdata("stale", "gone", -10).await.unwrap();

        assert_eq!(record.get_tempdata("otp").await.unwrap(), PhpValue::from("123456"));
        assert!(matches!(
            record.get_tempdata("stale").await,
            Err(SessionError::NotFound(_))
        ));
        assert!(!record.has("stale").await);
        assert_eq!(record.ci_vars().await.unwrap().mark("stale"), None);
        // Tempdata is not flash data
        assert!(record.flash_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tempdata_with_huge_ttl_does_not_overflow() {
        let record = new_record();

        record.set_tempdata("forever", "v", i64::MAX).await.unwrap();

        assert_eq!(
            record.ci_vars().await.unwrap().mark("forever"),
            Some(CiVarMark::ExpiresAt(i64::MAX))
        );
        assert_eq!(record.get_tempdata("forever").await.unwrap(), PhpValue::from("v"));
    }

    #[tokio::test]
    async fn test_get_tempdata_ignores_plain_data() {
        let record = new_record();
        record.set_user_data("uid", "42").await.unwrap();

        assert!(matches!(
            record.get_tempdata("uid").await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_persist_stamps_last_regenerate() {
        let record = new_record();
        record.set_user_data("uid", "42").await.unwrap();
        let before = Utc::now().timestamp();

        record.persist().await.unwrap();

        let stamp = record.last_regenerate().await.unwrap();
        assert!(stamp >= before);
        assert!(!record.has(CI_VARS_KEY).await);
    }

    #[tokio::test]
    async fn test_get_fresh_reloads_from_storage() {
        // Given a persisted record and an independent copy of it
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        let id = SessionId::parse("shared").unwrap();
        let writer = SessionRecord::new(id.clone(), SessionData::new(), storage.clone());
        let reader = SessionRecord::new(id, SessionData::new(), storage);
        writer.set_user_data("uid", "1").await.unwrap();
        writer.persist().await.unwrap();

        // When the writer persists a change
        writer.set_user_data("uid", "2").await.unwrap();
        writer.persist().await.unwrap();

        // Then the reader's in-memory copy is stale, but the fresh path is not
        assert!(reader.get("uid").await.is_err());
        assert_eq!(reader.get_fresh("uid").await.unwrap(), PhpValue::from("2"));
        assert_eq!(reader.get("uid").await.unwrap(), PhpValue::from("2"));
    }

    #[tokio::test]
    async fn test_get_fresh_surfaces_decode_errors() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        let id = SessionId::parse("corrupt").unwrap();
        storage.write(&id, b"garbage").await.unwrap();
        let record = SessionRecord::new(id, SessionData::new(), storage);

        let result = record.get_fresh("uid").await;

        assert!(matches!(result, Err(SessionError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_destroyed_record_is_not_persisted() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        let id = SessionId::parse("doomed").unwrap();
        let record = SessionRecord::new(id.clone(), SessionData::new(), storage.clone());
        record.persist().await.unwrap();

        record.destroy().await.unwrap();
        record.persist().await.unwrap();

        assert!(record.is_destroyed());
        assert!(storage.read(&id).await.is_err());
    }

    struct ReadOnlyStorage;

    #[async_trait::async_trait]
    impl SessionStorage for ReadOnlyStorage {
        async fn read(&self, _id: &SessionId) -> Result<Vec<u8>, StorageError> {
            Ok(Vec::new())
        }

        async fn write(&self, _id: &SessionId, _payload: &[u8]) -> Result<(), StorageError> {
            Err(StorageError::Io("Read-only file system".to_string()))
        }

        async fn remove(&self, _id: &SessionId) -> Result<(), StorageError> {
            Err(StorageError::Io("Read-only file system".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_destroy_keeps_record_live() {
        // Given a record whose storage cannot delete files
        let record = SessionRecord::new(
            SessionId::parse("stuck").unwrap(),
            SessionData::new(),
            Arc::new(ReadOnlyStorage),
        );

        // When destroying it fails
        let result = record.destroy().await;

        // Then the error is reported and later persists are still attempted
        assert!(matches!(result, Err(SessionError::Io(_))));
        assert!(!record.is_destroyed());
        assert!(matches!(record.persist().await, Err(SessionError::Io(_))));
    }

    #[tokio::test]
    async fn test_destroy_of_missing_file_marks_destroyed() {
        let record = new_record();

        record.destroy().await.unwrap();

        assert!(record.is_destroyed());
    }

    #[tokio::test]
    async fn test_concurrent_set_user_data_loses_nothing() {
        let record = Arc::new(new_record());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let record = record.clone();
                tokio::spawn(async move { record.set_user_data(&format!("key{i}"), i).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let data = record.snapshot().await;
        assert_eq!(data.len(), 64);
        for i in 0..64 {
            assert_eq!(data.get(&format!("key{i}")), Some(&PhpValue::Int(i)));
        }
    }
}
