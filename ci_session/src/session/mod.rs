mod errors;
mod record;
mod storage;
mod store;
mod types;

pub use errors::SessionError;
pub use record::SessionRecord;
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
pub use store::SessionStore;
pub use types::{
    CI_LAST_REGENERATE_KEY, CI_VARS_KEY, CiVarMark, CiVars, SessionData, SessionId,
};
