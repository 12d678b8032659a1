//! # ci-session
//!
//! Read and write CodeIgniter file sessions from Rust.
//!
//! Sessions live in `{session_dir}/ci_session{id}` in PHP's `php` session
//! serialization format, so a PHP application and a Rust service can share
//! one logged-in user. Flash and tempdata markers in `__ci_vars` follow
//! CodeIgniter's layout.
//!
//! ```no_run
//! use ci_session::{SessionBinding, SessionConfig, SessionError};
//!
//! # async fn handle(cookie: &str) -> Result<(), SessionError> {
//! let binding = SessionBinding::new(SessionConfig::from_env());
//! let record = binding.resolve_from_token(cookie).await?;
//!
//! let user = record.get_user_data("my_login_session").await?;
//! let info = record.get_flash_string("info").await?;
//! println!("{user} {info}");
//!
//! binding.persist(&record).await?;
//! # Ok(())
//! # }
//! ```

mod binding;
mod config;
pub mod php;
mod session;
mod utils;

pub use binding::SessionBinding;
pub use config::{DEFAULT_SESSION_EXPIRY_SECS, SessionConfig};
pub use php::{PhpArray, PhpError, PhpKey, PhpValue};
pub use session::{
    CI_LAST_REGENERATE_KEY, CI_VARS_KEY, CiVarMark, CiVars, FileStorage, MemoryStorage,
    SessionData, SessionError, SessionId, SessionRecord, SessionStorage, SessionStore,
    StorageError,
};
pub use utils::{UtilError, header_set_cookie, session_id_from_headers};
