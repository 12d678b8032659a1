//! Configuration for the session store

use std::path::PathBuf;

/// Default lifetime of a session in seconds, matching CodeIgniter's
/// `sess_expiration`.
pub const DEFAULT_SESSION_EXPIRY_SECS: u64 = 1800;

fn parse_session_dir(value: Option<&str>) -> PathBuf {
    match value {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::temp_dir(),
    }
}

fn parse_expiry_secs(value: Option<&str>) -> u64 {
    value
        .and_then(|s| s.parse().ok())
        .filter(|&secs| secs > 0)
        .unwrap_or(DEFAULT_SESSION_EXPIRY_SECS)
}

/// Values injected into the store at construction.
///
/// Empty directories and zero expiry fall back to the defaults, the same way
/// an unset CodeIgniter config does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub session_dir: PathBuf,
    pub expiry_secs: u64,
}

impl SessionConfig {
    pub fn new(session_dir: impl Into<PathBuf>, expiry_secs: u64) -> Self {
        let session_dir = session_dir.into();
        Self {
            session_dir: if session_dir.as_os_str().is_empty() {
                std::env::temp_dir()
            } else {
                session_dir
            },
            expiry_secs: if expiry_secs == 0 {
                DEFAULT_SESSION_EXPIRY_SECS
            } else {
                expiry_secs
            },
        }
    }

    /// Build a config from `CI_SESSION_DIR` (default: the system temp
    /// directory) and `CI_SESSION_EXPIRY_SECS` (default: 1800).
    pub fn from_env() -> Self {
        Self {
            session_dir: parse_session_dir(std::env::var("CI_SESSION_DIR").ok().as_deref()),
            expiry_secs: parse_expiry_secs(
                std::env::var("CI_SESSION_EXPIRY_SECS").ok().as_deref(),
            ),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_dir: std::env::temp_dir(),
            expiry_secs: DEFAULT_SESSION_EXPIRY_SECS,
        }
    }
}
