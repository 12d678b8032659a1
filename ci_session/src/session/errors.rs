use thiserror::Error;

use crate::php::PhpError;
use crate::utils::UtilError;

use super::storage::StorageError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    /// Empty key or token, or a token that cannot be a session id.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No backing file for the id, or no such key in the session.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backing file is not valid PHP session data.
    #[error("Decode error at byte {offset}: {reason}")]
    Decode { offset: usize, reason: String },

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Session expired")]
    Expired,

    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl From<PhpError> for SessionError {
    fn from(err: PhpError) -> Self {
        match err {
            PhpError::Decode { offset, reason } => Self::Decode { offset, reason },
            PhpError::Encode(msg) => Self::Encode(msg),
            PhpError::TypeMismatch { expected, found } => Self::TypeMismatch { expected, found },
        }
    }
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => Self::NotFound(format!("session {id}")),
            StorageError::Io(msg) => Self::Io(msg),
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

impl From<UtilError> for SessionError {
    fn from(err: UtilError) -> Self {
        match err {
            UtilError::Crypto(msg) => Self::Crypto(msg),
            UtilError::Cookie(msg) => Self::InvalidArgument(msg),
        }
    }
}
