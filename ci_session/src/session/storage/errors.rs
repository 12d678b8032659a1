use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Storage IO error: {0}")]
    Io(String),
}

impl StorageError {
    /// Maps an IO error on the session `id`, keeping "no such file" distinct.
    pub(crate) fn from_io(id: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(id.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");

        assert_eq!(
            StorageError::from_io("abc", err),
            StorageError::NotFound("abc".to_string())
        );
    }

    #[test]
    fn test_from_io_other() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");

        match StorageError::from_io("abc", err) {
            StorageError::Io(msg) => assert!(msg.contains("denied")),
            other => panic!("Expected Io variant, got: {other:?}"),
        }
    }
}
