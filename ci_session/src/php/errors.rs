use thiserror::Error;

use super::types::PhpValue;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhpError {
    #[error("Decode error at byte {offset}: {reason}")]
    Decode { offset: usize, reason: String },

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl PhpError {
    pub(crate) fn decode(offset: usize, reason: impl Into<String>) -> Self {
        Self::Decode {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(expected: &'static str, found: &PhpValue) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.type_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let error = PhpError::decode(12, "unexpected end of input");

        assert_eq!(
            error.to_string(),
            "Decode error at byte 12: unexpected end of input"
        );
    }

    #[test]
    fn test_mismatch_uses_php_type_name() {
        let error = PhpError::mismatch("array", &PhpValue::Float(1.5));

        assert_eq!(
            error.to_string(),
            "Type mismatch: expected array, found float"
        );
    }
}
