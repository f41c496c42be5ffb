//! Error types for the Lingo engine.

use thiserror::Error;

/// All possible errors from the Lingo engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("type mismatch for field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    // Store errors
    #[error("local knowledge point not found: {0}")]
    PointNotFound(i64),

    // State errors
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("unsupported snapshot format version: {actual} (max supported: {supported})")]
    UnsupportedFormatVersion { supported: u32, actual: u32 },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::MissingRequiredField("local_id".into());
        assert_eq!(err.to_string(), "missing required field: local_id");

        let err = Error::PointNotFound(-3);
        assert_eq!(err.to_string(), "local knowledge point not found: -3");

        let err = Error::TypeMismatch {
            field: "mastery_level".into(),
            expected: "number".into(),
            got: "string".into(),
        };
        assert_eq!(
            err.to_string(),
            "type mismatch for field 'mastery_level': expected number, got string"
        );

        let err = Error::UnsupportedFormatVersion {
            supported: 1,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "unsupported snapshot format version: 4 (max supported: 1)"
        );
    }
}
