//! Error types for the apimapper core library
//!
//! Each engine module defines its own error enum (schema normalization,
//! mapping construction, span bookkeeping). They all convert into the
//! crate-wide [`Error`] so callers composing the pipeline can use `?`
//! throughout. Field-level transformation failures are not errors: they are
//! collected into a [`TransformationResult`](crate::TransformationResult).

use crate::mapping::MappingError;
use crate::schema::SchemaError;
use crate::timing::TimingError;
use thiserror::Error;

/// Main error type for apimapper operations
#[derive(Error, Debug)]
pub enum Error {
    /// Raw schema could not be normalized
    #[error("Schema error: {source}")]
    Schema {
        #[from]
        source: SchemaError,
    },

    /// No usable mapping could be built
    #[error("Mapping error: {source}")]
    Mapping {
        #[from]
        source: MappingError,
    },

    /// Timing recorder misuse
    #[error("Timing error: {source}")]
    Timing {
        #[from]
        source: TimingError,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// An engine invariant was violated
    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an internal invariant-violation error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Whether the caller can recover by resubmitting corrected input
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Schema { .. } | Error::Mapping { .. } | Error::Json { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err: Error = SchemaError::DuplicateField {
            name: "id".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Schema error: duplicate field name 'id'");
    }

    #[test]
    fn test_mapping_invalid_lists_every_field() {
        let err: Error = MappingError::Invalid {
            missing: vec!["age".to_string(), "email".to_string()],
            ambiguous: vec![],
        }
        .into();
        let rendered = err.to_string();
        assert!(rendered.contains("age"));
        assert!(rendered.contains("email"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_internal_is_not_recoverable() {
        let err = Error::internal("unmapped required target reached the engine");
        assert!(!err.is_recoverable());
        assert!(err.to_string().starts_with("Internal error"));
    }
}
