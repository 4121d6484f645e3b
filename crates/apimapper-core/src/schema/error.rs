//! Error types for schema normalization
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Errors raised while normalizing a raw schema
///
/// A schema error is fatal to the current `normalize` call; the caller
/// recovers by resubmitting a corrected schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two fields share a name
    #[error("duplicate field name '{name}'")]
    DuplicateField { name: String },

    /// Two fields resolve to the same location in a record
    #[error("fields '{first}' and '{second}' share the path '{path}'")]
    DuplicatePath {
        path: String,
        first: String,
        second: String,
    },

    /// A field has an empty name
    #[error("field at position {position} has an empty name")]
    EmptyName { position: usize },

    /// An access path could not be parsed
    #[error("invalid path '{path}' at position {position}: {message}")]
    InvalidPath {
        path: String,
        position: usize,
        message: String,
    },
}

impl SchemaError {
    pub(crate) fn invalid_path(path: &str, position: usize, message: impl Into<String>) -> Self {
        SchemaError::InvalidPath {
            path: path.to_string(),
            position,
            message: message.into(),
        }
    }

    /// Name of the field or path the error is about
    pub fn subject(&self) -> String {
        match self {
            SchemaError::DuplicateField { name } => name.clone(),
            SchemaError::DuplicatePath { second, .. } => second.clone(),
            SchemaError::EmptyName { position } => format!("#{}", position),
            SchemaError::InvalidPath { path, .. } => path.clone(),
        }
    }
}
