//! Error types for mapping construction
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use crate::types::FieldType;
use thiserror::Error;

/// Errors raised while building a mapping
///
/// All variants halt before any transformation runs. The caller recovers by
/// supplying corrected schemas or additional hints.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// Required target fields are left without a source or default
    #[error("{}", describe_invalid(.missing, .ambiguous))]
    Invalid {
        /// Every uncovered required target, in target order
        missing: Vec<String>,
        /// Targets among `missing` whose automatic match was ambiguous
        ambiguous: Vec<String>,
    },

    /// A hint names a field that does not exist
    #[error("hint refers to unknown {side} field '{name}'")]
    UnknownField { side: &'static str, name: String },

    /// More than one hint targets the same field
    #[error("target field '{target}' has more than one hint")]
    DuplicateHint { target: String },

    /// An explicit hint pairs fields whose types cannot be converted
    #[error("cannot map '{source_field}' ({source_type}) to '{target}' ({target_type})")]
    IncompatibleTypes {
        target: String,
        source_field: String,
        source_type: FieldType,
        target_type: FieldType,
    },

    /// A rule's declared types do not fit the fields it connects
    #[error("rule {rule} on '{target}' rejected: {reason}")]
    RuleTypeMismatch {
        target: String,
        rule: String,
        reason: String,
    },

    /// A hint is self-contradictory
    #[error("invalid hint for '{target}': {reason}")]
    InvalidHint { target: String, reason: String },
}

impl MappingError {
    /// Target field names this error is about
    pub fn fields(&self) -> Vec<&str> {
        match self {
            MappingError::Invalid { missing, .. } => missing.iter().map(String::as_str).collect(),
            MappingError::UnknownField { name, .. } => vec![name.as_str()],
            MappingError::DuplicateHint { target }
            | MappingError::IncompatibleTypes { target, .. }
            | MappingError::RuleTypeMismatch { target, .. }
            | MappingError::InvalidHint { target, .. } => vec![target.as_str()],
        }
    }
}

fn describe_invalid(missing: &[String], ambiguous: &[String]) -> String {
    let mut message = format!("missing required target fields: {}", missing.join(", "));
    if !ambiguous.is_empty() {
        message.push_str(&format!(" (ambiguous: {})", ambiguous.join(", ")));
    }
    message
}
