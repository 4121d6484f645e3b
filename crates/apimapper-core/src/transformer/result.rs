//! Transformation results and batch summaries
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Float to integer conversion dropped a fractional part
pub const REASON_TRUNCATED: &str = "truncated";
/// A number other than 0 or 1 became a boolean
pub const REASON_COERCED: &str = "coerced";
/// A missing source value was replaced by the target's default
pub const REASON_DEFAULTED: &str = "defaulted";
/// A lookup table had no entry and used its default
pub const REASON_LOOKUP_DEFAULT: &str = "lookup default";

/// A diagnostic attached to one target field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub reason: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome of transforming one source record
///
/// `record` is keyed by target field name. A field with an entry in `errors`
/// is absent from `record`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformationResult {
    pub record: Map<String, Value>,
    pub warnings: Vec<FieldIssue>,
    pub errors: Vec<FieldIssue>,
}

impl TransformationResult {
    /// A result is successful when it has no errors; warnings are allowed
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn warn(&mut self, field: &str, reason: impl Into<String>) {
        self.warnings.push(FieldIssue::new(field, reason));
    }

    pub(crate) fn fail(&mut self, field: &str, reason: impl Into<String>) {
        self.errors.push(FieldIssue::new(field, reason));
    }
}

/// Counts across a batch of transformations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Total warnings across all records
    pub warnings: usize,
}

/// Per-record results of a batch, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub results: Vec<TransformationResult>,
    pub summary: BatchSummary,
}

impl BatchResult {
    pub(crate) fn from_results(results: Vec<TransformationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let summary = BatchSummary {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            warnings: results.iter().map(|r| r.warnings.len()).sum(),
        };
        Self { results, summary }
    }

    /// Whether every record transformed without errors
    pub fn is_success(&self) -> bool {
        self.summary.failed == 0
    }
}
