//! Transformation engine: rules, value coercion and record transformation
//!
//! # Module Organization
//!
//! - [`rule`] - The closed set of transform rules and their build-time checks
//! - [`engine`] - Applying a mapping to records
//! - [`result`] - Transformation results, field issues and batch summaries
//! - [`built_in`] - Pre-configured rules for common conversions
//!
//! # Examples
//!
//! ```
//! use apimapper_core::mapping::{resolve, FieldHint};
//! use apimapper_core::schema::normalize;
//! use apimapper_core::transformer::{apply, built_in};
//! use apimapper_core::{RawField, RawSchema};
//! use serde_json::json;
//!
//! let source = normalize(&RawSchema::new(vec![RawField::new("amount", "string")])).unwrap();
//! let target = normalize(&RawSchema::new(vec![RawField::new("amount", "number").required()])).unwrap();
//! let hints = [FieldHint::new("amount", "amount").with_rule(built_in::to_integer())];
//!
//! let mapping = resolve(&source, &target, &hints).unwrap();
//! let result = apply(&mapping, &json!({"amount": "12.509"})).unwrap();
//!
//! assert!(result.is_success());
//! assert_eq!(result.record["amount"], json!(12));
//! assert_eq!(result.warnings[0].reason, "truncated");
//! ```
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

pub mod built_in;
pub(crate) mod coercion;
pub mod engine;
pub mod result;
pub mod rule;


pub use engine::{apply, apply_batch};
pub use result::{
    BatchResult, BatchSummary, FieldIssue, TransformationResult, REASON_COERCED, REASON_DEFAULTED,
    REASON_LOOKUP_DEFAULT, REASON_TRUNCATED,
};
pub use rule::TransformRule;
