//! Schema registry: normalization of raw field lists and type comparison
//!
//! # Module Organization
//!
//! - [`path`] - Field access path parsing and resolution
//! - [`registry`] - Normalization, type diffing and the normalization cache
//! - [`error`] - Schema error definitions
//!
//! # Examples
//!
//! ```
//! use apimapper_core::schema::{normalize, diff_types, TypeDiff};
//! use apimapper_core::{RawField, RawSchema};
//!
//! let source = normalize(&RawSchema::new(vec![RawField::new("amount", "string")])).unwrap();
//! let target = normalize(&RawSchema::new(vec![RawField::new("amount", "number")])).unwrap();
//!
//! let diff = diff_types(source.get("amount").unwrap(), target.get("amount").unwrap());
//! assert!(matches!(diff, TypeDiff::Coercible(_)));
//! ```
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod path;
pub mod registry;

pub use error::SchemaError;
pub use path::{FieldPath, PathSegment};
pub use registry::{
    diff_field_types, diff_types, normalize, RegistryConfig, SchemaRegistry, TypeDiff,
};
