//! Mapping resolver: associates target fields with source fields
//!
//! A [`Mapping`] records, for every target field, the source field it reads
//! (if any), the [`TransformRule`](crate::transformer::TransformRule) that
//! produces its value, and how the association was made. Explicit
//! [`FieldHint`]s win; otherwise the resolver tries normalized names and
//! then a single unclaimed candidate of the same type.
//!
//! # Examples
//!
//! ```
//! use apimapper_core::mapping::{resolve, MappingStatus, MatchKind};
//! use apimapper_core::schema::normalize;
//! use apimapper_core::{RawField, RawSchema};
//!
//! let source = normalize(&RawSchema::new(vec![RawField::new("Full-Name", "string")])).unwrap();
//! let target = normalize(&RawSchema::new(vec![RawField::new("full_name", "string").required()])).unwrap();
//!
//! let mapping = resolve(&source, &target, &[]).unwrap();
//! let field = mapping.field("full_name").unwrap();
//! assert_eq!(field.source.as_deref(), Some("Full-Name"));
//! assert_eq!(field.status, MappingStatus::Mapped(MatchKind::ExactName));
//! ```
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod resolver;
pub mod types;


pub use error::MappingError;
pub use resolver::{normalize_name, resolve};
pub use types::{FieldHint, FieldMapping, Mapping, MappingExport, MappingStatus, MatchKind};
