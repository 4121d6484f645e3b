//! Apimapper Core - field mapping and transformation engine for API schemas
//!
//! This crate maps records from a source API's field layout to a target
//! API's layout and instruments every step with an operation timer.
//!
//! # Main Components
//!
//! - **Schema Registry** ([`schema`]): normalizes raw field lists and compares field types
//! - **Mapping Resolver** ([`mapping`]): pairs target fields with source fields from hints, names and types
//! - **Transformation Engine** ([`transformer`]): applies type-checked rules to records
//! - **Timing Recorder** ([`timing`]): named spans with a queryable, bounded history
//! - **Pipeline** ([`pipeline`]): the three engine steps composed under timing spans
//!
//! # Example
//!
//! ```
//! use apimapper_core::pipeline::{MappingPipeline, MappingRequest};
//! use apimapper_core::schema::SchemaRegistry;
//! use apimapper_core::timing::TimingRecorder;
//! use apimapper_core::{RawField, RawSchema, Result};
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let pipeline = MappingPipeline::new(SchemaRegistry::new(), TimingRecorder::default());
//!     let request = MappingRequest {
//!         source: RawSchema::new(vec![RawField::new("full_name", "string")]),
//!         target: RawSchema::new(vec![RawField::new("name", "string").required()]),
//!         hints: vec![],
//!         records: vec![json!({"full_name": "Ada"})],
//!     };
//!
//!     let output = pipeline.run(&request)?;
//!     assert!(output.is_success());
//!     assert_eq!(output.batch.results[0].record["name"], json!("Ada"));
//!     assert_eq!(output.timings.len(), 3);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod error;
pub mod mapping;
pub mod pipeline;
pub mod schema;
pub mod timing;
pub mod transformer;
pub mod types;

#[cfg(test)]
pub mod proptest_strategies;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use types::{FieldDescriptor, FieldSchema, FieldType, RawField, RawSchema};

pub use mapping::{resolve, FieldHint, FieldMapping, Mapping, MappingError, MappingStatus, MatchKind};
pub use pipeline::{MappingPipeline, MappingRequest, PipelineOutput};
pub use schema::{diff_types, normalize, SchemaError, SchemaRegistry, TypeDiff};
pub use timing::{SpanFilter, SpanHandle, SpanStatus, TimingError, TimingRecord, TimingRecorder};
pub use transformer::{apply, apply_batch, BatchResult, BatchSummary, FieldIssue, TransformRule, TransformationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
