//! Timing recorder: named operation spans with a queryable history
//!
//! ```
//! use apimapper_core::timing::{Metadata, SpanFilter, SpanStatus, TimingRecorder};
//!
//! let recorder = TimingRecorder::default();
//! let mut span = recorder.begin("transform-batch", Metadata::new());
//! span.annotate("records", "3");
//! let record = span.end(SpanStatus::Success).unwrap();
//!
//! assert!(record.duration_ms >= 0.0);
//! assert!(span.end(SpanStatus::Success).is_err());
//! assert_eq!(recorder.query(&SpanFilter::named("transform-batch")).count(), 1);
//! ```
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod handle;
pub mod record;
pub mod recorder;

#[cfg(test)]
mod tests;

pub use error::TimingError;
pub use handle::{SpanHandle, Timed};
pub use record::{Metadata, OperationSummary, SpanFilter, SpanStatus, TimingRecord};
pub use recorder::{global, install_global, RecorderConfig, RetentionPolicy, TimingRecorder};
