//! Caller-owned span handles

use super::error::TimingError;
use super::record::{Metadata, SpanStatus, TimingRecord};
use super::recorder::TimingRecorder;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// State of a span that has begun but not yet closed
#[derive(Debug)]
pub(crate) struct OpenSpan {
    pub start: DateTime<Utc>,
    pub started: Instant,
    pub metadata: Metadata,
}

/// Handle to an open span, returned by [`TimingRecorder::begin`]
///
/// The handle is owned by the code that began the span and needs no
/// synchronization. Closing it twice fails with
/// [`TimingError::DoubleClose`]. A handle dropped while still open closes
/// itself as a failure with `abandoned=true`, so early returns, `?` and
/// panics never leave a span open.
#[derive(Debug)]
#[must_use = "an unclosed span is recorded as an abandoned failure when dropped"]
pub struct SpanHandle {
    recorder: TimingRecorder,
    id: u64,
    operation_name: String,
    span: Option<OpenSpan>,
}

impl SpanHandle {
    pub(crate) fn new(recorder: TimingRecorder, id: u64, operation_name: String, span: OpenSpan) -> Self {
        Self {
            recorder,
            id,
            operation_name,
            span: Some(span),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    pub fn is_open(&self) -> bool {
        self.span.is_some()
    }

    /// Attach a metadata entry; ignored once the span is closed
    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if let Some(span) = &mut self.span {
            span.metadata.insert(key.into(), value.into());
        }
    }

    /// Close the span and return its finalized record
    pub fn end(&mut self, status: SpanStatus) -> Result<TimingRecord, TimingError> {
        let span = self.span.take().ok_or_else(|| TimingError::DoubleClose {
            operation: self.operation_name.clone(),
            id: self.id,
        })?;
        Ok(self
            .recorder
            .close(self.id, self.operation_name.clone(), span, status))
    }

    pub fn succeed(&mut self) -> Result<TimingRecord, TimingError> {
        self.end(SpanStatus::Success)
    }

    pub fn fail(&mut self) -> Result<TimingRecord, TimingError> {
        self.end(SpanStatus::Failure)
    }
}

impl Drop for SpanHandle {
    fn drop(&mut self) {
        if let Some(mut span) = self.span.take() {
            span.metadata.insert("abandoned".to_string(), "true".to_string());
            tracing::warn!(operation = %self.operation_name, id = self.id, "span dropped while open");
            self.recorder.close(
                self.id,
                std::mem::take(&mut self.operation_name),
                span,
                SpanStatus::Failure,
            );
        }
    }
}

/// Result of an operation timed by [`TimingRecorder::time`]
#[derive(Debug, Clone, PartialEq)]
pub struct Timed<T> {
    pub result: T,
    pub record: TimingRecord,
}
