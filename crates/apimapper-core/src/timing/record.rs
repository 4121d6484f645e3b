//! Closed span records, query filters and per-operation summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form span annotations
pub type Metadata = BTreeMap<String, String>;

/// How a span ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    Success,
    Failure,
}

impl fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanStatus::Success => f.write_str("success"),
            SpanStatus::Failure => f.write_str("failure"),
        }
    }
}

/// An immutable record of one closed span
///
/// `duration_ms` is exactly `end - start`; both timestamps come from the
/// wall clock at `begin` plus the monotonic elapsed time at close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    /// Recorder-unique span id, increasing in `begin` order
    pub id: u64,
    pub operation_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_ms: f64,
    pub status: SpanStatus,
    /// Duration exceeded the recorder's slow threshold
    pub slow: bool,
    #[serde(default)]
    pub metadata: Metadata,
}

impl TimingRecord {
    pub fn is_success(&self) -> bool {
        self.status == SpanStatus::Success
    }

    pub fn is_slow(&self) -> bool {
        self.slow
    }
}

/// Criteria for [`TimingRecorder::query`](super::TimingRecorder::query)
///
/// Every set criterion must hold; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanFilter {
    pub name: Option<String>,
    pub status: Option<SpanStatus>,
    /// Only spans started at or after this instant
    pub since: Option<DateTime<Utc>>,
    pub min_duration_ms: Option<f64>,
}

impl SpanFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: SpanStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn slower_than(mut self, min_duration_ms: f64) -> Self {
        self.min_duration_ms = Some(min_duration_ms);
        self
    }

    pub fn matches(&self, record: &TimingRecord) -> bool {
        self.name.as_deref().map_or(true, |n| n == record.operation_name)
            && self.status.map_or(true, |s| s == record.status)
            && self.since.map_or(true, |t| record.start >= t)
            && self.min_duration_ms.map_or(true, |d| record.duration_ms >= d)
    }
}

/// Aggregate statistics for one operation name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSummary {
    pub operation_name: String,
    pub count: usize,
    pub failures: usize,
    pub slow: usize,
    pub mean_ms: f64,
    pub max_ms: f64,
}
