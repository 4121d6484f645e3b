//! Process-wide timing recorder
//!
//! The recorder owns an append-only history of closed spans. Only the
//! append/evict step takes the history lock; open spans live in their
//! handles and are never part of history, so retention can only ever evict
//! records that are already closed.
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use super::error::TimingError;
use super::handle::{OpenSpan, SpanHandle, Timed};
use super::record::{Metadata, OperationSummary, SpanFilter, SpanStatus, TimingRecord};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Instant;

/// Which closed records the recorder keeps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Keep at most this many records, evicting the oldest.
    ///
    /// `Some(0)` is treated as `Some(1)`: the most recent record is always kept.
    pub max_records: Option<usize>,
    /// Evict records that ended longer ago than this
    pub max_age_ms: Option<u64>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_records: Some(100),
            max_age_ms: None,
        }
    }
}

impl RetentionPolicy {
    /// Keep everything
    pub fn unbounded() -> Self {
        Self {
            max_records: None,
            max_age_ms: None,
        }
    }
}

/// Recorder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub retention: RetentionPolicy,
    /// Spans longer than this are flagged slow and logged
    pub slow_threshold_ms: f64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            retention: RetentionPolicy::default(),
            slow_threshold_ms: 1500.0,
        }
    }
}

struct Inner {
    config: RecorderConfig,
    history: Mutex<VecDeque<TimingRecord>>,
    next_id: AtomicU64,
    open: AtomicUsize,
}

/// Records named operation spans
///
/// Cloning is cheap and every clone shares the same history.
#[derive(Clone)]
pub struct TimingRecorder {
    inner: Arc<Inner>,
}

impl fmt::Debug for TimingRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimingRecorder")
            .field("config", &self.inner.config)
            .field("records", &self.len())
            .field("open_spans", &self.open_spans())
            .finish()
    }
}

impl Default for TimingRecorder {
    fn default() -> Self {
        Self::new(RecorderConfig::default())
    }
}

impl TimingRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                history: Mutex::new(VecDeque::new()),
                next_id: AtomicU64::new(1),
                open: AtomicUsize::new(0),
            }),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.inner.config
    }

    /// Open a span; every call returns an independent handle
    pub fn begin(&self, operation_name: impl Into<String>, metadata: Metadata) -> SpanHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.open.fetch_add(1, Ordering::Relaxed);
        let operation_name = operation_name.into();
        tracing::trace!(operation = %operation_name, id, "span opened");

        SpanHandle::new(
            self.clone(),
            id,
            operation_name,
            OpenSpan {
                start: Utc::now(),
                started: Instant::now(),
                metadata,
            },
        )
    }

    /// Finalize a span and append it to history
    pub(crate) fn close(
        &self,
        id: u64,
        operation_name: String,
        span: OpenSpan,
        status: SpanStatus,
    ) -> TimingRecord {
        let elapsed = Duration::from_std(span.started.elapsed()).unwrap_or_else(|_| Duration::zero());
        let end = span.start.checked_add_signed(elapsed).unwrap_or(span.start);
        let measured = end - span.start;
        let duration_ms = measured
            .num_nanoseconds()
            .map(|ns| ns as f64 / 1_000_000.0)
            .unwrap_or_else(|| measured.num_milliseconds() as f64);
        let slow = duration_ms > self.inner.config.slow_threshold_ms;

        let record = TimingRecord {
            id,
            operation_name,
            start: span.start,
            end,
            duration_ms,
            status,
            slow,
            metadata: span.metadata,
        };

        if slow {
            tracing::warn!(
                operation = %record.operation_name,
                duration_ms,
                threshold_ms = self.inner.config.slow_threshold_ms,
                "slow operation"
            );
        }
        tracing::info!(
            operation = %record.operation_name,
            id,
            duration_ms,
            status = %status,
            "span closed"
        );

        self.append(record.clone());
        self.inner.open.fetch_sub(1, Ordering::Relaxed);
        record
    }

    fn append(&self, record: TimingRecord) {
        let retention = &self.inner.config.retention;
        let mut history = self.lock_history();

        if let Some(max_age_ms) = retention.max_age_ms {
            let cutoff = Duration::from_std(std::time::Duration::from_millis(max_age_ms))
                .ok()
                .and_then(|max_age| record.end.checked_sub_signed(max_age));
            if let Some(cutoff) = cutoff {
                history.retain(|r| r.end >= cutoff);
            }
        }

        history.push_back(record);

        if let Some(max_records) = retention.max_records {
            // Zero still keeps the latest record.
            let max_records = max_records.max(1);
            while history.len() > max_records {
                history.pop_front();
            }
        }
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, VecDeque<TimingRecord>> {
        self.inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of matching records ordered by start time
    ///
    /// The iterator owns its records; call `query` again to restart.
    pub fn query(&self, filter: &SpanFilter) -> std::vec::IntoIter<TimingRecord> {
        let mut records: Vec<TimingRecord> = self
            .lock_history()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));
        records.into_iter()
    }

    /// Every retained record ordered by start time
    pub fn records(&self) -> Vec<TimingRecord> {
        self.query(&SpanFilter::all()).collect()
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.lock_history().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spans begun but not yet closed
    pub fn open_spans(&self) -> usize {
        self.inner.open.load(Ordering::Relaxed)
    }

    /// Discard all retained records
    ///
    /// Open spans are unaffected and still record when they close.
    pub fn reset(&self) {
        self.lock_history().clear();
    }

    /// Remove and return all retained records in completion order
    pub fn drain(&self) -> Vec<TimingRecord> {
        self.lock_history().drain(..).collect()
    }

    /// Per-operation statistics over retained records, sorted by name
    pub fn summary(&self) -> Vec<OperationSummary> {
        let mut by_name: BTreeMap<String, OperationSummary> = BTreeMap::new();
        for record in self.lock_history().iter() {
            let entry = by_name
                .entry(record.operation_name.clone())
                .or_insert_with(|| OperationSummary {
                    operation_name: record.operation_name.clone(),
                    count: 0,
                    failures: 0,
                    slow: 0,
                    mean_ms: 0.0,
                    max_ms: 0.0,
                });
            entry.count += 1;
            entry.failures += usize::from(!record.is_success());
            entry.slow += usize::from(record.slow);
            entry.mean_ms += record.duration_ms;
            entry.max_ms = entry.max_ms.max(record.duration_ms);
        }

        by_name
            .into_values()
            .map(|mut s| {
                s.mean_ms /= s.count as f64;
                s
            })
            .collect()
    }

    /// Run `operation` inside a span closed by its outcome
    pub fn time<T, E, F>(&self, operation_name: impl Into<String>, metadata: Metadata, operation: F) -> Timed<Result<T, E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        let mut handle = self.begin(operation_name, metadata);
        let result = operation();
        let record = finish(&mut handle, &result);
        Timed { result, record }
    }

    /// Await `operation` inside a span closed by its outcome
    ///
    /// If the returned future is dropped before completion the span closes
    /// as an abandoned failure.
    pub async fn time_async<T, E, F>(
        &self,
        operation_name: impl Into<String>,
        metadata: Metadata,
        operation: F,
    ) -> Timed<Result<T, E>>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut handle = self.begin(operation_name, metadata);
        let result = operation.await;
        let record = finish(&mut handle, &result);
        Timed { result, record }
    }
}

fn finish<T, E: fmt::Display>(handle: &mut SpanHandle, result: &Result<T, E>) -> TimingRecord {
    let status = match result {
        Ok(_) => SpanStatus::Success,
        Err(err) => {
            handle.annotate("error", err.to_string());
            SpanStatus::Failure
        }
    };
    match handle.end(status) {
        Ok(record) => record,
        Err(err) => unreachable!("fresh span closed twice: {}", err),
    }
}

static GLOBAL: OnceLock<TimingRecorder> = OnceLock::new();

/// The process-wide recorder, created with defaults on first use
pub fn global() -> &'static TimingRecorder {
    GLOBAL.get_or_init(TimingRecorder::default)
}

/// Configure the process-wide recorder before its first use
pub fn install_global(config: RecorderConfig) -> Result<&'static TimingRecorder, TimingError> {
    let mut installed = false;
    let recorder = GLOBAL.get_or_init(|| {
        installed = true;
        TimingRecorder::new(config)
    });
    if installed {
        Ok(recorder)
    } else {
        Err(TimingError::AlreadyInitialized)
    }
}
