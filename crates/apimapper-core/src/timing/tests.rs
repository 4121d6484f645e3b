//! Tests for the timing recorder
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use super::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use std::time::Duration as StdDuration;

fn recorder_keeping(max_records: Option<usize>) -> TimingRecorder {
    TimingRecorder::new(RecorderConfig {
        retention: RetentionPolicy {
            max_records,
            max_age_ms: None,
        },
        ..RecorderConfig::default()
    })
}

fn exact_ms(record: &TimingRecord) -> f64 {
    (record.end - record.start).num_nanoseconds().unwrap() as f64 / 1_000_000.0
}

#[test]
fn test_duration_matches_timestamps() {
    let recorder = TimingRecorder::default();
    let mut span = recorder.begin("resolve-mapping", Metadata::new());
    thread::sleep(StdDuration::from_millis(2));
    let record = span.succeed().unwrap();

    assert_eq!(record.duration_ms, exact_ms(&record));
    assert!(record.duration_ms >= 2.0);
    assert!(record.end >= record.start);
    assert!(record.is_success());
    assert!(!record.is_slow());
}

#[test]
fn test_double_close_fails_without_second_record() {
    let recorder = TimingRecorder::default();
    let mut span = recorder.begin("transform-batch", Metadata::new());
    let first = span.end(SpanStatus::Success).unwrap();

    let err = span.end(SpanStatus::Failure).unwrap_err();
    assert_eq!(
        err,
        TimingError::DoubleClose {
            operation: "transform-batch".into(),
            id: first.id
        }
    );
    assert_eq!(recorder.len(), 1);
    assert!(recorder.records()[0].is_success());
}

#[test]
fn test_failure_path_records_elapsed_time() {
    let recorder = TimingRecorder::default();

    let mut span = recorder.begin("transform-batch", Metadata::new());
    let outcome: Result<(), &str> = (|| {
        thread::sleep(StdDuration::from_millis(3));
        Err("upstream exploded")
    })();
    if outcome.is_err() {
        span.end(SpanStatus::Failure).unwrap();
    }

    let records: Vec<_> = recorder.query(&SpanFilter::named("transform-batch")).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, SpanStatus::Failure);
    assert!(records[0].duration_ms >= 3.0);
    assert_eq!(records[0].duration_ms, exact_ms(&records[0]));
}

#[test]
fn test_dropped_handle_closes_as_abandoned_failure() {
    let recorder = TimingRecorder::default();
    {
        let mut span = recorder.begin("load-records", Metadata::new());
        span.annotate("path", "records.json");
        assert_eq!(recorder.open_spans(), 1);
    }

    assert_eq!(recorder.open_spans(), 0);
    let record = &recorder.records()[0];
    assert_eq!(record.status, SpanStatus::Failure);
    assert_eq!(record.metadata.get("abandoned").map(String::as_str), Some("true"));
    assert_eq!(record.metadata.get("path").map(String::as_str), Some("records.json"));
}

#[test]
fn test_nested_spans_are_independent() {
    let recorder = TimingRecorder::default();
    let mut outer = recorder.begin("outer", Metadata::new());
    let mut inner = recorder.begin("inner", Metadata::new());
    assert_ne!(outer.id(), inner.id());
    assert_eq!(recorder.open_spans(), 2);

    inner.succeed().unwrap();
    outer.fail().unwrap();

    let ordered: Vec<_> = recorder.records().into_iter().map(|r| r.operation_name).collect();
    assert_eq!(ordered, vec!["outer", "inner"]);
}

#[test]
fn test_retention_evicts_oldest_closed_records() {
    let recorder = recorder_keeping(Some(3));
    let mut long_running = recorder.begin("long", Metadata::new());

    for i in 0..5 {
        let mut span = recorder.begin(format!("op-{}", i), Metadata::new());
        span.succeed().unwrap();
    }
    assert_eq!(recorder.len(), 3);

    long_running.succeed().unwrap();
    let names: Vec<_> = recorder.records().into_iter().map(|r| r.operation_name).collect();
    assert_eq!(names, vec!["long", "op-3", "op-4"]);
}

#[test]
fn test_zero_capacity_keeps_latest() {
    let recorder = recorder_keeping(Some(0));
    recorder.begin("a", Metadata::new()).succeed().unwrap();
    recorder.begin("b", Metadata::new()).succeed().unwrap();
    assert_eq!(recorder.records()[0].operation_name, "b");
    assert_eq!(recorder.len(), 1);
}

#[test]
fn test_retention_by_age() {
    let recorder = TimingRecorder::new(RecorderConfig {
        retention: RetentionPolicy {
            max_records: None,
            max_age_ms: Some(0),
        },
        ..RecorderConfig::default()
    });

    recorder.begin("old", Metadata::new()).succeed().unwrap();
    thread::sleep(StdDuration::from_millis(2));
    recorder.begin("new", Metadata::new()).succeed().unwrap();

    let names: Vec<_> = recorder.records().into_iter().map(|r| r.operation_name).collect();
    assert_eq!(names, vec!["new"]);
}

#[test]
fn test_query_filters() {
    let recorder = TimingRecorder::new(RecorderConfig {
        retention: RetentionPolicy::unbounded(),
        slow_threshold_ms: 0.0,
    });

    recorder.begin("resolve", Metadata::new()).succeed().unwrap();
    let marker = chrono::Utc::now();
    thread::sleep(StdDuration::from_millis(1));
    recorder.begin("resolve", Metadata::new()).fail().unwrap();
    let mut slow = recorder.begin("transform", Metadata::new());
    thread::sleep(StdDuration::from_millis(5));
    slow.succeed().unwrap();

    assert_eq!(recorder.query(&SpanFilter::all()).count(), 3);
    assert_eq!(recorder.query(&SpanFilter::named("resolve")).count(), 2);
    assert_eq!(
        recorder
            .query(&SpanFilter::named("resolve").with_status(SpanStatus::Failure))
            .count(),
        1
    );
    assert_eq!(recorder.query(&SpanFilter::all().since(marker)).count(), 2);
    assert_eq!(recorder.query(&SpanFilter::all().slower_than(5.0)).count(), 1);

    // Restartable: a second query sees the same snapshot.
    let first: Vec<_> = recorder.query(&SpanFilter::all()).collect();
    let second: Vec<_> = recorder.query(&SpanFilter::all()).collect();
    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0].start <= w[1].start));
    assert!(first.iter().any(|r| r.operation_name == "transform" && r.is_slow()));
}

#[test]
fn test_reset_and_drain() {
    let recorder = TimingRecorder::default();
    recorder.begin("a", Metadata::new()).succeed().unwrap();
    recorder.begin("b", Metadata::new()).succeed().unwrap();

    let drained = recorder.drain();
    assert_eq!(drained.len(), 2);
    assert!(recorder.is_empty());

    recorder.begin("c", Metadata::new()).succeed().unwrap();
    let mut open = recorder.begin("d", Metadata::new());
    recorder.reset();
    assert!(recorder.is_empty());

    open.succeed().unwrap();
    assert_eq!(recorder.len(), 1);
}

#[test]
fn test_summary() {
    let recorder = TimingRecorder::default();
    recorder.begin("resolve", Metadata::new()).succeed().unwrap();
    recorder.begin("resolve", Metadata::new()).fail().unwrap();
    recorder.begin("apply", Metadata::new()).succeed().unwrap();

    let summary = recorder.summary();
    assert_eq!(summary.len(), 2);
    assert_eq!(summary[0].operation_name, "apply");
    assert_eq!(summary[1].count, 2);
    assert_eq!(summary[1].failures, 1);
    assert!(summary[1].max_ms >= summary[1].mean_ms);
}

#[test]
fn test_time_closes_by_outcome() {
    let recorder = TimingRecorder::default();

    let ok = recorder.time("parse", Metadata::new(), || Ok::<_, String>(42));
    assert_eq!(ok.result, Ok(42));
    assert!(ok.record.is_success());

    let failed = recorder.time("parse", Metadata::new(), || Err::<u8, _>("bad input".to_string()));
    assert!(failed.result.is_err());
    assert_eq!(failed.record.status, SpanStatus::Failure);
    assert_eq!(failed.record.metadata.get("error").map(String::as_str), Some("bad input"));
    assert_eq!(recorder.len(), 2);
}

#[test]
fn test_time_records_failure_on_panic() {
    let recorder = TimingRecorder::default();
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        recorder.time("explode", Metadata::new(), || -> Result<(), String> { panic!("boom") })
    }));
    assert!(outcome.is_err());

    let record = &recorder.records()[0];
    assert_eq!(record.status, SpanStatus::Failure);
    assert_eq!(record.metadata.get("abandoned").map(String::as_str), Some("true"));
    assert_eq!(recorder.open_spans(), 0);
}

#[test]
fn test_concurrent_spans_all_recorded() {
    let recorder = recorder_keeping(None);
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let recorder = recorder.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let mut span = recorder.begin(format!("worker-{}", t), Metadata::new());
                    span.annotate("iteration", i.to_string());
                    span.succeed().unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(recorder.len(), 200);
    assert_eq!(recorder.open_spans(), 0);
    let mut ids: Vec<_> = recorder.records().into_iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 200);
}

#[tokio::test]
async fn test_time_async_spans_await_points() {
    let recorder = TimingRecorder::default();
    let timed = recorder
        .time_async("fetch", Metadata::new(), async {
            tokio::time::sleep(StdDuration::from_millis(5)).await;
            Ok::<_, String>("done")
        })
        .await;

    assert_eq!(timed.result, Ok("done"));
    assert!(timed.record.duration_ms >= 5.0);
    assert_eq!(timed.record.duration_ms, exact_ms(&timed.record));
}

#[tokio::test]
async fn test_cancelled_future_closes_span() {
    let recorder = TimingRecorder::default();
    let slow = recorder.time_async("never", Metadata::new(), async {
        tokio::time::sleep(StdDuration::from_secs(60)).await;
        Ok::<_, String>(())
    });
    let timed_out = tokio::time::timeout(StdDuration::from_millis(5), slow).await;
    assert!(timed_out.is_err());

    assert_eq!(recorder.open_spans(), 0);
    assert_eq!(recorder.records()[0].status, SpanStatus::Failure);
}

#[test]
fn test_global_recorder_is_shared() {
    let a = global();
    let b = global();
    assert!(std::ptr::eq(a, b));
    assert_eq!(install_global(RecorderConfig::default()).unwrap_err(), TimingError::AlreadyInitialized);
}
