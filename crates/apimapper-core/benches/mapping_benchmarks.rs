//! Benchmarks for schema normalization, mapping resolution and transformation
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use apimapper_core::mapping::resolve;
use apimapper_core::schema::{normalize, SchemaRegistry};
use apimapper_core::transformer::{apply, apply_batch};
use apimapper_core::{RawField, RawSchema};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Map, Value};

const TYPES: [&str; 4] = ["string", "number", "boolean", "date"];

fn wide_schema(prefix: &str, width: usize) -> RawSchema {
    (0..width)
        .map(|i| RawField::new(format!("{}_field_{}", prefix, i), TYPES[i % TYPES.len()]))
        .collect()
}

fn renamed_target(width: usize) -> RawSchema {
    (0..width)
        .map(|i| RawField::new(format!("Src-Field-{}", i), TYPES[i % TYPES.len()]))
        .collect()
}

fn record(width: usize) -> Value {
    let fields: Map<String, Value> = (0..width)
        .map(|i| {
            let value = match i % TYPES.len() {
                0 => json!(format!("value {}", i)),
                1 => json!(i as f64 * 1.5),
                2 => json!(i % 2 == 0),
                _ => json!("2024-01-31"),
            };
            (format!("src_field_{}", i), value)
        })
        .collect();
    Value::Object(fields)
}

fn bench_normalize(c: &mut Criterion) {
    let raw = wide_schema("src", 64);
    let registry = SchemaRegistry::new();

    c.bench_function("normalize_uncached_64", |b| b.iter(|| normalize(black_box(&raw))));
    c.bench_function("normalize_cached_64", |b| b.iter(|| registry.normalize(black_box(&raw))));
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for width in [8, 32, 128] {
        let source = normalize(&wide_schema("src", width)).unwrap();
        let target = normalize(&renamed_target(width)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| resolve(black_box(&source), black_box(&target), &[]))
        });
    }
    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let width = 32;
    let source = normalize(&wide_schema("src", width)).unwrap();
    let target = normalize(&renamed_target(width)).unwrap();
    let mapping = resolve(&source, &target, &[]).unwrap();
    let input = record(width);
    let batch: Vec<Value> = (0..100).map(|_| input.clone()).collect();

    c.bench_function("apply_record_32", |b| b.iter(|| apply(black_box(&mapping), black_box(&input))));
    c.bench_function("apply_batch_100x32", |b| {
        b.iter(|| apply_batch(black_box(&mapping), black_box(&batch)))
    });
}

criterion_group!(benches, bench_normalize, bench_resolve, bench_apply);
criterion_main!(benches);
