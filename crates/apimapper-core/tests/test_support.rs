//! Shared test support utilities for integration tests

#![allow(dead_code)]

use apimapper_core::mapping::{resolve, FieldHint, Mapping};
use apimapper_core::schema::normalize;
use apimapper_core::timing::{RecorderConfig, RetentionPolicy, TimingRecorder};
use apimapper_core::{FieldSchema, RawField, RawSchema};

/// Normalize a list of raw fields
pub fn schema(fields: Vec<RawField>) -> FieldSchema {
    normalize(&RawSchema::new(fields)).expect("test schema should normalize")
}

/// Resolve a mapping between two raw field lists
pub fn mapping(source: Vec<RawField>, target: Vec<RawField>, hints: &[FieldHint]) -> Mapping {
    resolve(&schema(source), &schema(target), hints).expect("test mapping should resolve")
}

/// An isolated recorder that keeps every record
pub fn unbounded_recorder() -> TimingRecorder {
    TimingRecorder::new(RecorderConfig {
        retention: RetentionPolicy::unbounded(),
        ..RecorderConfig::default()
    })
}

/// A customer record as the source API returns it
pub fn customer_source() -> Vec<RawField> {
    vec![
        RawField::new("customer_id", "int").required(),
        RawField::new("Full-Name", "string").required(),
        RawField::new("email_address", "string"),
        RawField::new("signup", "datetime").at("meta.created"),
        RawField::new("balance_cents", "number"),
        RawField::new("vip", "bool"),
    ]
}

/// The same customer as the target API expects it
pub fn customer_target() -> Vec<RawField> {
    vec![
        RawField::new("customerId", "number").required(),
        RawField::new("full_name", "string").required(),
        RawField::new("email", "string"),
        RawField::new("created", "date"),
        RawField::new("balance", "number"),
        RawField::new("tier", "string").with_default(serde_json::json!("standard")),
    ]
}
