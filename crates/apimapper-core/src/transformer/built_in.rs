//! Pre-configured rules for common conversions
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use super::rule::TransformRule;
use crate::types::FieldType;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Parse text or booleans as a number
pub fn to_number() -> TransformRule {
    TransformRule::TypeCast {
        to: FieldType::Number,
        integer: false,
    }
}

/// Parse as a number and drop any fractional part
pub fn to_integer() -> TransformRule {
    TransformRule::TypeCast {
        to: FieldType::Number,
        integer: true,
    }
}

/// Render scalars as text
pub fn to_text() -> TransformRule {
    TransformRule::TypeCast {
        to: FieldType::String,
        integer: false,
    }
}

/// Minor currency units (cents) to major units
pub fn cents_to_units() -> TransformRule {
    TransformRule::NumericScale {
        scale: 0.01,
        offset: 0.0,
        integer: false,
    }
}

/// Major currency units to whole minor units
pub fn units_to_cents() -> TransformRule {
    TransformRule::NumericScale {
        scale: 100.0,
        offset: 0.0,
        integer: true,
    }
}

/// Celsius to Fahrenheit
pub fn celsius_to_fahrenheit() -> TransformRule {
    TransformRule::NumericScale {
        scale: 1.8,
        offset: 32.0,
        integer: false,
    }
}

/// Any parseable date to `YYYY-MM-DD`
pub fn iso_date() -> TransformRule {
    TransformRule::DateReformat {
        from: None,
        to: "%Y-%m-%d".to_string(),
    }
}

/// Boolean to `"yes"`/`"no"`
pub fn yes_no() -> TransformRule {
    TransformRule::Conditional {
        equals: Value::Bool(true),
        then: json!("yes"),
        otherwise: json!("no"),
    }
}

/// Lookup table from string pairs, with an optional fallback
pub fn lookup<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    default: Option<&str>,
) -> TransformRule {
    let entries: BTreeMap<String, Value> = pairs
        .into_iter()
        .map(|(from, to)| (from.to_string(), Value::String(to.to_string())))
        .collect();
    TransformRule::LookupTable {
        entries,
        default: default.map(|d| Value::String(d.to_string())),
    }
}
