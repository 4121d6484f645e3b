//! Transformation engine
//!
//! Applies a resolved [`Mapping`] to source records. The engine only reads
//! the source record. Field-level failures are collected into the result so
//! one bad field never hides the others.
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use super::coercion::{self, Coerced};
use super::result::{BatchResult, TransformationResult, REASON_DEFAULTED, REASON_LOOKUP_DEFAULT};
use super::rule::{TransformRule, VALUE_PLACEHOLDER};
use crate::error::{Error, Result};
use crate::mapping::{FieldMapping, Mapping};
use crate::types::{FieldDescriptor, FieldSchema};
use serde_json::Value;

/// Transform one source record
///
/// Returns `Err` only when the mapping violates its own invariants (an
/// unmapped required target without a default); every data problem is
/// reported inside the returned [`TransformationResult`].
pub fn apply(mapping: &Mapping, record: &Value) -> Result<TransformationResult> {
    let mut result = TransformationResult::default();

    for (target, field) in mapping.target.iter().zip(&mapping.fields) {
        apply_field(mapping, target, field, record, &mut result)?;
    }

    if !result.errors.is_empty() {
        tracing::debug!(errors = result.errors.len(), "record transformed with errors");
    }

    Ok(result)
}

/// Transform a batch of records, one result per record in input order
pub fn apply_batch(mapping: &Mapping, records: &[Value]) -> Result<BatchResult> {
    let results = records
        .iter()
        .map(|record| apply(mapping, record))
        .collect::<Result<Vec<_>>>()?;

    let batch = BatchResult::from_results(results);
    tracing::debug!(
        total = batch.summary.total,
        failed = batch.summary.failed,
        warnings = batch.summary.warnings,
        "batch transformed"
    );
    Ok(batch)
}

fn apply_field(
    mapping: &Mapping,
    target: &FieldDescriptor,
    field: &FieldMapping,
    record: &Value,
    result: &mut TransformationResult,
) -> Result<()> {
    let name = target.name.as_str();

    let Some(rule) = &field.rule else {
        match (&target.default, target.required) {
            (Some(default), _) => {
                result.record.insert(name.to_string(), default.clone());
            }
            (None, true) => {
                return Err(Error::internal(format!(
                    "required target '{}' reached the engine without a source or default",
                    name
                )));
            }
            (None, false) => {}
        }
        return Ok(());
    };

    let value = match &field.source {
        Some(source_name) => {
            let source = mapping.source.get(source_name).ok_or_else(|| {
                Error::internal(format!(
                    "target '{}' maps from unknown source '{}'",
                    name, source_name
                ))
            })?;
            match source.path.resolve(record) {
                Some(value) => Some(value),
                None => {
                    missing_source(target, source, result);
                    return Ok(());
                }
            }
        }
        None => None,
    };

    if let Some(absent) = first_absent_part(rule, record, &mapping.source) {
        missing_source(target, absent, result);
        return Ok(());
    }

    match evaluate(rule, value, record, &mapping.source) {
        Ok(Coerced { value, note }) => {
            if let Some(note) = note {
                result.warn(name, note);
            }
            result.record.insert(name.to_string(), value);
        }
        Err(reason) => result.fail(name, reason),
    }

    Ok(())
}

/// Fallback when the source path does not resolve in the record
fn missing_source(target: &FieldDescriptor, source: &FieldDescriptor, result: &mut TransformationResult) {
    let name = target.name.as_str();
    if let Some(default) = &target.default {
        result.record.insert(name.to_string(), default.clone());
        result.warn(name, REASON_DEFAULTED);
    } else if target.required {
        result.fail(name, format!("source field '{}' is missing at '{}'", source.name, source.path));
    }
}

/// First concatenate source whose path does not resolve in the record
fn first_absent_part<'s>(
    rule: &TransformRule,
    record: &Value,
    source_schema: &'s FieldSchema,
) -> Option<&'s FieldDescriptor> {
    let TransformRule::Concatenate { sources, .. } = rule else {
        return None;
    };
    sources
        .iter()
        .filter_map(|name| source_schema.get(name))
        .find(|field| field.path.resolve(record).is_none())
}

/// Run a rule on the source value; `value` is `None` for source-free rules
fn evaluate(
    rule: &TransformRule,
    value: Option<&Value>,
    record: &Value,
    source_schema: &FieldSchema,
) -> std::result::Result<Coerced, String> {
    if let TransformRule::Constant { value } = rule {
        return Ok(Coerced::exact(value.clone()));
    }
    if let TransformRule::Concatenate { sources, separator } = rule {
        return concatenate(sources, separator, record, source_schema);
    }

    let value = value.ok_or_else(|| format!("{} rule has no source value", rule.name()))?;

    // Null is present but empty; value-shaping rules forward it.
    if value.is_null()
        && !matches!(rule, TransformRule::LookupTable { .. } | TransformRule::Conditional { .. })
    {
        return Ok(Coerced::exact(Value::Null));
    }

    match rule {
        TransformRule::Identity => Ok(Coerced::exact(value.clone())),
        TransformRule::TypeCast { to, integer } => coercion::cast(value, *to, *integer),
        TransformRule::StringFormat { template } => {
            let text = coercion::scalar_text(value)?;
            Ok(Coerced::exact(Value::String(template.replace(VALUE_PLACEHOLDER, &text))))
        }
        TransformRule::NumericScale { scale, offset, integer } => {
            let number = coercion::to_number(value)?;
            coercion::number_value(number * scale + offset, *integer)
        }
        TransformRule::DateReformat { from, to } => {
            let date = coercion::date_from_value(value, from.as_deref())?;
            coercion::format_datetime(&date, to).map(|text| Coerced::exact(Value::String(text)))
        }
        TransformRule::LookupTable { entries, default } => {
            let key = lookup_key(value)?;
            match (entries.get(&key), default) {
                (Some(found), _) => Ok(Coerced::exact(found.clone())),
                (None, Some(fallback)) => Ok(Coerced::lossy(fallback.clone(), REASON_LOOKUP_DEFAULT)),
                (None, None) => Err(format!("no lookup entry for '{}'", key)),
            }
        }
        TransformRule::Conditional { equals, then, otherwise } => {
            let matched = value == equals
                || matches!(
                    (coercion::scalar_text(value), coercion::scalar_text(equals)),
                    (Ok(a), Ok(b)) if a == b
                );
            Ok(Coerced::exact(if matched { then.clone() } else { otherwise.clone() }))
        }
        TransformRule::Constant { .. } | TransformRule::Concatenate { .. } => {
            Err(format!("{} rule evaluated out of order", rule.name()))
        }
    }
}

fn concatenate(
    sources: &[String],
    separator: &str,
    record: &Value,
    source_schema: &FieldSchema,
) -> std::result::Result<Coerced, String> {
    let mut parts = Vec::with_capacity(sources.len());
    for name in sources {
        let field = source_schema
            .get(name)
            .ok_or_else(|| format!("concatenate source '{}' does not exist", name))?;
        let value = field
            .path
            .resolve(record)
            .ok_or_else(|| format!("source field '{}' is missing at '{}'", name, field.path))?;
        if !value.is_null() {
            parts.push(coercion::scalar_text(value)?);
        }
    }
    Ok(Coerced::exact(Value::String(parts.join(separator))))
}

/// Key used for table lookups and loose equality; null is spelled `null`
fn lookup_key(value: &Value) -> std::result::Result<String, String> {
    if value.is_null() {
        Ok("null".to_string())
    } else {
        coercion::scalar_text(value)
    }
}
