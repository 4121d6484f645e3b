//! Value-level conversions used by transform rules
//!
//! Every function here is total over its input: a value that cannot be
//! converted yields `Err(reason)`, and a conversion that succeeds but loses
//! information reports a note that the engine turns into a warning.

use super::result::{REASON_COERCED, REASON_TRUNCATED};
use crate::types::FieldType;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};
use std::fmt::Write;

/// Largest integer an `f64` represents exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A converted value and an optional lossiness note
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Coerced {
    pub value: Value,
    pub note: Option<&'static str>,
}

impl Coerced {
    pub fn exact(value: Value) -> Self {
        Self { value, note: None }
    }

    pub fn lossy(value: Value, note: &'static str) -> Self {
        Self {
            value,
            note: Some(note),
        }
    }
}

/// Convert a value to the given field type
pub(crate) fn cast(value: &Value, to: FieldType, integer: bool) -> Result<Coerced, String> {
    match (to, value) {
        (_, Value::Null) | (FieldType::Unknown, _) => Ok(Coerced::exact(value.clone())),

        (FieldType::String, Value::String(_)) => Ok(Coerced::exact(value.clone())),
        (FieldType::String, Value::Number(_) | Value::Bool(_)) => {
            scalar_text(value).map(|text| Coerced::exact(Value::String(text)))
        }

        (FieldType::Number, Value::Number(n)) => {
            if !integer || n.is_i64() || n.is_u64() {
                Ok(Coerced::exact(value.clone()))
            } else {
                number_value(number_to_f64(n)?, true)
            }
        }
        (FieldType::Number, Value::String(text)) => {
            if let Ok(int) = text.trim().parse::<i64>() {
                return Ok(Coerced::exact(Value::from(int)));
            }
            number_value(parse_number(text)?, integer)
        }
        (FieldType::Number, Value::Bool(flag)) => Ok(Coerced::exact(Value::from(i64::from(*flag)))),

        (FieldType::Boolean, Value::Bool(_)) => Ok(Coerced::exact(value.clone())),
        (FieldType::Boolean, Value::String(text)) => parse_bool(text).map(|b| Coerced::exact(Value::Bool(b))),
        (FieldType::Boolean, Value::Number(n)) => {
            let number = number_to_f64(n)?;
            if number == 0.0 {
                Ok(Coerced::exact(Value::Bool(false)))
            } else if number == 1.0 {
                Ok(Coerced::exact(Value::Bool(true)))
            } else {
                Ok(Coerced::lossy(Value::Bool(true), REASON_COERCED))
            }
        }

        (FieldType::Date, Value::String(text)) => normalize_date(text).map(|d| Coerced::exact(Value::String(d))),
        (FieldType::Date, Value::Number(_)) => {
            let parsed = date_from_value(value, None)?;
            Ok(Coerced::exact(Value::String(parsed.to_rfc3339())))
        }

        (FieldType::Object, Value::Object(_)) | (FieldType::Array, Value::Array(_)) => {
            Ok(Coerced::exact(value.clone()))
        }

        (to, value) => Err(format!(
            "cannot cast {} to {}",
            FieldType::of_value(value),
            to
        )),
    }
}

/// Read a numeric value, accepting numeric strings
pub(crate) fn to_number(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => number_to_f64(n),
        Value::String(text) => parse_number(text),
        other => Err(format!("expected a number, found {}", FieldType::of_value(other))),
    }
}

/// Encode an `f64` as a JSON number, truncating when `integer` is set
pub(crate) fn number_value(number: f64, integer: bool) -> Result<Coerced, String> {
    if !number.is_finite() {
        return Err("result is not a finite number".to_string());
    }

    if integer && number.fract() != 0.0 {
        return integral(number.trunc()).map(|v| Coerced::lossy(v, REASON_TRUNCATED));
    }

    if number.fract() == 0.0 && number.abs() < MAX_SAFE_INTEGER {
        return integral(number).map(Coerced::exact);
    }

    Number::from_f64(number)
        .map(|n| Coerced::exact(Value::Number(n)))
        .ok_or_else(|| "result is not a finite number".to_string())
}

/// Render a scalar as text; null and containers have no text form
pub(crate) fn scalar_text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Err("value is null".to_string()),
        other => Err(format!("cannot render {} as text", FieldType::of_value(other))),
    }
}

/// Parse a date or date-time.
///
/// With an explicit chrono format the text may carry an offset, a naive
/// date-time, or a bare date. Without one RFC 3339 is expected, with
/// `%Y-%m-%dT%H:%M:%S` and `%Y-%m-%d` accepted as UTC.
pub(crate) fn parse_datetime(text: &str, format: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    match format {
        Some(format) => DateTime::parse_from_str(text, format)
            .ok()
            .or_else(|| naive_utc(NaiveDateTime::parse_from_str(text, format).ok()))
            .or_else(|| {
                naive_utc(
                    NaiveDate::parse_from_str(text, format)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0)),
                )
            }),
        None => DateTime::parse_from_rfc3339(text)
            .ok()
            .or_else(|| naive_utc(NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").ok()))
            .or_else(|| {
                naive_utc(
                    NaiveDate::parse_from_str(text, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0)),
                )
            }),
    }
}

/// Interpret a string or Unix timestamp (seconds) as a date-time
pub(crate) fn date_from_value(value: &Value, format: Option<&str>) -> Result<DateTime<FixedOffset>, String> {
    match value {
        Value::String(text) => parse_datetime(text, format).ok_or_else(|| {
            format!(
                "'{}' does not match {}",
                text,
                format.unwrap_or("RFC 3339")
            )
        }),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(Into::into)
            .ok_or_else(|| format!("{} is not a valid timestamp", n)),
        other => Err(format!("expected a date, found {}", FieldType::of_value(other))),
    }
}

/// Format a date-time with a chrono format string
pub(crate) fn format_datetime(date: &DateTime<FixedOffset>, format: &str) -> Result<String, String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format)).map_err(|_| format!("cannot format date with '{}'", format))?;
    Ok(out)
}

fn normalize_date(text: &str) -> Result<String, String> {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.format("%Y-%m-%d").to_string());
    }
    parse_datetime(trimmed, None)
        .map(|d| d.to_rfc3339())
        .ok_or_else(|| format!("'{}' is not a recognised date", text))
}

fn naive_utc(naive: Option<NaiveDateTime>) -> Option<DateTime<FixedOffset>> {
    naive.map(|n| n.and_utc().into())
}

fn parse_number(text: &str) -> Result<f64, String> {
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && !trimmed.is_empty())
        .ok_or_else(|| format!("'{}' is not numeric", text))
}

fn parse_bool(text: &str) -> Result<bool, String> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(format!("'{}' is not a boolean", text)),
    }
}

fn number_to_f64(n: &Number) -> Result<f64, String> {
    n.as_f64().ok_or_else(|| format!("{} is out of range", n))
}

fn integral(number: f64) -> Result<Value, String> {
    if number.abs() < MAX_SAFE_INTEGER {
        Ok(Value::from(number as i64))
    } else {
        Number::from_f64(number)
            .map(Value::Number)
            .ok_or_else(|| "result is not a finite number".to_string())
    }
}
