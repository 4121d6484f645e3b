//! Transform rules and their build-time type checks
//!
//! Rules form a closed set. Each variant declares what it accepts and what
//! it produces, and [`TransformRule::check`] verifies those declarations
//! against the source and target fields when a mapping is built, so a
//! rule/type mismatch never reaches execution.
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use super::coercion;
use crate::schema::{diff_field_types, TypeDiff};
use crate::types::{FieldDescriptor, FieldSchema, FieldType};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder replaced by the source value in string templates
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// A declared, type-checked conversion applied to one target field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformRule {
    /// Copy the source value unchanged
    Identity,

    /// Convert between primitive types
    TypeCast {
        to: FieldType,
        /// Truncate numeric results to integers
        #[serde(default)]
        integer: bool,
    },

    /// Render the source value into a template containing `{value}`
    StringFormat { template: String },

    /// Linear conversion: `value * scale + offset`
    NumericScale {
        scale: f64,
        #[serde(default)]
        offset: f64,
        #[serde(default)]
        integer: bool,
    },

    /// Parse a date with `from` (RFC 3339 when absent) and print it with `to`
    DateReformat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        to: String,
    },

    /// Emit a fixed value regardless of the source
    Constant { value: Value },

    /// Join several source fields into one string
    Concatenate {
        sources: Vec<String>,
        #[serde(default)]
        separator: String,
    },

    /// Map source values through a table
    LookupTable {
        entries: BTreeMap<String, Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
    },

    /// Choose between two values depending on whether the source equals `equals`
    Conditional {
        equals: Value,
        then: Value,
        otherwise: Value,
    },
}

impl TransformRule {
    /// Stable rule name used in diagnostics and exports
    pub fn name(&self) -> &'static str {
        match self {
            TransformRule::Identity => "identity",
            TransformRule::TypeCast { .. } => "type_cast",
            TransformRule::StringFormat { .. } => "string_format",
            TransformRule::NumericScale { .. } => "numeric_scale",
            TransformRule::DateReformat { .. } => "date_reformat",
            TransformRule::Constant { .. } => "constant",
            TransformRule::Concatenate { .. } => "concatenate",
            TransformRule::LookupTable { .. } => "lookup_table",
            TransformRule::Conditional { .. } => "conditional",
        }
    }

    /// Whether the rule reads the mapped source field
    pub fn needs_source(&self) -> bool {
        !matches!(
            self,
            TransformRule::Constant { .. } | TransformRule::Concatenate { .. }
        )
    }

    /// Whether the rule can supply a value without any mapped source
    pub fn is_self_sufficient(&self) -> bool {
        !self.needs_source()
    }

    /// Whether the declared input type accepts values of `source`
    pub fn accepts(&self, source: FieldType) -> bool {
        match self {
            TransformRule::Identity => true,
            TransformRule::TypeCast { to, .. } => !diff_field_types(source, *to).is_incompatible(),
            TransformRule::StringFormat { .. }
            | TransformRule::LookupTable { .. }
            | TransformRule::Conditional { .. } => source.is_scalar(),
            TransformRule::NumericScale { .. } => {
                matches!(source, FieldType::Number | FieldType::Unknown)
            }
            TransformRule::DateReformat { .. } => matches!(
                source,
                FieldType::Date | FieldType::String | FieldType::Unknown
            ),
            TransformRule::Constant { .. } | TransformRule::Concatenate { .. } => true,
        }
    }

    /// Declared output type given the source field's type
    pub fn output_type(&self, source: Option<FieldType>) -> FieldType {
        match self {
            TransformRule::Identity => source.unwrap_or(FieldType::Unknown),
            TransformRule::TypeCast { to, .. } => *to,
            TransformRule::StringFormat { .. } | TransformRule::Concatenate { .. } => {
                FieldType::String
            }
            TransformRule::NumericScale { .. } => FieldType::Number,
            TransformRule::DateReformat { .. } => FieldType::Date,
            TransformRule::Constant { value } => FieldType::of_value(value),
            TransformRule::LookupTable { entries, default } => {
                common_type(entries.values().chain(default.iter()))
            }
            TransformRule::Conditional { then, otherwise, .. } => {
                common_type([then, otherwise].into_iter())
            }
        }
    }

    /// Verify the rule against the fields it connects.
    ///
    /// Returns a human-readable reason on mismatch.
    pub fn check(
        &self,
        source: Option<&FieldDescriptor>,
        target: &FieldDescriptor,
        source_schema: &FieldSchema,
    ) -> Result<(), String> {
        if self.needs_source() && source.is_none() {
            return Err(format!("{} rule requires a source field", self.name()));
        }

        let source_type = source.map(|s| s.field_type);
        if let Some(st) = source_type {
            if self.needs_source() && !self.accepts(st) {
                return Err(format!("{} rule does not accept {} input", self.name(), st));
            }
        }

        match self {
            TransformRule::Identity => {
                let st = source_type.unwrap_or(FieldType::Unknown);
                if diff_field_types(st, target.field_type) != TypeDiff::Compatible {
                    return Err(format!(
                        "identity cannot turn {} into {}",
                        st, target.field_type
                    ));
                }
            }
            TransformRule::StringFormat { template } => {
                if !template.contains(VALUE_PLACEHOLDER) {
                    return Err(format!("template '{}' has no {} placeholder", template, VALUE_PLACEHOLDER));
                }
            }
            TransformRule::NumericScale { scale, offset, .. } => {
                if !scale.is_finite() || !offset.is_finite() {
                    return Err("scale and offset must be finite".to_string());
                }
            }
            TransformRule::DateReformat { from, to } => {
                if let Some(from) = from {
                    check_date_format(from)?;
                }
                check_date_format(to)?;
                if !matches!(
                    target.field_type,
                    FieldType::Date | FieldType::String | FieldType::Unknown
                ) {
                    return Err(format!("date_reformat cannot produce {}", target.field_type));
                }
                return Ok(());
            }
            TransformRule::Constant { value } => {
                return check_literal(self.name(), value, target.field_type);
            }
            TransformRule::Concatenate { sources, .. } => {
                if sources.is_empty() {
                    return Err("concatenate needs at least one source".to_string());
                }
                for name in sources {
                    let field = source_schema
                        .get(name)
                        .ok_or_else(|| format!("concatenate source '{}' does not exist", name))?;
                    if !field.field_type.is_scalar() {
                        return Err(format!(
                            "concatenate source '{}' is {}, not a scalar",
                            name, field.field_type
                        ));
                    }
                }
            }
            TransformRule::LookupTable { entries, default } => {
                if entries.is_empty() {
                    return Err("lookup table has no entries".to_string());
                }
                for value in entries.values().chain(default.iter()) {
                    check_literal(self.name(), value, target.field_type)?;
                }
                return Ok(());
            }
            TransformRule::Conditional { then, otherwise, .. } => {
                check_literal(self.name(), then, target.field_type)?;
                check_literal(self.name(), otherwise, target.field_type)?;
                return Ok(());
            }
            TransformRule::TypeCast { .. } => {}
        }

        let produced = self.output_type(source_type);
        if !fits(produced, target.field_type) {
            return Err(format!(
                "{} rule produces {}, target expects {}",
                self.name(),
                produced,
                target.field_type
            ));
        }

        Ok(())
    }
}

impl fmt::Display for TransformRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformRule::TypeCast { to, integer: true } => write!(f, "type_cast({}, integer)", to),
            TransformRule::TypeCast { to, .. } => write!(f, "type_cast({})", to),
            TransformRule::StringFormat { template } => write!(f, "string_format({:?})", template),
            TransformRule::NumericScale { scale, offset, .. } => {
                write!(f, "numeric_scale(x{} + {})", scale, offset)
            }
            TransformRule::DateReformat { to, .. } => write!(f, "date_reformat({:?})", to),
            TransformRule::Concatenate { sources, .. } => {
                write!(f, "concatenate({})", sources.join(", "))
            }
            other => f.write_str(other.name()),
        }
    }
}

/// Whether a produced type satisfies the target type
fn fits(produced: FieldType, target: FieldType) -> bool {
    produced == target || produced == FieldType::Unknown || target == FieldType::Unknown
}

/// Whether a literal the rule emits can land in the target; null always can
fn check_literal(rule: &str, value: &Value, target: FieldType) -> Result<(), String> {
    if value.is_null() || target == FieldType::Unknown {
        return Ok(());
    }
    if target == FieldType::Date {
        let parses = value
            .as_str()
            .is_some_and(|text| coercion::parse_datetime(text, None).is_some());
        return if parses {
            Ok(())
        } else {
            Err(format!("{} value {} is not a date", rule, value))
        };
    }
    let produced = FieldType::of_value(value);
    if produced == target {
        Ok(())
    } else {
        Err(format!(
            "{} value {} is {}, target expects {}",
            rule, value, produced, target
        ))
    }
}

/// The shared type of a set of values, or `Unknown` when they differ
fn common_type<'a>(mut values: impl Iterator<Item = &'a Value>) -> FieldType {
    let Some(first) = values.next() else {
        return FieldType::Unknown;
    };
    let first_type = FieldType::of_value(first);
    if values.all(|v| FieldType::of_value(v) == first_type) {
        first_type
    } else {
        FieldType::Unknown
    }
}

fn check_date_format(format: &str) -> Result<(), String> {
    if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid date format '{}'", format));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::normalize;
    use crate::types::{RawField, RawSchema};
    use serde_json::json;

    fn schema(fields: Vec<RawField>) -> FieldSchema {
        normalize(&RawSchema::new(fields)).unwrap()
    }

    fn field(name: &str, field_type: &str) -> FieldDescriptor {
        schema(vec![RawField::new(name, field_type)])
            .get(name)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_serde_tagging() {
        let rule: TransformRule = serde_json::from_value(json!({
            "kind": "type_cast",
            "to": "number",
            "integer": true
        }))
        .unwrap();
        assert_eq!(rule, TransformRule::TypeCast { to: FieldType::Number, integer: true });

        let encoded = serde_json::to_value(TransformRule::Identity).unwrap();
        assert_eq!(encoded, json!({"kind": "identity"}));
    }

    #[test]
    fn test_type_cast_checks() {
        let source_schema = schema(vec![]);
        let amount = field("amount", "string");
        let target = field("amount", "number");

        let cast = TransformRule::TypeCast { to: FieldType::Number, integer: false };
        assert!(cast.check(Some(&amount), &target, &source_schema).is_ok());

        let wrong_output = TransformRule::TypeCast { to: FieldType::Boolean, integer: false };
        let err = wrong_output.check(Some(&amount), &target, &source_schema).unwrap_err();
        assert!(err.contains("target expects number"));

        let object_source = field("payload", "object");
        let err = cast.check(Some(&object_source), &target, &source_schema).unwrap_err();
        assert!(err.contains("does not accept object"));
    }

    #[test]
    fn test_identity_requires_compatible_types() {
        let source_schema = schema(vec![]);
        let rule = TransformRule::Identity;
        assert!(rule
            .check(Some(&field("a", "string")), &field("b", "string"), &source_schema)
            .is_ok());
        assert!(rule
            .check(Some(&field("a", "string")), &field("b", "number"), &source_schema)
            .is_err());
        assert!(rule.check(None, &field("b", "string"), &source_schema).is_err());
    }

    #[test]
    fn test_string_format_needs_placeholder() {
        let source_schema = schema(vec![]);
        let rule = TransformRule::StringFormat { template: "USD".into() };
        let err = rule
            .check(Some(&field("a", "number")), &field("b", "string"), &source_schema)
            .unwrap_err();
        assert!(err.contains("placeholder"));
    }

    #[test]
    fn test_date_reformat_validates_formats() {
        let source_schema = schema(vec![]);
        let ok = TransformRule::DateReformat { from: Some("%d/%m/%Y".into()), to: "%Y-%m-%d".into() };
        assert!(ok
            .check(Some(&field("a", "string")), &field("b", "date"), &source_schema)
            .is_ok());

        let bad = TransformRule::DateReformat { from: None, to: "%Q".into() };
        assert!(bad
            .check(Some(&field("a", "date")), &field("b", "string"), &source_schema)
            .is_err());

        assert!(ok
            .check(Some(&field("a", "date")), &field("b", "number"), &source_schema)
            .is_err());
    }

    #[test]
    fn test_constant_and_concatenate_need_no_source() {
        let source_schema = schema(vec![
            RawField::new("first", "string"),
            RawField::new("last", "string"),
            RawField::new("tags", "array"),
        ]);

        let constant = TransformRule::Constant { value: json!("active") };
        assert!(constant.check(None, &field("status", "string"), &source_schema).is_ok());
        assert!(constant.check(None, &field("status", "number"), &source_schema).is_err());

        let date_constant = TransformRule::Constant { value: json!("2024-01-31") };
        assert!(date_constant.check(None, &field("since", "date"), &source_schema).is_ok());

        let concat = TransformRule::Concatenate {
            sources: vec!["first".into(), "last".into()],
            separator: " ".into(),
        };
        assert!(concat.check(None, &field("name", "string"), &source_schema).is_ok());

        let missing = TransformRule::Concatenate { sources: vec!["middle".into()], separator: String::new() };
        assert!(missing.check(None, &field("name", "string"), &source_schema).unwrap_err().contains("middle"));

        let non_scalar = TransformRule::Concatenate { sources: vec!["tags".into()], separator: String::new() };
        assert!(non_scalar.check(None, &field("name", "string"), &source_schema).is_err());
    }

    #[test]
    fn test_lookup_output_type() {
        let mut entries = BTreeMap::new();
        entries.insert("A".to_string(), json!(1));
        entries.insert("B".to_string(), json!(2));
        let numeric = TransformRule::LookupTable { entries: entries.clone(), default: None };
        assert_eq!(numeric.output_type(Some(FieldType::String)), FieldType::Number);

        let mixed = TransformRule::LookupTable { entries, default: Some(json!("n/a")) };
        assert_eq!(mixed.output_type(Some(FieldType::String)), FieldType::Unknown);

        let source_schema = schema(vec![]);
        let grade = field("grade", "string");
        assert!(numeric.check(Some(&grade), &field("score", "string"), &source_schema).is_err());
        assert!(numeric.check(Some(&grade), &field("score", "number"), &source_schema).is_ok());

        let reason = mixed
            .check(Some(&grade), &field("score", "number"), &source_schema)
            .unwrap_err();
        assert!(reason.contains("\"n/a\""), "{}", reason);
    }

    #[test]
    fn test_table_values_checked_one_by_one() {
        let source_schema = schema(vec![]);
        let grade = field("grade", "string");
        let score = field("score", "number");

        let mut entries = BTreeMap::new();
        entries.insert("A".to_string(), json!(1));
        entries.insert("B".to_string(), json!(null));
        let nullable = TransformRule::LookupTable { entries, default: Some(json!(0)) };
        assert!(nullable.check(Some(&grade), &score, &source_schema).is_ok());

        let mixed = TransformRule::Conditional {
            equals: json!("A"),
            then: json!(1),
            otherwise: json!("none"),
        };
        assert!(mixed.check(Some(&grade), &score, &source_schema).is_err());
        assert!(mixed.check(Some(&grade), &field("note", "unknown"), &source_schema).is_ok());

        let dates = TransformRule::Conditional {
            equals: json!(true),
            then: json!("2024-01-31"),
            otherwise: json!("soon"),
        };
        let flag = field("flag", "boolean");
        assert!(dates.check(Some(&flag), &field("since", "date"), &source_schema).is_err());
    }

    #[test]
    fn test_display() {
        let rule = TransformRule::TypeCast { to: FieldType::Number, integer: true };
        assert_eq!(rule.to_string(), "type_cast(number, integer)");
        assert_eq!(TransformRule::Identity.to_string(), "identity");
    }
}
