//! Property-based testing strategies for generating test data
//!
//! This module provides proptest strategies for generating random but valid
//! raw schemas and records, plus the engine-wide properties checked with
//! them.

#![cfg(test)]

use crate::types::*;
use proptest::collection::{btree_map, vec};
use proptest::option;
use proptest::prelude::*;
use serde_json::{Map, Number, Value};

/// Strategy for type names as UI layers write them, aliases included
pub fn type_name_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("string"),
        Just("text"),
        Just("number"),
        Just("int"),
        Just("float"),
        Just("boolean"),
        Just("bool"),
        Just("date"),
        Just("object"),
        Just("array"),
        Just("mystery"),
    ]
}

/// Strategy for field names with assorted separators
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z_-]{0,8}"
}

/// Strategy for scalar JSON values
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        (-1.0e6f64..1.0e6)
            .prop_filter_map("finite", Number::from_f64)
            .prop_map(Value::Number),
        "[a-z0-9 .:-]{0,12}".prop_map(Value::String),
    ]
}

/// Strategy for raw schemas with unique field names
pub fn raw_schema_strategy(max_fields: usize) -> impl Strategy<Value = RawSchema> {
    btree_map(
        field_name_strategy(),
        (type_name_strategy(), any::<bool>(), option::weighted(0.3, any::<i16>())),
        0..max_fields,
    )
    .prop_map(|fields| {
        fields
            .into_iter()
            .map(|(name, (type_name, required, default))| {
                let field = RawField::new(name, type_name);
                let field = if required { field.required() } else { field };
                match default {
                    Some(value) => field.with_default(Value::from(value)),
                    None => field,
                }
            })
            .collect()
    })
}

/// Strategy for records keyed by the given schema's names, with gaps
pub fn record_strategy(raw: &RawSchema) -> impl Strategy<Value = Value> {
    let names: Vec<String> = raw.fields.iter().map(|f| f.name.clone()).collect();
    vec(option::of(scalar_value_strategy()), names.len()).prop_map(move |values| {
        let map: Map<String, Value> = names
            .iter()
            .zip(values)
            .filter_map(|(name, value)| value.map(|v| (name.clone(), v)))
            .collect();
        Value::Object(map)
    })
}

/// Source schema, target schema and a record of the source schema
pub fn mapping_case_strategy() -> impl Strategy<Value = (RawSchema, RawSchema, Value)> {
    (raw_schema_strategy(8), raw_schema_strategy(6)).prop_flat_map(|(source, target)| {
        let record = record_strategy(&source);
        (Just(source), Just(target), record)
    })
}

mod properties {
    use super::*;
    use crate::mapping::{resolve, MappingStatus};
    use crate::schema::{normalize, RegistryConfig, SchemaRegistry};
    use crate::transformer::apply;

    proptest! {
        #[test]
        fn resolve_is_deterministic((source, target, _record) in mapping_case_strategy()) {
            let source = normalize(&source).unwrap();
            let target = normalize(&target).unwrap();
            prop_assert_eq!(resolve(&source, &target, &[]), resolve(&source, &target, &[]));
        }

        #[test]
        fn accepted_mappings_cover_required_targets((source, target, _record) in mapping_case_strategy()) {
            let source = normalize(&source).unwrap();
            let target = normalize(&target).unwrap();
            if let Ok(mapping) = resolve(&source, &target, &[]) {
                for (field, resolved) in target.iter().zip(mapping.fields()) {
                    prop_assert_eq!(&field.name, &resolved.target);
                    if field.required {
                        prop_assert!(resolved.status.is_mapped() || field.default.is_some());
                    }
                    if let MappingStatus::Ambiguous { candidates } = &resolved.status {
                        prop_assert!(!candidates.is_empty());
                        prop_assert!(resolved.source.is_none());
                    }
                }
            }
        }

        #[test]
        fn apply_is_read_only_and_repeatable((source, target, record) in mapping_case_strategy()) {
            let source = normalize(&source).unwrap();
            let target = normalize(&target).unwrap();
            if let Ok(mapping) = resolve(&source, &target, &[]) {
                let snapshot = record.clone();
                let first = apply(&mapping, &record).unwrap();
                let second = apply(&mapping, &record).unwrap();
                prop_assert_eq!(&record, &snapshot);
                prop_assert_eq!(&first, &second);
                for issue in &first.errors {
                    prop_assert!(!first.record.contains_key(&issue.field));
                }
            }
        }

        #[test]
        fn cache_never_changes_normalization(raw in raw_schema_strategy(10)) {
            let cached = SchemaRegistry::new();
            let uncached = SchemaRegistry::with_config(RegistryConfig {
                cache_enabled: false,
                ..RegistryConfig::default()
            });
            let warm_up = cached.normalize(&raw);
            prop_assert_eq!(cached.normalize(&raw), warm_up);
            prop_assert_eq!(cached.normalize(&raw), uncached.normalize(&raw));
        }
    }
}
