//! Schema normalization and type comparison
//!
//! [`normalize`] turns the presentation layer's raw field list into a
//! [`FieldSchema`] with parsed paths, rejecting name and path collisions.
//! [`diff_types`] classifies how a source field relates to a target field and
//! suggests conversion rules when the types differ but a conversion exists.
//!
//! [`SchemaRegistry`] adds a bounded cache keyed by the raw schema's content.
//! The cache is an optimization only: a disabled or cold cache returns the
//! same schema as a warm one.
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use super::error::SchemaError;
use super::path::FieldPath;
use crate::transformer::TransformRule;
use crate::types::{FieldDescriptor, FieldSchema, FieldType, RawSchema};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, PoisonError};

/// Outcome of comparing a source field type against a target field type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDiff {
    /// Values can be copied unchanged
    Compatible,
    /// Values need a conversion; rules are listed in preference order
    Coercible(Vec<TransformRule>),
    /// No conversion exists
    Incompatible,
}

impl TypeDiff {
    pub fn is_incompatible(&self) -> bool {
        matches!(self, TypeDiff::Incompatible)
    }
}

/// Normalize a raw schema into a field schema
pub fn normalize(raw: &RawSchema) -> Result<FieldSchema, SchemaError> {
    let mut names = HashSet::new();
    let mut paths: HashMap<FieldPath, String> = HashMap::new();
    let mut fields = Vec::with_capacity(raw.fields.len());

    for (position, raw_field) in raw.fields.iter().enumerate() {
        let name = raw_field.name.trim();
        if name.is_empty() {
            return Err(SchemaError::EmptyName { position });
        }
        if !names.insert(name.to_string()) {
            return Err(SchemaError::DuplicateField {
                name: name.to_string(),
            });
        }

        let path = match raw_field.path.as_deref() {
            Some(expr) => FieldPath::parse(expr)?,
            None => FieldPath::key(name),
        };

        if let Some(first) = paths.get(&path) {
            return Err(SchemaError::DuplicatePath {
                path: path.to_string(),
                first: first.clone(),
                second: name.to_string(),
            });
        }
        paths.insert(path.clone(), name.to_string());

        fields.push(FieldDescriptor {
            name: name.to_string(),
            field_type: FieldType::parse_loose(&raw_field.field_type),
            required: raw_field.required,
            path,
            default: raw_field.default.clone(),
        });
    }

    Ok(FieldSchema::from_checked(fields))
}

/// Compare a source field against a target field
pub fn diff_types(source: &FieldDescriptor, target: &FieldDescriptor) -> TypeDiff {
    diff_field_types(source.field_type, target.field_type)
}

/// Compare two field types
pub fn diff_field_types(source: FieldType, target: FieldType) -> TypeDiff {
    use FieldType::*;

    if source == target || source == Unknown || target == Unknown {
        return TypeDiff::Compatible;
    }

    let cast = |to: FieldType| TransformRule::TypeCast { to, integer: false };

    match (source, target) {
        (String, Number) | (Boolean, Number) => TypeDiff::Coercible(vec![cast(Number)]),
        (String, Boolean) | (Number, Boolean) => TypeDiff::Coercible(vec![cast(Boolean)]),
        (String, Date) => TypeDiff::Coercible(vec![cast(Date)]),
        (Number, String) => TypeDiff::Coercible(vec![
            cast(String),
            TransformRule::StringFormat {
                template: "{value}".to_string(),
            },
        ]),
        (Boolean, String) => TypeDiff::Coercible(vec![cast(String)]),
        (Date, String) => TypeDiff::Coercible(vec![
            cast(String),
            TransformRule::DateReformat {
                from: None,
                to: "%Y-%m-%d".to_string(),
            },
        ]),
        _ => TypeDiff::Incompatible,
    }
}

/// Configuration for the normalization cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Whether normalized schemas are cached
    pub cache_enabled: bool,

    /// Maximum number of cached schemas
    pub max_entries: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            max_entries: 256,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    raw: RawSchema,
    schema: FieldSchema,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<u64, CacheEntry>,
    insertion_order: VecDeque<u64>,
}

/// Normalizer with an optional content-keyed cache
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    config: RegistryConfig,
    cache: Mutex<CacheState>,
}

impl SchemaRegistry {
    /// Create a registry with the default cache configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(CacheState::default()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Normalize a raw schema, reusing a cached result for identical input
    pub fn normalize(&self, raw: &RawSchema) -> Result<FieldSchema, SchemaError> {
        if !self.config.cache_enabled || self.config.max_entries == 0 {
            return normalize(raw);
        }

        let Some(key) = content_key(raw) else {
            return normalize(raw);
        };

        {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = cache.entries.get(&key) {
                if entry.raw == *raw {
                    tracing::trace!(fields = raw.fields.len(), "schema cache hit");
                    return Ok(entry.schema.clone());
                }
            }
        }

        // Errors are not cached; a corrected schema has a different key anyway.
        let schema = normalize(raw)?;

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if !cache.entries.contains_key(&key) {
            while cache.entries.len() >= self.config.max_entries {
                match cache.insertion_order.pop_front() {
                    Some(oldest) => {
                        cache.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
            cache.insertion_order.push_back(key);
            cache.entries.insert(
                key,
                CacheEntry {
                    raw: raw.clone(),
                    schema: schema.clone(),
                },
            );
        }

        Ok(schema)
    }

    /// Number of cached schemas
    pub fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Drop every cached schema
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.entries.clear();
        cache.insertion_order.clear();
    }
}

/// Hash of the raw schema's canonical JSON encoding
fn content_key(raw: &RawSchema) -> Option<u64> {
    let encoded = serde_json::to_string(raw).ok()?;
    let mut hasher = DefaultHasher::new();
    encoded.hash(&mut hasher);
    Some(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawField;
    use serde_json::json;

    fn raw(fields: Vec<RawField>) -> RawSchema {
        RawSchema::new(fields)
    }

    #[test]
    fn test_normalize_defaults_path_to_name() {
        let schema = normalize(&raw(vec![
            RawField::new("full_name", "string").required(),
            RawField::new("city", "string").at("address.city"),
        ]))
        .unwrap();

        assert_eq!(schema.len(), 2);
        let name = schema.get("full_name").unwrap();
        assert_eq!(name.path, FieldPath::key("full_name"));
        assert!(name.required);
        assert_eq!(schema.get("city").unwrap().path.to_string(), "address.city");
    }

    #[test]
    fn test_normalize_rejects_duplicate_names() {
        let err = normalize(&raw(vec![
            RawField::new("id", "number"),
            RawField::new("id", "string"),
        ]))
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField { name: "id".into() });
    }

    #[test]
    fn test_normalize_rejects_shared_paths() {
        let err = normalize(&raw(vec![
            RawField::new("a", "string").at("x.y"),
            RawField::new("b", "string").at("$.x.y"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicatePath { ref first, ref second, .. }
            if first == "a" && second == "b"));
    }

    #[test]
    fn test_normalize_rejects_bad_path_and_empty_name() {
        let err = normalize(&raw(vec![RawField::new("a", "string").at("x[")])).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPath { .. }));

        let err = normalize(&raw(vec![RawField::new("  ", "string")])).unwrap_err();
        assert_eq!(err, SchemaError::EmptyName { position: 0 });
    }

    #[test]
    fn test_diff_field_types_matrix() {
        use FieldType::*;

        assert_eq!(diff_field_types(String, String), TypeDiff::Compatible);
        assert_eq!(diff_field_types(Unknown, Object), TypeDiff::Compatible);
        assert_eq!(
            diff_field_types(String, Number),
            TypeDiff::Coercible(vec![TransformRule::TypeCast { to: Number, integer: false }])
        );
        assert!(matches!(diff_field_types(Date, String), TypeDiff::Coercible(ref rules) if rules.len() == 2));
        assert!(diff_field_types(Object, String).is_incompatible());
        assert!(diff_field_types(Number, Array).is_incompatible());
        assert!(diff_field_types(Boolean, Date).is_incompatible());
    }

    #[test]
    fn test_registry_cache_matches_uncached_result() {
        let input = raw(vec![
            RawField::new("amount", "float").with_default(json!(0)),
            RawField::new("currency", "string"),
        ]);

        let cached = SchemaRegistry::new();
        let uncached = SchemaRegistry::with_config(RegistryConfig {
            cache_enabled: false,
            ..RegistryConfig::default()
        });

        let first = cached.normalize(&input).unwrap();
        let second = cached.normalize(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, uncached.normalize(&input).unwrap());
        assert_eq!(cached.cached_len(), 1);
        assert_eq!(uncached.cached_len(), 0);
    }

    #[test]
    fn test_registry_cache_is_bounded() {
        let registry = SchemaRegistry::with_config(RegistryConfig {
            cache_enabled: true,
            max_entries: 2,
        });

        for name in ["a", "b", "c"] {
            registry.normalize(&raw(vec![RawField::new(name, "string")])).unwrap();
        }
        assert_eq!(registry.cached_len(), 2);

        registry.clear_cache();
        assert_eq!(registry.cached_len(), 0);
    }

    #[test]
    fn test_registry_does_not_cache_errors() {
        let registry = SchemaRegistry::new();
        let bad = raw(vec![RawField::new("a", "string"), RawField::new("a", "string")]);
        assert!(registry.normalize(&bad).is_err());
        assert!(registry.normalize(&bad).is_err());
        assert_eq!(registry.cached_len(), 0);
    }
}
