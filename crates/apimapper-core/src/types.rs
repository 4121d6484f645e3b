//! Core types and data structures for the apimapper engine
//!
//! This module defines the schema-level data model shared by the registry,
//! the resolver and the transformation engine: field types, the raw field
//! lists supplied by the presentation layer, and their normalized form.

use crate::schema::FieldPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Type of a field as declared by a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Object,
    Array,
    Unknown,
}

impl FieldType {
    /// Parse a loosely written type name.
    ///
    /// Accepts the common aliases UI layers emit (`int`, `float`, `bool`,
    /// `datetime`, `list`, `map`, ...). Anything unrecognised is `Unknown`.
    pub fn parse_loose(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => FieldType::String,
            "number" | "int" | "integer" | "float" | "double" | "decimal" => FieldType::Number,
            "boolean" | "bool" => FieldType::Boolean,
            "date" | "datetime" | "timestamp" => FieldType::Date,
            "object" | "map" | "record" => FieldType::Object,
            "array" | "list" => FieldType::Array,
            _ => FieldType::Unknown,
        }
    }

    /// Whether values of this type are JSON scalars
    pub fn is_scalar(self) -> bool {
        !matches!(self, FieldType::Object | FieldType::Array)
    }

    /// Lowercase name used in diagnostics
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Unknown => "unknown",
        }
    }

    /// Observed type of a concrete JSON value
    ///
    /// JSON has no date type, so strings always report `String` and null
    /// reports `Unknown`.
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::String(_) => FieldType::String,
            Value::Number(_) => FieldType::Number,
            Value::Bool(_) => FieldType::Boolean,
            Value::Object(_) => FieldType::Object,
            Value::Array(_) => FieldType::Array,
            Value::Null => FieldType::Unknown,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field as supplied by the presentation layer, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawField {
    /// Field name, unique within its schema
    pub name: String,

    /// Loosely typed name (see [`FieldType::parse_loose`])
    #[serde(rename = "type", default)]
    pub field_type: String,

    /// Whether a value must be produced for this field
    #[serde(default)]
    pub required: bool,

    /// Access path into a record; defaults to the field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Value emitted when nothing else supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl RawField {
    /// Create a raw field with a name and a type name
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            required: false,
            path: None,
            default: None,
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set an explicit access path
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set a default value
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Ordered list of raw fields, serialized as a bare JSON/YAML list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSchema {
    pub fields: Vec<RawField>,
}

impl RawSchema {
    pub fn new(fields: Vec<RawField>) -> Self {
        Self { fields }
    }
}

impl From<Vec<RawField>> for RawSchema {
    fn from(fields: Vec<RawField>) -> Self {
        Self { fields }
    }
}

impl FromIterator<RawField> for RawSchema {
    fn from_iter<I: IntoIterator<Item = RawField>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A normalized, addressable field of a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,

    /// Declared type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Whether a value must be produced for this field
    pub required: bool,

    /// Parsed access path into a record
    pub path: FieldPath,

    /// Value emitted when nothing else supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDescriptor {
    /// Whether the field needs a mapping or a default to be valid
    pub fn needs_value(&self) -> bool {
        self.required && self.default.is_none()
    }
}

/// Ordered sequence of field descriptors with unique names and paths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
}

impl FieldSchema {
    /// Wrap descriptors that have already been checked for uniqueness.
    pub(crate) fn from_checked(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// Look up a field by exact name
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of a field in declared order
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Iterate fields in declared order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of required fields in declared order
    pub fn required_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }
}

impl<'a> IntoIterator for &'a FieldSchema {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
