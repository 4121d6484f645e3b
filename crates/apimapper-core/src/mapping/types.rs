//! Mapping data model: hints, per-field resolutions and the resolved mapping

use crate::transformer::TransformRule;
use crate::types::FieldSchema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An explicit instruction from the caller for one target field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldHint {
    /// Target field the hint applies to
    pub target: String,

    /// Source field to read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Rule to apply; chosen from the type comparison when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<TransformRule>,

    /// Leave the target intentionally unmapped
    #[serde(default)]
    pub skip: bool,
}

impl FieldHint {
    /// Map `target` from `source`
    pub fn new(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: Some(source.into()),
            rule: None,
            skip: false,
        }
    }

    /// Produce `target` with a rule that needs no source field
    pub fn computed(target: impl Into<String>, rule: TransformRule) -> Self {
        Self {
            target: target.into(),
            source: None,
            rule: Some(rule),
            skip: false,
        }
    }

    /// Leave `target` unmapped
    pub fn skip(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: None,
            rule: None,
            skip: true,
        }
    }

    pub fn with_rule(mut self, rule: TransformRule) -> Self {
        self.rule = Some(rule);
        self
    }
}

/// How an automatic or explicit match was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Caller-supplied hint
    Hint,
    /// Names equal ignoring case and separators
    ExactName,
    /// Only unclaimed source field of the same type
    TypeCandidate,
}

/// Resolution state of one target field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStatus {
    Mapped(MatchKind),
    /// No source; the target's default is emitted
    Defaulted,
    /// Explicitly left unmapped by a hint
    Skipped,
    /// Several sources tie; left unmapped
    Ambiguous { candidates: Vec<String> },
    /// No source and no default
    Unmapped,
}

impl MappingStatus {
    pub fn is_mapped(&self) -> bool {
        matches!(self, MappingStatus::Mapped(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            MappingStatus::Mapped(MatchKind::Hint) => "hint",
            MappingStatus::Mapped(MatchKind::ExactName) => "name match",
            MappingStatus::Mapped(MatchKind::TypeCandidate) => "type match",
            MappingStatus::Defaulted => "default",
            MappingStatus::Skipped => "skipped",
            MappingStatus::Ambiguous { .. } => "ambiguous",
            MappingStatus::Unmapped => "unmapped",
        }
    }
}

/// Resolution of a single target field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Target field name
    pub target: String,

    /// Source field name, when the target reads one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Rule applied to produce the target value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<TransformRule>,

    pub status: MappingStatus,
}

impl FieldMapping {
    pub(crate) fn unresolved(target: &str, status: MappingStatus) -> Self {
        Self {
            target: target.to_string(),
            source: None,
            rule: None,
            status,
        }
    }
}

/// A validated association between target and source fields
///
/// Only [`resolve`](crate::mapping::resolve) constructs a `Mapping`, so every
/// instance satisfies the required-field coverage check. `fields` holds one
/// entry per target field, in target-schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mapping {
    pub(crate) source: FieldSchema,
    pub(crate) target: FieldSchema,
    pub(crate) fields: Vec<FieldMapping>,
}

impl Mapping {
    pub fn source_schema(&self) -> &FieldSchema {
        &self.source
    }

    pub fn target_schema(&self) -> &FieldSchema {
        &self.target
    }

    /// Per-target resolutions in target-schema order
    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    /// Resolution for a target field
    pub fn field(&self, target: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.target == target)
    }

    /// Targets that read a source or compute a value
    pub fn mapped_targets(&self) -> impl Iterator<Item = &FieldMapping> {
        self.fields.iter().filter(|f| f.status.is_mapped())
    }

    /// Targets whose automatic match was ambiguous
    pub fn ambiguous_targets(&self) -> impl Iterator<Item = &FieldMapping> {
        self.fields
            .iter()
            .filter(|f| matches!(f.status, MappingStatus::Ambiguous { .. }))
    }

    /// Whether every target is mapped or defaulted
    pub fn is_complete(&self) -> bool {
        self.fields
            .iter()
            .all(|f| matches!(f.status, MappingStatus::Mapped(_) | MappingStatus::Defaulted))
    }

    /// Snapshot suitable for saving alongside a creation timestamp
    pub fn export(&self) -> MappingExport {
        MappingExport {
            version: crate::VERSION.to_string(),
            created_at: Utc::now(),
            complete: self.is_complete(),
            source: self.source.clone(),
            target: self.target.clone(),
            fields: self.fields.clone(),
        }
    }
}

/// Serializable snapshot of a mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingExport {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub complete: bool,
    pub source: FieldSchema,
    pub target: FieldSchema,
    pub fields: Vec<FieldMapping>,
}
