//! Mapping resolution
//!
//! Targets are resolved in target-schema order in two passes. The first
//! pass applies hints and exact normalized-name matches and records which
//! source fields they claim. The second pass offers every still-unresolved
//! target the unclaimed source fields of exactly its type; a single
//! candidate is taken, anything else is flagged ambiguous. Nothing is ever
//! guessed: ambiguous targets stay unmapped.
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use super::error::MappingError;
use super::types::{FieldHint, FieldMapping, Mapping, MappingStatus, MatchKind};
use crate::schema::{diff_types, TypeDiff};
use crate::transformer::TransformRule;
use crate::types::{FieldDescriptor, FieldSchema, FieldType};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Resolve a mapping from `source` to `target`, honoring `hints` first
///
/// Fails with [`MappingError::Invalid`] listing every required target that
/// ends up with neither a source nor a default.
pub fn resolve(
    source: &FieldSchema,
    target: &FieldSchema,
    hints: &[FieldHint],
) -> Result<Mapping, MappingError> {
    let hints = index_hints(source, target, hints)?;

    let mut slots: Vec<Option<FieldMapping>> = Vec::with_capacity(target.len());
    let mut claimed: HashSet<&str> = HashSet::new();

    // Pass A: hints, then normalized-name matches.
    for field in target {
        if let Some(hint) = hints.get(field.name.as_str()) {
            let mapping = from_hint(source, field, hint)?;
            if let Some(name) = mapping.source.as_deref() {
                if let Some(desc) = source.get(name) {
                    claimed.insert(desc.name.as_str());
                }
            }
            tracing::debug!(target_field = %field.name, source_field = ?mapping.source, "applied hint");
            slots.push(Some(mapping));
            continue;
        }

        let key = normalize_name(&field.name);
        let candidates: Vec<&FieldDescriptor> = source
            .iter()
            .filter(|s| normalize_name(&s.name) == key)
            .filter(|s| !diff_types(s, field).is_incompatible())
            .collect();

        match candidates.as_slice() {
            [] => slots.push(None),
            [only] => {
                claimed.insert(only.name.as_str());
                tracing::debug!(target_field = %field.name, source_field = %only.name, "matched by name");
                slots.push(Some(auto_mapping(only, field, MatchKind::ExactName)));
            }
            several => {
                let names = names_of(several);
                tracing::warn!(target_field = %field.name, candidates = ?names, "ambiguous name match");
                slots.push(Some(FieldMapping::unresolved(
                    &field.name,
                    MappingStatus::Ambiguous { candidates: names },
                )));
            }
        }
    }

    // Pass B: single unclaimed candidate of exactly the target's type.
    let mut offers: Vec<(usize, &FieldDescriptor, Vec<&FieldDescriptor>)> = Vec::new();
    for (index, field) in target.iter().enumerate() {
        if slots[index].is_some() || field.field_type == FieldType::Unknown {
            continue;
        }
        let candidates = source
            .iter()
            .filter(|s| !claimed.contains(s.name.as_str()))
            .filter(|s| s.field_type == field.field_type)
            .collect();
        offers.push((index, field, candidates));
    }

    let mut sole_offers: HashMap<&str, usize> = HashMap::new();
    for (_, _, candidates) in &offers {
        if let [only] = candidates.as_slice() {
            *sole_offers.entry(only.name.as_str()).or_default() += 1;
        }
    }

    for (index, field, candidates) in offers {
        let contested = matches!(
            candidates.as_slice(),
            [only] if sole_offers.get(only.name.as_str()).copied().unwrap_or(0) > 1
        );
        slots[index] = match candidates.as_slice() {
            [] => None,
            [only] if !contested => {
                tracing::debug!(target_field = %field.name, source_field = %only.name, "matched by type");
                Some(auto_mapping(only, field, MatchKind::TypeCandidate))
            }
            several => {
                let names = names_of(several);
                tracing::warn!(target_field = %field.name, candidates = ?names, "ambiguous type match");
                Some(FieldMapping::unresolved(
                    &field.name,
                    MappingStatus::Ambiguous { candidates: names },
                ))
            }
        };
    }

    let fields: Vec<FieldMapping> = target
        .iter()
        .zip(slots)
        .map(|(field, slot)| {
            slot.unwrap_or_else(|| {
                let status = if field.default.is_some() {
                    MappingStatus::Defaulted
                } else {
                    MappingStatus::Unmapped
                };
                FieldMapping::unresolved(&field.name, status)
            })
        })
        .collect();

    validate_coverage(target, &fields)?;

    Ok(Mapping {
        source: source.clone(),
        target: target.clone(),
        fields,
    })
}

/// Lowercase a field name and strip separator characters
pub fn normalize_name(name: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let separators =
        SEPARATORS.get_or_init(|| Regex::new(r"[^\p{L}\p{N}]+").expect("separator pattern is valid"));
    separators.replace_all(name, "").to_lowercase()
}

fn index_hints<'h>(
    source: &FieldSchema,
    target: &FieldSchema,
    hints: &'h [FieldHint],
) -> Result<HashMap<&'h str, &'h FieldHint>, MappingError> {
    let mut indexed = HashMap::with_capacity(hints.len());
    for hint in hints {
        if target.get(&hint.target).is_none() {
            return Err(MappingError::UnknownField {
                side: "target",
                name: hint.target.clone(),
            });
        }
        if let Some(name) = &hint.source {
            if source.get(name).is_none() {
                return Err(MappingError::UnknownField {
                    side: "source",
                    name: name.clone(),
                });
            }
        }
        if indexed.insert(hint.target.as_str(), hint).is_some() {
            return Err(MappingError::DuplicateHint {
                target: hint.target.clone(),
            });
        }
    }
    Ok(indexed)
}

fn from_hint(
    source: &FieldSchema,
    target: &FieldDescriptor,
    hint: &FieldHint,
) -> Result<FieldMapping, MappingError> {
    if hint.skip {
        if hint.source.is_some() || hint.rule.is_some() {
            return Err(MappingError::InvalidHint {
                target: target.name.clone(),
                reason: "a skipped field cannot name a source or rule".to_string(),
            });
        }
        return Ok(FieldMapping::unresolved(&target.name, MappingStatus::Skipped));
    }

    let source_field = hint.source.as_deref().and_then(|name| source.get(name));

    let rule = match (&hint.rule, source_field) {
        (Some(rule), _) => {
            rule.check(source_field, target, source)
                .map_err(|reason| MappingError::RuleTypeMismatch {
                    target: target.name.clone(),
                    rule: rule.name().to_string(),
                    reason,
                })?;
            rule.clone()
        }
        (None, Some(src)) => auto_rule(src, target).ok_or_else(|| MappingError::IncompatibleTypes {
            target: target.name.clone(),
            source_field: src.name.clone(),
            source_type: src.field_type,
            target_type: target.field_type,
        })?,
        (None, None) => {
            return Err(MappingError::InvalidHint {
                target: target.name.clone(),
                reason: "a hint needs a source, a rule or skip".to_string(),
            })
        }
    };

    let status = MappingStatus::Mapped(MatchKind::Hint);
    Ok(FieldMapping {
        target: target.name.clone(),
        // A source-free rule never reads the hinted source.
        source: source_field
            .filter(|_| rule.needs_source())
            .map(|s| s.name.clone()),
        rule: Some(rule),
        status,
    })
}

/// Rule for an automatic match: identity when compatible, else the first suggestion
fn auto_rule(source: &FieldDescriptor, target: &FieldDescriptor) -> Option<TransformRule> {
    match diff_types(source, target) {
        TypeDiff::Compatible => Some(TransformRule::Identity),
        TypeDiff::Coercible(rules) => rules.into_iter().next(),
        TypeDiff::Incompatible => None,
    }
}

fn auto_mapping(source: &FieldDescriptor, target: &FieldDescriptor, kind: MatchKind) -> FieldMapping {
    FieldMapping {
        target: target.name.clone(),
        source: Some(source.name.clone()),
        rule: Some(auto_rule(source, target).unwrap_or(TransformRule::Identity)),
        status: MappingStatus::Mapped(kind),
    }
}

fn names_of(fields: &[&FieldDescriptor]) -> Vec<String> {
    fields.iter().map(|f| f.name.clone()).collect()
}

fn validate_coverage(target: &FieldSchema, fields: &[FieldMapping]) -> Result<(), MappingError> {
    let mut missing = Vec::new();
    let mut ambiguous = Vec::new();

    for (field, mapping) in target.iter().zip(fields) {
        let covered = mapping.status.is_mapped() || field.default.is_some();
        if field.required && !covered {
            if matches!(mapping.status, MappingStatus::Ambiguous { .. }) {
                ambiguous.push(field.name.clone());
            }
            missing.push(field.name.clone());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        tracing::debug!(missing = ?missing, ambiguous = ?ambiguous, "mapping rejected");
        Err(MappingError::Invalid { missing, ambiguous })
    }
}
