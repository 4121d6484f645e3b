//! End-to-end mapping pipeline
//!
//! Composes the engine the way a presentation layer drives it: normalize
//! both schemas, resolve a mapping, transform the records. Each step runs
//! under a timing span so the caller gets one record per step alongside the
//! results.
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use crate::error::Result;
use crate::mapping::{resolve, FieldHint, Mapping};
use crate::schema::SchemaRegistry;
use crate::timing::{self, Metadata, SpanStatus, TimingRecord, TimingRecorder};
use crate::transformer::{apply_batch, BatchResult};
use crate::types::RawSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SPAN_NORMALIZE: &str = "normalize-schemas";
pub const SPAN_RESOLVE: &str = "resolve-mapping";
pub const SPAN_TRANSFORM: &str = "transform-batch";

/// Everything the presentation layer submits for one mapping job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingRequest {
    pub source: RawSchema,
    pub target: RawSchema,
    #[serde(default)]
    pub hints: Vec<FieldHint>,
    #[serde(default)]
    pub records: Vec<Value>,
}

/// Results of a full pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub mapping: Mapping,
    pub batch: BatchResult,
    /// One record per pipeline step, in execution order
    pub timings: Vec<TimingRecord>,
}

impl PipelineOutput {
    pub fn is_success(&self) -> bool {
        self.batch.is_success()
    }
}

/// Schema registry and timing recorder shared across pipeline runs
#[derive(Debug)]
pub struct MappingPipeline {
    registry: SchemaRegistry,
    recorder: TimingRecorder,
}

impl Default for MappingPipeline {
    /// Uses a default registry and the process-wide recorder
    fn default() -> Self {
        Self::new(SchemaRegistry::new(), timing::global().clone())
    }
}

impl MappingPipeline {
    pub fn new(registry: SchemaRegistry, recorder: TimingRecorder) -> Self {
        Self { registry, recorder }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn recorder(&self) -> &TimingRecorder {
        &self.recorder
    }

    /// Normalize both schemas and resolve a mapping
    pub fn build_mapping(&self, request: &MappingRequest) -> Result<Mapping> {
        self.build(request, &mut Vec::new())
    }

    /// Build the mapping and transform every record in the request
    ///
    /// Schema and mapping failures stop the run before any record is
    /// touched. Field-level failures are reported in the batch.
    pub fn run(&self, request: &MappingRequest) -> Result<PipelineOutput> {
        let mut timings = Vec::with_capacity(3);
        let mapping = self.build(request, &mut timings)?;

        let mut span = self.recorder.begin(
            SPAN_TRANSFORM,
            metadata([("records", request.records.len().to_string())]),
        );
        let batch = apply_batch(&mapping, &request.records);
        let status = match &batch {
            Ok(batch) => {
                span.annotate("succeeded", batch.summary.succeeded.to_string());
                span.annotate("failed", batch.summary.failed.to_string());
                if batch.is_success() {
                    SpanStatus::Success
                } else {
                    SpanStatus::Failure
                }
            }
            Err(err) => {
                span.annotate("error", err.to_string());
                SpanStatus::Failure
            }
        };
        timings.push(span.end(status)?);

        Ok(PipelineOutput {
            mapping,
            batch: batch?,
            timings,
        })
    }

    fn build(&self, request: &MappingRequest, timings: &mut Vec<TimingRecord>) -> Result<Mapping> {
        let normalized = self.recorder.time(
            SPAN_NORMALIZE,
            metadata([
                ("source_fields", request.source.fields.len().to_string()),
                ("target_fields", request.target.fields.len().to_string()),
            ]),
            || -> Result<_> {
                Ok((
                    self.registry.normalize(&request.source)?,
                    self.registry.normalize(&request.target)?,
                ))
            },
        );
        timings.push(normalized.record);
        let (source, target) = normalized.result?;

        let resolved = self.recorder.time(
            SPAN_RESOLVE,
            metadata([("hints", request.hints.len().to_string())]),
            || resolve(&source, &target, &request.hints),
        );
        timings.push(resolved.record);
        Ok(resolved.result?)
    }
}

fn metadata<const N: usize>(entries: [(&str, String); N]) -> Metadata {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
