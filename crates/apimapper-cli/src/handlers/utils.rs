//! Shared utilities for command handlers
//!
//! Job and records files are read asynchronously, each under its own
//! timing span, and parsed as YAML or JSON according to their extension.

use crate::config::{is_yaml, Config};
use crate::error::{Error, ErrorContext, Result};
use apimapper_core::pipeline::{MappingPipeline, MappingRequest};
use apimapper_core::schema::SchemaRegistry;
use apimapper_core::timing::{self, Metadata, TimingRecorder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

pub const SPAN_LOAD_JOB: &str = "load-job";
pub const SPAN_LOAD_RECORDS: &str = "load-records";

/// A records file holds either a bare list or an object with `records`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    List(Vec<Value>),
    Wrapped { records: Vec<Value> },
}

impl From<RecordsFile> for Vec<Value> {
    fn from(file: RecordsFile) -> Self {
        match file {
            RecordsFile::List(records) | RecordsFile::Wrapped { records } => records,
        }
    }
}

/// Pipeline wired to the configured registry and the process-wide recorder
pub fn pipeline(config: &Config) -> MappingPipeline {
    MappingPipeline::new(
        SchemaRegistry::with_config(config.registry.clone()),
        timing::global().clone(),
    )
}

/// Load a mapping job: schemas, hints and optional inline records
pub async fn load_job(path: &Path, recorder: &TimingRecorder) -> Result<MappingRequest> {
    let job: MappingRequest = read_document(path, recorder, SPAN_LOAD_JOB).await?;
    debug!(
        source_fields = job.source.fields.len(),
        target_fields = job.target.fields.len(),
        hints = job.hints.len(),
        records = job.records.len(),
        "Loaded job"
    );
    Ok(job)
}

/// Load records from a standalone file
pub async fn load_records(path: &Path, recorder: &TimingRecorder) -> Result<Vec<Value>> {
    let file: RecordsFile = read_document(path, recorder, SPAN_LOAD_RECORDS).await?;
    Ok(file.into())
}

async fn read_document<T: DeserializeOwned>(path: &Path, recorder: &TimingRecorder, span: &str) -> Result<T> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut metadata = Metadata::new();
    metadata.insert("path".to_string(), path.display().to_string());

    let timed = recorder
        .time_async(span, metadata, async {
            let content = tokio::fs::read_to_string(path).await?;
            parse_document(path, &content)
        })
        .await;
    debug!(path = %path.display(), duration_ms = timed.record.duration_ms, "Read document");
    timed.result
}

/// Parse a document as YAML or JSON according to the path's extension
pub fn parse_document<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    if is_yaml(path) {
        serde_yaml::from_str(content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
            reason: e.to_string(),
        })
    } else {
        serde_json::from_str(content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Write a document as YAML or JSON according to the path's extension
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = if is_yaml(path) {
        serde_yaml::to_string(value)?
    } else {
        let mut text = serde_json::to_string_pretty(value)?;
        text.push('\n');
        text
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content).with_context(|| format!("Writing {}", path.display()))
}
