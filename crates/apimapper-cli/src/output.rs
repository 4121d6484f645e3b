//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable) for mappings,
//! transformation batches and timing records. Records are redacted
//! before they reach the terminal.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use apimapper_core::timing::TimingRecord;
use apimapper_core::{BatchResult, FieldSchema, Mapping, MappingStatus, TransformationResult};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::time::Duration;
use tracing::trace;

/// What a `transform` run prints: the batch and, optionally, its timings
#[derive(Debug, Serialize)]
pub struct TransformReport<'a> {
    pub batch: &'a BatchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timings: Option<&'a [TimingRecord]>,
}

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a resolved mapping as a per-target table
    fn format_mapping(&self, mapping: &Mapping) -> Result<String>;

    /// Format a normalized schema
    fn format_schema(&self, schema: &FieldSchema) -> Result<String>;

    /// Format transformed records, their issues and the batch summary
    fn format_transform_report(&self, report: &TransformReport<'_>) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => {
                // For human format, use pretty JSON as fallback
                Ok(serde_json::to_string_pretty(value)?)
            }
        }
    }

    fn format_mapping(&self, mapping: &Mapping) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_mapping_human(mapping)),
            _ => self.format(mapping),
        }
    }

    fn format_schema(&self, schema: &FieldSchema) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_schema_human(schema)),
            _ => self.format(schema),
        }
    }

    fn format_transform_report(&self, report: &TransformReport<'_>) -> Result<String> {
        match self {
            OutputFormat::Human => format_transform_report_human(report),
            _ => {
                let mut value = serde_json::to_value(report)?;
                redaction::redact_json_value(&mut value);
                trace!("Outputting report: {}", value);
                self.format(&value)
            }
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, progress: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: progress && !quiet && io::stdout().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            show_progress: false, // No progress bars with custom writers
            quiet,
            writer,
        }
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write a resolved mapping
    pub fn mapping(&mut self, mapping: &Mapping) -> Result<()> {
        let formatted = self.format.format_mapping(mapping)?;
        self.finish_document(&formatted)
    }

    /// Write a normalized schema
    pub fn schema(&mut self, schema: &FieldSchema) -> Result<()> {
        let formatted = self.format.format_schema(schema)?;
        self.finish_document(&formatted)
    }

    /// Write the outcome of a transform run
    pub fn transform_report(&mut self, report: &TransformReport<'_>) -> Result<()> {
        let formatted = self.format.format_transform_report(report)?;
        self.finish_document(&formatted)
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    fn finish_document(&mut self, formatted: &str) -> Result<()> {
        if formatted.ends_with('\n') {
            self.write(formatted)
        } else {
            self.writeln(formatted)
        }
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Format a mapping for human reading
fn format_mapping_human(mapping: &Mapping) -> String {
    let rows: Vec<[String; 4]> = mapping
        .fields()
        .iter()
        .map(|field| {
            let source = match &field.status {
                MappingStatus::Ambiguous { candidates } => format!("? {}", candidates.join(" | ")),
                _ => field.source.clone().unwrap_or_else(|| "-".to_string()),
            };
            let rule = field
                .rule
                .as_ref()
                .map(|rule| rule.to_string())
                .unwrap_or_else(|| "-".to_string());
            [
                field.target.clone(),
                source,
                field.status.label().to_string(),
                rule,
            ]
        })
        .collect();

    let mut output = String::new();
    let mapped = mapping.mapped_targets().count();
    output.push_str(&format!(
        "🗺️  Mapping: {} of {} target field(s) mapped\n\n",
        mapped,
        mapping.fields().len()
    ));
    output.push_str(&table(&["Target", "Source", "Match", "Rule"], &rows));

    if mapping.is_complete() {
        output.push_str("\n✅ Every target field is covered\n");
    } else {
        let open: Vec<&str> = mapping
            .fields()
            .iter()
            .filter(|f| matches!(f.status, MappingStatus::Ambiguous { .. } | MappingStatus::Unmapped))
            .map(|f| f.target.as_str())
            .collect();
        if !open.is_empty() {
            output.push_str(&format!("\n⚠️  Left unmapped: {}\n", open.join(", ")));
        }
    }

    output
}

/// Format a schema for human reading
fn format_schema_human(schema: &FieldSchema) -> String {
    let rows: Vec<[String; 4]> = schema
        .iter()
        .map(|field| {
            [
                field.name.clone(),
                field.field_type.to_string(),
                field.path.to_string(),
                if field.required { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    table(&["Field", "Type", "Path", "Required"], &rows)
}

/// Format a transform run for human reading
fn format_transform_report_human(report: &TransformReport<'_>) -> Result<String> {
    let mut output = String::new();

    for (index, result) in report.batch.results.iter().enumerate() {
        output.push_str(&format_record_human(index + 1, result)?);
    }

    let summary = &report.batch.summary;
    output.push_str(&format!(
        "📊 Summary: {} record(s), {} succeeded, {} failed, {} warning(s)\n",
        summary.total, summary.succeeded, summary.failed, summary.warnings
    ));

    if let Some(timings) = report.timings {
        output.push('\n');
        output.push_str(&format_timings_human(timings));
    }

    Ok(output)
}

/// Format one transformed record with its issues
fn format_record_human(number: usize, result: &TransformationResult) -> Result<String> {
    let mut output = String::new();
    let icon = if result.is_success() { "✅" } else { "❌" };
    output.push_str(&format!("{} Record {}\n", icon, number));

    let shown = redaction::redacted(&Value::Object(result.record.clone()));
    for line in serde_json::to_string_pretty(&shown)?.lines() {
        output.push_str(&format!("    {}\n", line));
    }

    for issue in &result.warnings {
        output.push_str(&format!("  ⚠️  {}: {}\n", issue.field, issue.reason));
    }
    for issue in &result.errors {
        output.push_str(&format!("  ❌ {}: {}\n", issue.field, issue.reason));
    }

    output.push('\n');
    Ok(output)
}

/// Format timing records for human reading
fn format_timings_human(timings: &[TimingRecord]) -> String {
    let rows: Vec<[String; 4]> = timings
        .iter()
        .map(|record| {
            [
                record.operation_name.clone(),
                format!("{:.3} ms", record.duration_ms),
                record.status.to_string(),
                if record.is_slow() { "slow" } else { "" }.to_string(),
            ]
        })
        .collect();

    format!("⏱️  Timings:\n{}", table(&["Operation", "Duration", "Status", ""], &rows))
}

/// Render rows under headers with aligned columns
fn table<const N: usize>(headers: &[&str; N], rows: &[[String; N]]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: Vec<&str>| {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" │ ");
        format!("  {}\n", line.trim_end())
    };

    let mut output = render(headers.to_vec());
    let separator = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("─┼─");
    output.push_str(&format!("  {}\n", separator));
    for row in rows {
        output.push_str(&render(row.iter().map(String::as_str).collect()));
    }
    output
}
