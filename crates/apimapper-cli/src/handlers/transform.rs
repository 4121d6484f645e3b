//! Transform command handler

use super::utils;
use crate::cli::TransformArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{OutputWriter, TransformReport};
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Handle the transform command
///
/// Records come from `--records` when given, otherwise from the job file.
/// The command fails with `RecordsFailed` when any record has errors, after
/// the report has been written.
#[instrument(skip(config, output), fields(job = %args.job.display()))]
pub async fn handle_transform(args: TransformArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let pipeline = utils::pipeline(config);
    let mut job = utils::load_job(&args.job, pipeline.recorder()).await?;

    if let Some(path) = &args.records {
        if !job.records.is_empty() {
            warn!(inline = job.records.len(), "Ignoring inline records in favour of --records");
        }
        job.records = utils::load_records(path, pipeline.recorder()).await?;
    }
    if job.records.is_empty() {
        output.warning("No records to transform")?;
    }

    let spinner = output.spinner(&format!("Transforming {} record(s)...", job.records.len()));
    let outcome = pipeline.run(&job);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let run = outcome?;

    let summary = run.batch.summary;
    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        warnings = summary.warnings,
        "Transformation finished"
    );

    let show_timings = config.output.timings && !args.no_timings;
    output.transform_report(&TransformReport {
        batch: &run.batch,
        timings: show_timings.then_some(run.timings.as_slice()),
    })?;

    if let Some(path) = &args.save_to {
        let records: Vec<Value> = run
            .batch
            .results
            .iter()
            .map(|result| Value::Object(result.record.clone()))
            .collect();
        utils::write_document(path, &records)?;
        output.success(&format!("✓ {} record(s) saved to {}", records.len(), path.display()))?;
    }

    if run.is_success() {
        output.success("✓ Data mapping successful")?;
        Ok(())
    } else {
        Err(Error::RecordsFailed {
            failed: summary.failed,
            total: summary.total,
        })
    }
}
