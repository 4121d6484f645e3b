//! Resolve command handler

use super::utils;
use crate::cli::ResolveArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use apimapper_core::MappingStatus;
use tracing::{info, instrument};

/// Handle the resolve command
#[instrument(skip(config, output), fields(job = %args.job.display()))]
pub async fn handle_resolve(args: ResolveArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let pipeline = utils::pipeline(config);
    let job = utils::load_job(&args.job, pipeline.recorder()).await?;

    output.info(&format!("Resolving mapping for {}", args.job.display()))?;
    let mapping = pipeline.build_mapping(&job)?;
    info!(
        mapped = mapping.mapped_targets().count(),
        targets = mapping.fields().len(),
        "Mapping resolved"
    );

    if args.show_schemas {
        output.section("Source Schema")?;
        output.schema(mapping.source_schema())?;
        output.section("Target Schema")?;
        output.schema(mapping.target_schema())?;
        output.section("Mapping")?;
    }
    output.mapping(&mapping)?;

    for field in mapping.ambiguous_targets() {
        if let MappingStatus::Ambiguous { candidates } = &field.status {
            output.warning(&format!(
                "'{}' could come from any of: {}. Add a hint to choose one.",
                field.target,
                candidates.join(", ")
            ))?;
        }
    }

    Ok(())
}
