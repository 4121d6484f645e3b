//! Export command handler

use super::utils;
use crate::cli::ExportArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use tracing::{debug, instrument};

/// Handle the export command
#[instrument(skip(config, output), fields(job = %args.job.display(), save_to = %args.save_to.display()))]
pub async fn handle_export(args: ExportArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    if args.save_to == args.job {
        return Err(Error::invalid_args("--save-to must not overwrite the job file"));
    }

    let pipeline = utils::pipeline(config);
    let job = utils::load_job(&args.job, pipeline.recorder()).await?;

    let export = pipeline.build_mapping(&job)?.export();
    if !export.complete {
        output.warning("Some optional target fields are left unmapped; see the exported field statuses")?;
    }

    debug!("Writing mapping to {}", args.save_to.display());
    utils::write_document(&args.save_to, &export)?;
    output.success(&format!("✓ Mapping exported to {}", args.save_to.display()))?;

    Ok(())
}
