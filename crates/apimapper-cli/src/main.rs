//! Apimapper CLI - command-line driver for the field mapping engine
//!
//! Loads mapping jobs from JSON or YAML files, resolves which source field
//! feeds each target field, applies the mapping to records and reports the
//! timing of every step.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use apimapper_core::timing;
use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::LoggingConfig;
use output::OutputWriter;
use std::process;
use std::time::Instant;
use tracing::Instrument;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let span = logging::create_operation_span("cli_execution", Some(cli.command.name()));
    let started = Instant::now();
    let result = run(cli).instrument(span.clone()).await;
    logging::record_duration(&span, started);

    match result {
        Ok(()) => {
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<()> {
    tracing::debug!("Loading configuration");
    let config = Config::load_with_file(cli.config.as_deref())?;

    let use_color = cli.use_color() && config.output.color;
    control::set_override(use_color);

    timing::install_global(config.timing.clone()).map_err(apimapper_core::Error::from)?;

    let format = cli.output.unwrap_or(config.output.format);
    let mut output = OutputWriter::new(format, use_color, cli.quiet, config.output.progress);

    tracing::info!(
        command = cli.command.name(),
        verbosity = cli.verbosity_level(),
        format = ?format,
        "Executing command"
    );

    match cli.command {
        Commands::Resolve(args) => handlers::handle_resolve(args, &config, &mut output).await,
        Commands::Transform(args) => handlers::handle_transform(args, &config, &mut output).await,
        Commands::Export(args) => handlers::handle_export(args, &config, &mut output).await,
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_env();

    // Quiet mode only logs errors
    if cli.quiet {
        logging_config.level = "error".to_string();
    }

    logging::init_logging(logging_config)
}
