//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod config;
mod export;
mod resolve;
mod transform;
pub mod utils;

pub use completions::handle_completions;
pub use config::handle_config;
pub use export::handle_export;
pub use resolve::handle_resolve;
pub use transform::handle_transform;
