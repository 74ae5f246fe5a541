//! # hwrite
//!
//! Command-line entry point.
//!
//! Provides:
//! - Full writes to an inherited descriptor
//! - Fan-out of input to a configured sink set
//! - Sink set validation and inspection

mod cli;
mod commands;
mod error;
mod input;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use cli::{Cli, Commands};
use commands::{run_fanout, run_info, run_validate, run_write};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    debug!(version = env!("CARGO_PKG_VERSION"), "hwrite starting");

    let result = match &cli.command {
        Commands::Write(args) => run_write(args),
        Commands::Fanout(args) => run_fanout(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
///
/// Logs always go to stderr; stdout carries payload bytes only.
fn init_logging(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        default_log_level: default_log_level.to_string(),
    })
}
