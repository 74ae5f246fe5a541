//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// hwrite - write bytes to descriptors without losing any
#[derive(Parser, Debug)]
#[command(
    name = "hwrite",
    author,
    version,
    about = "Write text to file descriptors and sink sets",
    long_about = "Writes every byte of the input to an inherited file descriptor, \n\
                  continuing after partial writes and retrying interrupted calls, \n\
                  or fans the input out to a configured set of sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "HWRITE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "HWRITE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write text (or stdin) to a file descriptor
    Write(WriteArgs),

    /// Write text (or stdin) to every sink of a configuration
    Fanout(FanoutArgs),

    /// Validate a sink set configuration
    Validate(ValidateArgs),

    /// Display sink set information
    Info(InfoArgs),
}

/// Arguments for the `write` command
#[derive(Parser, Debug, Clone)]
pub struct WriteArgs {
    /// Descriptor to write to
    #[arg(long, default_value = "1", env = "HWRITE_FD")]
    pub fd: i32,

    /// Sink name used in diagnostics
    #[arg(long)]
    pub name: Option<String>,

    /// Append a newline after the payload
    #[arg(short, long)]
    pub newline: bool,

    /// Text to write; stdin is copied when absent
    pub text: Option<String>,
}

/// Arguments for the `fanout` command
#[derive(Parser, Debug, Clone)]
pub struct FanoutArgs {
    /// Path to sink set configuration (TOML or JSON)
    #[arg(short, long, default_value = "sinks.toml", env = "HWRITE_CONFIG")]
    pub config: PathBuf,

    /// Append a newline after the payload
    #[arg(short, long)]
    pub newline: bool,

    /// Text to write; stdin is dispatched chunk by chunk when absent
    pub text: Option<String>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "sinks.toml", env = "HWRITE_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "sinks.toml", env = "HWRITE_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
