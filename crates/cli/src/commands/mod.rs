//! Command implementations.

mod fanout;
mod info;
mod validate;
mod write;

pub use fanout::run_fanout;
pub use info::run_info;
pub use validate::run_validate;
pub use write::run_write;

use std::path::Path;

use contracts::{SinkSetConfig, SinkTarget};

use crate::error::CliError;

/// Load a sink set, reporting a missing file separately from parse errors
fn load_config(path: &Path) -> anyhow::Result<SinkSetConfig> {
    use anyhow::Context;

    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// One-line description of where a sink writes
fn describe_target(target: &SinkTarget) -> String {
    match target {
        SinkTarget::Stdout => "stdout (fd 1)".to_string(),
        SinkTarget::Stderr => "stderr (fd 2)".to_string(),
        SinkTarget::Fd { fd } => format!("fd {fd}"),
        SinkTarget::File { path, append, mode } => format!(
            "{} ({}, mode {:o})",
            path.display(),
            if *append { "append" } else { "truncate" },
            mode
        ),
        SinkTarget::Memory { capacity: Some(limit) } => format!("memory (limit {limit} bytes)"),
        SinkTarget::Memory { capacity: None } => "memory (unbounded)".to_string(),
    }
}
