//! `validate` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{SinkSetConfig, SinkTarget};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sink_count: usize,
    buffered_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            let buffered_count = config
                .sinks
                .iter()
                .filter(|s| s.effective_buffer_size(&config.defaults).is_some())
                .count();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    sink_count: config.sinks.len(),
                    buffered_count,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &SinkSetConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    // Several sinks on one descriptor interleave their output
    let mut by_fd: HashMap<i32, Vec<&str>> = HashMap::new();
    for sink in &config.sinks {
        let fd = match sink.target {
            SinkTarget::Stdout => 1,
            SinkTarget::Stderr => 2,
            SinkTarget::Fd { fd } => fd,
            _ => continue,
        };
        by_fd.entry(fd).or_default().push(&sink.name);
    }
    let mut shared: Vec<_> = by_fd.into_iter().filter(|(_, names)| names.len() > 1).collect();
    shared.sort_by_key(|(fd, _)| *fd);
    for (fd, names) in shared {
        warnings.push(format!(
            "Sinks {} all write to fd {fd}",
            names.join(", ")
        ));
    }

    for sink in &config.sinks {
        match &sink.target {
            SinkTarget::File { path, append: false, .. } => warnings.push(format!(
                "Sink '{}' truncates {} when opened",
                sink.name,
                path.display()
            )),
            SinkTarget::Memory { .. } => warnings.push(format!(
                "Sink '{}' keeps output in memory only - it is discarded at exit",
                sink.name
            )),
            _ => {}
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Sinks: {}", summary.sink_count);
            println!("  Buffered: {}", summary.buffered_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
