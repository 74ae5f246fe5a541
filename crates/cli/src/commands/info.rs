//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::SinkSetConfig;

use crate::cli::InfoArgs;

use super::{describe_target, load_config};

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_buffer_size: Option<usize>,
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    kind: &'static str,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    buffer_size: Option<usize>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = load_config(&args.config)?;

    if args.json {
        let info = build_config_info(&config);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{json}");
    } else {
        print_config_info(&config);
    }

    Ok(())
}

fn build_config_info(config: &SinkSetConfig) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", config.version),
        default_buffer_size: config.defaults.buffer_size,
        sinks: config
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                kind: s.target.kind(),
                target: describe_target(&s.target),
                buffer_size: s.effective_buffer_size(&config.defaults),
            })
            .collect(),
    }
}

fn print_config_info(config: &SinkSetConfig) {
    println!("Sink set ({:?})", config.version);
    if let Some(size) = config.defaults.buffer_size {
        println!("   Default buffer: {size} bytes");
    }

    println!("\nSinks ({})", config.sinks.len());
    for (i, sink) in config.sinks.iter().enumerate() {
        let is_last = i == config.sinks.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} [{}]", prefix, sink.name, sink.target.kind());
        println!("   {}  ├─ Target: {}", child_prefix, describe_target(&sink.target));
        match sink.effective_buffer_size(&config.defaults) {
            Some(size) => println!("   {}  └─ Buffer: {} bytes", child_prefix, size),
            None => println!("   {}  └─ Buffer: unbuffered", child_prefix),
        }
    }

    println!();
}
