//! Config validation
//!
//! Rules:
//! - field rules declared on the config types (`validator` derive)
//! - at least one sink
//! - sink names unique
//! - fd targets non-negative
//! - file targets have a path and sane permission bits
//! - memory capacity > 0 when given

use std::collections::HashSet;

use contracts::{ConfigError, SinkSetConfig, SinkTarget};
use ::validator::Validate;

/// Highest permission bits accepted for created files
const MAX_FILE_MODE: u32 = 0o7777;

/// Validate a SinkSetConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &SinkSetConfig) -> Result<(), ConfigError> {
    validate_fields(config)?;
    validate_not_empty(config)?;
    validate_sink_names(config)?;
    validate_targets(config)?;
    Ok(())
}

/// Run the derived field rules
fn validate_fields(config: &SinkSetConfig) -> Result<(), ConfigError> {
    config.validate().map_err(|e| {
        let mut fields: Vec<_> = e.errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        ConfigError::validation(fields.join(","), e.to_string())
    })
}

fn validate_not_empty(config: &SinkSetConfig) -> Result<(), ConfigError> {
    if config.sinks.is_empty() {
        return Err(ConfigError::validation(
            "sinks",
            "at least one sink must be configured",
        ));
    }
    Ok(())
}

/// Sink names must be unique
fn validate_sink_names(config: &SinkSetConfig) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for sink in &config.sinks {
        if !seen.insert(&sink.name) {
            return Err(ConfigError::validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

/// Target-specific rules
fn validate_targets(config: &SinkSetConfig) -> Result<(), ConfigError> {
    for (idx, sink) in config.sinks.iter().enumerate() {
        match &sink.target {
            SinkTarget::Fd { fd } if *fd < 0 => {
                return Err(ConfigError::validation(
                    format!("sinks[{idx}].target.fd"),
                    format!("fd must be >= 0, got {fd}"),
                ));
            }
            SinkTarget::File { path, .. } if path.as_os_str().is_empty() => {
                return Err(ConfigError::validation(
                    format!("sinks[{idx}].target.path"),
                    "file path cannot be empty",
                ));
            }
            SinkTarget::File { mode, .. } if *mode > MAX_FILE_MODE => {
                return Err(ConfigError::validation(
                    format!("sinks[{idx}].target.mode"),
                    format!("mode {mode:#o} exceeds {MAX_FILE_MODE:#o}"),
                ));
            }
            SinkTarget::Memory { capacity: Some(0) } => {
                return Err(ConfigError::validation(
                    format!("sinks[{idx}].target.capacity"),
                    "capacity must be > 0",
                ));
            }
            _ => {}
        }
    }
    Ok(())
}
