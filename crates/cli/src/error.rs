//! Error types for CLI operations.

use thiserror::Error;

use handle_write::WriteError;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Descriptor given on the command line is not open
    #[error("Descriptor {fd} is not usable: {source}")]
    BadDescriptor {
        fd: i32,
        #[source]
        source: std::io::Error,
    },

    /// Write to a sink failed
    #[error(transparent)]
    Write(#[from] WriteError),

    /// One or more sinks of a fan-out failed
    #[error("{count} sink(s) failed: {sinks}")]
    SinkFailures { count: usize, sinks: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn bad_descriptor(fd: i32, source: std::io::Error) -> Self {
        Self::BadDescriptor { fd, source }
    }

    /// Summarize failed sinks by name, keeping first-seen order
    pub fn sink_failures<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut seen: Vec<&str> = Vec::new();
        for name in names {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        Self::SinkFailures {
            count: seen.len(),
            sinks: seen.join(", "),
        }
    }
}
