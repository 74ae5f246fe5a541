//! SinkSetConfig - Config Loader output
//!
//! Describes a set of named output sinks and how each one reaches its destination.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Default output buffer size for buffered sinks
pub const DEFAULT_BUFFER_SIZE: usize = 65536;

/// Default permission bits for files created by a file sink
pub const DEFAULT_FILE_MODE: u32 = 0o640;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete sink set configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkSetConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Values applied to sinks that do not override them
    #[serde(default)]
    #[validate(nested)]
    pub defaults: SinkDefaults,

    /// Output routes
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}

/// Set-wide defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SinkDefaults {
    /// Buffer size for every sink without its own `buffer_size`
    #[serde(default)]
    #[validate(range(min = 1))]
    pub buffer_size: Option<usize>,
}

/// One output sink
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink name, used in error messages and metrics
    #[validate(length(min = 1, message = "sink name cannot be empty"))]
    pub name: String,

    /// Where the bytes go
    pub target: SinkTarget,

    /// Wrap the sink in an output buffer of this many bytes
    #[serde(default)]
    #[validate(range(min = 1))]
    pub buffer_size: Option<usize>,

    /// Leave the sink out with a warning when it cannot be created
    #[serde(default)]
    pub optional: bool,
}

impl SinkConfig {
    /// Buffer size after applying set defaults
    pub fn effective_buffer_size(&self, defaults: &SinkDefaults) -> Option<usize> {
        self.buffer_size.or(defaults.buffer_size)
    }
}

/// Sink destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkTarget {
    /// Process standard output
    Stdout,
    /// Process standard error
    Stderr,
    /// Descriptor inherited from the parent process; never closed by the sink
    Fd { fd: i32 },
    /// File opened (and owned) by the sink
    File {
        path: PathBuf,
        #[serde(default = "default_append")]
        append: bool,
        #[serde(default = "default_file_mode")]
        mode: u32,
    },
    /// In-memory buffer, optionally bounded
    Memory {
        #[serde(default)]
        capacity: Option<usize>,
    },
}

impl SinkTarget {
    /// Short type label for summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::Fd { .. } => "fd",
            Self::File { .. } => "file",
            Self::Memory { .. } => "memory",
        }
    }
}

fn default_append() -> bool {
    true
}

fn default_file_mode() -> u32 {
    DEFAULT_FILE_MODE
}
