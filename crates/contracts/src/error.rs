//! Layered error definitions
//!
//! Categorized by source: sink write path / configuration

use std::fmt;
use std::io;

use thiserror::Error;

/// Sink operation that produced an OS-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOperation {
    Open,
    Write,
    Close,
}

impl SinkOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Write => "write",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for SinkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a [`WriteError`], for matching and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteErrorKind {
    Interrupted,
    Closed,
    IoFailure,
    ContractViolation,
}

impl WriteErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Interrupted => "interrupted",
            Self::Closed => "closed",
            Self::IoFailure => "io_failure",
            Self::ContractViolation => "contract_violation",
        }
    }
}

/// Errors surfaced by any [`WriteSink`](crate::WriteSink)
#[derive(Debug, Error)]
pub enum WriteError {
    /// Transient interruption, retried inside the write loop
    #[error("sink '{sink_name}' write interrupted")]
    Interrupted { sink_name: String },

    /// Destination stopped accepting bytes with data still pending
    #[error("sink '{sink_name}' stopped accepting writes after {written} of {requested} bytes")]
    Closed {
        sink_name: String,
        written: usize,
        requested: usize,
    },

    /// Hard OS error
    #[error("sink '{sink_name}' {operation} failed: {source}")]
    IoFailure {
        sink_name: String,
        operation: SinkOperation,
        code: Option<i32>,
        #[source]
        source: io::Error,
    },

    /// Caller broke the open/write/close protocol
    #[error("sink '{sink_name}' contract violation: {message}")]
    ContractViolation { sink_name: String, message: String },

    /// Primary failure plus a failure while releasing the sink afterwards
    #[error("{primary} (cleanup also failed: {secondary})")]
    Compound {
        primary: Box<WriteError>,
        secondary: Box<WriteError>,
    },
}

impl WriteError {
    /// Create an interruption marker
    pub fn interrupted(sink_name: impl Into<String>) -> Self {
        Self::Interrupted {
            sink_name: sink_name.into(),
        }
    }

    /// Create a zero-progress error
    pub fn closed(sink_name: impl Into<String>, written: usize, requested: usize) -> Self {
        Self::Closed {
            sink_name: sink_name.into(),
            written,
            requested,
        }
    }

    /// Create an OS failure, keeping the raw error code
    pub fn io_failure(
        sink_name: impl Into<String>,
        operation: SinkOperation,
        source: io::Error,
    ) -> Self {
        Self::IoFailure {
            sink_name: sink_name.into(),
            operation,
            code: source.raw_os_error(),
            source,
        }
    }

    /// Create a protocol violation
    pub fn contract_violation(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ContractViolation {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Classify an OS error raised by `operation`.
    ///
    /// `EINTR` maps to [`WriteError::Interrupted`]; everything else is a hard failure.
    pub fn from_os(sink_name: &str, operation: SinkOperation, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::Interrupted {
            Self::interrupted(sink_name)
        } else {
            Self::io_failure(sink_name, operation, source)
        }
    }

    /// Attach a cleanup failure to a primary failure
    pub fn with_secondary(self, secondary: WriteError) -> Self {
        Self::Compound {
            primary: Box::new(self),
            secondary: Box::new(secondary),
        }
    }

    /// The error that caused the operation to fail, ignoring cleanup failures
    pub fn primary(&self) -> &WriteError {
        match self {
            Self::Compound { primary, .. } => primary.primary(),
            other => other,
        }
    }

    /// Cleanup failure attached to this error, if any
    pub fn secondary(&self) -> Option<&WriteError> {
        match self {
            Self::Compound { secondary, .. } => Some(secondary),
            _ => None,
        }
    }

    pub fn kind(&self) -> WriteErrorKind {
        match self.primary() {
            Self::Interrupted { .. } => WriteErrorKind::Interrupted,
            Self::Closed { .. } => WriteErrorKind::Closed,
            Self::IoFailure { .. } => WriteErrorKind::IoFailure,
            Self::ContractViolation { .. } => WriteErrorKind::ContractViolation,
            Self::Compound { .. } => unreachable!("primary() never returns a compound error"),
        }
    }

    /// Diagnostic name of the sink that raised the primary error
    pub fn sink_name(&self) -> &str {
        match self.primary() {
            Self::Interrupted { sink_name }
            | Self::Closed { sink_name, .. }
            | Self::IoFailure { sink_name, .. }
            | Self::ContractViolation { sink_name, .. } => sink_name,
            Self::Compound { .. } => unreachable!("primary() never returns a compound error"),
        }
    }

    /// OS error code of the primary error, if it came from the OS
    pub fn raw_os_error(&self) -> Option<i32> {
        match self.primary() {
            Self::IoFailure { code, .. } => *code,
            _ => None,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration parse error
    #[error("config parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    Validation { field: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl ConfigError {
    /// Create configuration parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
