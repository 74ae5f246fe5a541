//! WriteSink trait - byte output interface
//!
//! Defines the abstract interface every output destination implements, so that
//! byte producers can treat an OS handle, an in-memory buffer or a buffered
//! decorator interchangeably.

use crate::WriteError;

/// Lifecycle state of a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkState {
    /// Constructed, `open` not yet called
    #[default]
    Unopened,
    /// Accepting writes
    Open,
    /// A write failed; the sink only accepts `close` from here
    Failed,
    /// Released; terminal
    Closed,
}

impl SinkState {
    /// Check the state allows `write`/`flush`, naming the sink in the violation.
    ///
    /// # Errors
    /// Returns [`WriteError::ContractViolation`] in any state other than `Open`.
    pub fn ensure_open(self, sink_name: &str, operation: &str) -> Result<(), WriteError> {
        let reason = match self {
            Self::Open => return Ok(()),
            Self::Unopened => "before open",
            Self::Failed => "after a failed write",
            Self::Closed => "after close",
        };
        Err(WriteError::contract_violation(
            sink_name,
            format!("{operation} {reason}"),
        ))
    }

    /// Check the state allows `open`.
    ///
    /// # Errors
    /// Returns [`WriteError::ContractViolation`] unless the sink is `Unopened`.
    pub fn ensure_unopened(self, sink_name: &str) -> Result<(), WriteError> {
        match self {
            Self::Unopened => Ok(()),
            Self::Closed => Err(WriteError::contract_violation(
                sink_name,
                "open after close",
            )),
            Self::Open | Self::Failed => {
                Err(WriteError::contract_violation(sink_name, "opened twice"))
            }
        }
    }

    /// Check the state allows `close`.
    ///
    /// # Errors
    /// Returns [`WriteError::ContractViolation`] if the sink is already closed.
    pub fn ensure_closable(self, sink_name: &str) -> Result<(), WriteError> {
        if self == Self::Closed {
            Err(WriteError::contract_violation(sink_name, "closed twice"))
        } else {
            Ok(())
        }
    }
}

/// Byte output trait
///
/// All sink implementations must implement this trait. A sink is driven by a
/// single owner: `open`, then any number of `write`/`flush`, then `close`
/// exactly once.
pub trait WriteSink {
    /// Sink name (used in error messages)
    fn name(&self) -> &str;

    /// Current lifecycle state
    fn state(&self) -> SinkState;

    /// Whether `write` is currently allowed
    fn is_writable(&self) -> bool {
        self.state() == SinkState::Open
    }

    /// Prepare the sink for writing
    ///
    /// # Errors
    /// Contract violation when not `Unopened`, or an OS failure from opening.
    fn open(&mut self) -> Result<(), WriteError>;

    /// Write the entire buffer
    ///
    /// An empty buffer is a successful no-op. Partial delivery is never
    /// reported as success.
    ///
    /// # Errors
    /// Returns write error (includes the sink name)
    fn write(&mut self, data: &[u8]) -> Result<(), WriteError>;

    /// Flush buffer (if any)
    fn flush(&mut self) -> Result<(), WriteError> {
        self.state().ensure_open(self.name(), "flush")
    }

    /// Close sink
    ///
    /// # Errors
    /// Contract violation on a second close; otherwise whatever releasing
    /// the destination reports.
    fn close(&mut self) -> Result<(), WriteError>;
}

impl<S: WriteSink + ?Sized> WriteSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn state(&self) -> SinkState {
        (**self).state()
    }

    fn is_writable(&self) -> bool {
        (**self).is_writable()
    }

    fn open(&mut self) -> Result<(), WriteError> {
        (**self).open()
    }

    fn write(&mut self, data: &[u8]) -> Result<(), WriteError> {
        (**self).write(data)
    }

    fn flush(&mut self) -> Result<(), WriteError> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), WriteError> {
        (**self).close()
    }
}
