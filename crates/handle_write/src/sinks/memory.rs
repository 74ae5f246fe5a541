//! MemorySink - collects written bytes in memory

use contracts::{SinkState, WriteError, WriteSink};
use tracing::debug;

use crate::raw;

/// Sink that appends every write to an in-memory buffer
///
/// With a capacity limit it behaves like a destination that stops accepting
/// bytes once full: the write that overflows fails with `Closed` after
/// keeping the bytes that fit.
#[derive(Debug)]
pub struct MemorySink {
    name: String,
    buffer: Vec<u8>,
    capacity: Option<usize>,
    state: SinkState,
}

impl MemorySink {
    /// Create an unbounded MemorySink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buffer: Vec::new(),
            capacity: None,
            state: SinkState::Unopened,
        }
    }

    /// Create a MemorySink that accepts at most `capacity` bytes in total
    pub fn with_limit(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new(name)
        }
    }

    /// Bytes written so far
    pub fn contents(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

impl WriteSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> SinkState {
        self.state
    }

    fn open(&mut self) -> Result<(), WriteError> {
        self.state.ensure_unopened(&self.name)?;
        self.state = SinkState::Open;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.state.ensure_open(&self.name, "write")?;

        let buffer = &mut self.buffer;
        let capacity = self.capacity;
        let result = raw::write_fully(&self.name, data, |chunk| {
            let room = capacity.map_or(chunk.len(), |c| c.saturating_sub(buffer.len()));
            let n = chunk.len().min(room);
            buffer.extend_from_slice(&chunk[..n]);
            Ok(n)
        });

        if result.is_err() {
            self.state = SinkState::Failed;
        }
        result
    }

    fn close(&mut self) -> Result<(), WriteError> {
        self.state.ensure_closable(&self.name)?;
        self.state = SinkState::Closed;
        debug!(sink = %self.name, bytes = self.buffer.len(), "MemorySink closed");
        Ok(())
    }
}
