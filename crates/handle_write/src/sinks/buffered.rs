//! BufferedWrite - output buffer in front of any sink

use bytes::BytesMut;
use contracts::{SinkState, WriteError, WriteSink, DEFAULT_BUFFER_SIZE};

use crate::helper::settle;

/// Accumulates small writes and hands the inner sink full buffers
///
/// Writes at least as large as the buffer bypass it. `close` writes out what
/// is buffered before closing the inner sink.
#[derive(Debug)]
pub struct BufferedWrite<S> {
    inner: S,
    buffer: BytesMut,
    capacity: usize,
}

impl<S: WriteSink> BufferedWrite<S> {
    /// Wrap `inner` with the default 64 KiB buffer
    pub fn new(inner: S) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, inner)
    }

    /// Wrap `inner` with a buffer of `capacity` bytes (at least one)
    pub fn with_capacity(capacity: usize, inner: S) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            buffer: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Bytes waiting to be written
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Unwrap the inner sink, discarding anything still buffered
    pub fn into_inner(self) -> S {
        self.inner
    }

    pub fn write_str(&mut self, text: &str) -> Result<(), WriteError> {
        self.write(text.as_bytes())
    }

    /// Write `data` followed by a newline
    pub fn write_line(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.write(data)?;
        self.write(b"\n")
    }

    pub fn write_str_line(&mut self, text: &str) -> Result<(), WriteError> {
        self.write_line(text.as_bytes())
    }

    fn drain(&mut self) -> Result<(), WriteError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let pending = self.buffer.split();
        self.inner.write(&pending)
    }
}

impl<S: WriteSink> WriteSink for BufferedWrite<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn state(&self) -> SinkState {
        self.inner.state()
    }

    fn open(&mut self) -> Result<(), WriteError> {
        self.inner.open()
    }

    fn write(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.state().ensure_open(self.name(), "write")?;
        if data.is_empty() {
            return Ok(());
        }

        if self.buffer.len() + data.len() > self.capacity {
            self.drain()?;
        }

        if data.len() >= self.capacity {
            self.inner.write(data)
        } else {
            self.buffer.extend_from_slice(data);
            Ok(())
        }
    }

    fn flush(&mut self) -> Result<(), WriteError> {
        self.state().ensure_open(self.name(), "flush")?;
        self.drain()?;
        self.inner.flush()
    }

    fn close(&mut self) -> Result<(), WriteError> {
        self.state().ensure_closable(self.name())?;

        let drained = if self.inner.is_writable() {
            self.drain()
        } else {
            self.buffer.clear();
            Ok(())
        };
        settle(drained, self.inner.close())
    }
}
