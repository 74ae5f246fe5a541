//! HandleSink - writes to an OS file descriptor

use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::Path;

use contracts::{SinkOperation, SinkState, WriteError, WriteSink, DEFAULT_FILE_MODE};
use tracing::{debug, instrument};

use crate::raw;

/// How a file sink opens its path
#[derive(Debug, Clone, Copy)]
pub struct FileOptions {
    /// Append to existing content instead of truncating
    pub append: bool,
    /// Permission bits used when the file is created
    pub mode: u32,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            append: true,
            mode: DEFAULT_FILE_MODE,
        }
    }
}

/// Descriptor held by a sink
#[derive(Debug)]
enum SinkFd<'fd> {
    /// Caller keeps ownership; close leaves the descriptor open
    Borrowed(BorrowedFd<'fd>),
    /// Sink owns the descriptor and closes it
    Owned(OwnedFd),
}

impl SinkFd<'_> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            Self::Borrowed(fd) => *fd,
            Self::Owned(fd) => fd.as_fd(),
        }
    }
}

/// Sink that writes to a file descriptor
///
/// Every `write` hands the whole buffer to the descriptor, retrying
/// interrupted calls and continuing after partial writes.
#[derive(Debug)]
pub struct HandleSink<'fd> {
    name: String,
    fd: Option<SinkFd<'fd>>,
    state: SinkState,
}

impl<'fd> HandleSink<'fd> {
    /// Create a sink over a descriptor the caller keeps owning
    pub fn new(name: impl Into<String>, fd: BorrowedFd<'fd>) -> Self {
        Self {
            name: name.into(),
            fd: Some(SinkFd::Borrowed(fd)),
            state: SinkState::Unopened,
        }
    }

    /// Whether `close` also closes the descriptor
    pub fn is_owning(&self) -> bool {
        matches!(self.fd, Some(SinkFd::Owned(_)))
    }

    /// Descriptor in use, `None` once closed
    pub fn fd(&self) -> Option<BorrowedFd<'_>> {
        self.fd.as_ref().map(SinkFd::as_fd)
    }

    fn fail(&mut self, err: WriteError) -> WriteError {
        self.state = SinkState::Failed;
        err
    }
}

impl HandleSink<'static> {
    /// Create a sink that owns `fd` and closes it on `close`
    pub fn owned(name: impl Into<String>, fd: OwnedFd) -> Self {
        Self {
            name: name.into(),
            fd: Some(SinkFd::Owned(fd)),
            state: SinkState::Unopened,
        }
    }

    /// Open `path` for writing and wrap it in an owning sink
    ///
    /// # Errors
    /// `IoFailure` with operation `open` when the file cannot be opened.
    #[instrument(
        name = "handle_sink_create_file",
        skip_all,
        fields(path = %path.as_ref().display())
    )]
    pub fn create_file(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        options: FileOptions,
    ) -> Result<Self, WriteError> {
        let name = name.into();
        let fd = raw::open_for_write(path.as_ref(), options.append, options.mode)
            .map_err(|e| WriteError::io_failure(&name, SinkOperation::Open, e))?;

        debug!(sink = %name, append = options.append, "File opened");
        Ok(Self::owned(name, fd))
    }
}

impl WriteSink for HandleSink<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> SinkState {
        self.state
    }

    fn open(&mut self) -> Result<(), WriteError> {
        self.state.ensure_unopened(&self.name)?;
        self.state = SinkState::Open;
        debug!(sink = %self.name, owning = self.is_owning(), "HandleSink opened");
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.state.ensure_open(&self.name, "write")?;
        if data.is_empty() {
            return Ok(());
        }

        let Some(fd) = self.fd.as_ref() else {
            return Err(WriteError::contract_violation(&self.name, "write without a descriptor"));
        };
        let fd = fd.as_fd();

        raw::write_fully(&self.name, data, |chunk| raw::fd_write(fd, chunk))
            .map_err(|e| self.fail(e))
    }

    fn close(&mut self) -> Result<(), WriteError> {
        self.state.ensure_closable(&self.name)?;
        self.state = SinkState::Closed;

        let result = match self.fd.take() {
            Some(SinkFd::Owned(fd)) => raw::fd_close(fd)
                .map_err(|e| WriteError::io_failure(&self.name, SinkOperation::Close, e)),
            Some(SinkFd::Borrowed(_)) | None => Ok(()),
        };

        debug!(sink = %self.name, ok = result.is_ok(), "HandleSink closed");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::WriteErrorKind;
    use std::fs;
    use std::io::Read;
    use std::os::fd::{AsRawFd, FromRawFd};
    use tempfile::tempdir;

    fn pipe() -> (std::fs::File, OwnedFd) {
        let mut fds = [0; 2];
        // SAFETY: `fds` has room for the two descriptors pipe(2) returns.
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        // SAFETY: both descriptors were just created and are owned here.
        unsafe {
            (
                std::fs::File::from_raw_fd(fds[0]),
                OwnedFd::from_raw_fd(fds[1]),
            )
        }
    }

    #[test]
    fn test_handle_sink_write_borrowed() {
        let (mut reader, writer) = pipe();

        {
            let mut sink = HandleSink::new("pipe", writer.as_fd());
            sink.open().unwrap();
            sink.write(b"hello ").unwrap();
            sink.write(b"world").unwrap();
            sink.close().unwrap();
            assert!(!sink.is_owning());
        }

        // Borrowed descriptor stays open until the owner drops it.
        drop(writer);
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello world");
    }

    #[test]
    fn test_handle_sink_owned_closes_fd() {
        let (mut reader, writer) = pipe();

        let mut sink = HandleSink::owned("owned_pipe", writer);
        sink.open().unwrap();
        sink.write(b"payload").unwrap();
        sink.close().unwrap();
        assert!(sink.fd().is_none());

        // Reader sees EOF because the sink closed the only write end.
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"payload");
    }

    /// Owned duplicate of `fd`, parked high so parallel tests do not reuse its number
    fn high_dup(fd: BorrowedFd<'_>) -> OwnedFd {
        // SAFETY: F_DUPFD_CLOEXEC returns a fresh descriptor or -1.
        let raw = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_DUPFD_CLOEXEC, 512) };
        assert!(raw >= 512);
        // SAFETY: `raw` was just created and nothing else owns it.
        unsafe { OwnedFd::from_raw_fd(raw) }
    }

    #[test]
    fn test_handle_sink_owned_close_failure() {
        let (_reader, writer) = pipe();
        let dup = high_dup(writer.as_fd());
        let raw = dup.as_raw_fd();

        let mut sink = HandleSink::owned("vanished", dup);
        sink.open().unwrap();
        // Close the descriptor behind the sink's back.
        // SAFETY: the sink hands `raw` to close(2) without touching it again.
        assert_eq!(unsafe { libc::close(raw) }, 0);

        let err = sink.close().unwrap_err();
        assert!(matches!(
            err,
            WriteError::IoFailure { operation: SinkOperation::Close, .. }
        ));
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
        assert_eq!(err.sink_name(), "vanished");
        assert_eq!(sink.state(), SinkState::Closed);
        assert!(sink.fd().is_none());
    }

    #[test]
    fn test_handle_sink_state_machine() {
        let (_reader, writer) = pipe();
        let mut sink = HandleSink::new("strict", writer.as_fd());

        let err = sink.write(b"x").unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::ContractViolation);

        sink.open().unwrap();
        assert!(sink.is_writable());
        assert!(sink.open().is_err());

        sink.close().unwrap();
        assert_eq!(sink.state(), SinkState::Closed);

        let err = sink.write(b"x").unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::ContractViolation);
        assert_eq!(err.sink_name(), "strict");

        let err = sink.close().unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::ContractViolation);
    }

    #[test]
    fn test_handle_sink_empty_write() {
        let (_reader, writer) = pipe();
        let mut sink = HandleSink::new("empty", writer.as_fd());
        sink.open().unwrap();
        assert!(sink.write(&[]).is_ok());
        sink.close().unwrap();
    }

    #[test]
    fn test_handle_sink_broken_pipe() {
        let (reader, writer) = pipe();
        drop(reader);

        let mut sink = HandleSink::new("broken", writer.as_fd());
        sink.open().unwrap();
        let err = sink.write(b"lost").unwrap_err();

        assert_eq!(err.kind(), WriteErrorKind::IoFailure);
        assert_eq!(err.raw_os_error(), Some(libc::EPIPE));
        assert_eq!(err.sink_name(), "broken");
        assert_eq!(sink.state(), SinkState::Failed);

        let err = sink.write(b"again").unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::ContractViolation);

        // Close after a failure still works.
        assert!(sink.close().is_ok());
    }

    #[test]
    fn test_create_file_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");

        for line in ["first\n", "second\n"] {
            let mut sink = HandleSink::create_file("log_file", &path, FileOptions::default()).unwrap();
            sink.open().unwrap();
            sink.write(line.as_bytes()).unwrap();
            sink.close().unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_create_file_truncate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "stale content").unwrap();

        let options = FileOptions {
            append: false,
            ..FileOptions::default()
        };
        let mut sink = HandleSink::create_file("report", &path, options).unwrap();
        sink.open().unwrap();
        sink.write(b"fresh").unwrap();
        sink.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh");
    }

    #[test]
    fn test_create_file_missing_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.log");

        let err = HandleSink::create_file("nowhere", &path, FileOptions::default()).unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::IoFailure);
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
        assert!(matches!(
            err,
            WriteError::IoFailure {
                operation: SinkOperation::Open,
                ..
            }
        ));
    }
}
