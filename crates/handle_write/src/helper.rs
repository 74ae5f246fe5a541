//! One-shot writes to a descriptor

use std::os::fd::AsFd;

use contracts::{WriteError, WriteSink};

use crate::HandleSink;

/// Diagnostic name of the ad-hoc sink used by [`write_one_str`]
pub const ONE_STR_SINK_NAME: &str = "handle";

/// Write `payload` to `fd` through a short-lived sink
///
/// The descriptor is borrowed and left open, so closing the ad-hoc sink only
/// releases the sink itself and never fails with an OS error.
///
/// # Errors
/// Any error from writing or closing the ad-hoc sink.
pub fn write_one_str(fd: impl AsFd, payload: &str) -> Result<(), WriteError> {
    let mut sink = HandleSink::new(ONE_STR_SINK_NAME, fd.as_fd());
    write_once(&mut sink, payload)
}

/// Open `sink`, write `payload` and close it.
///
/// Close runs even when the write fails; in that case the write failure is
/// returned with any close failure attached as its secondary error.
pub(crate) fn write_once<S: WriteSink>(sink: &mut S, payload: &str) -> Result<(), WriteError> {
    sink.open()?;

    let written = sink.write(payload.as_bytes());
    settle(written, sink.close())
}

/// Merge the result of an operation with the result of the cleanup that followed it.
///
/// The operation's failure wins; a cleanup failure is attached to it, or
/// returned alone when the operation succeeded.
pub(crate) fn settle(
    outcome: Result<(), WriteError>,
    cleanup: Result<(), WriteError>,
) -> Result<(), WriteError> {
    match (outcome, cleanup) {
        (Err(primary), Err(secondary)) => Err(primary.with_secondary(secondary)),
        (Err(primary), Ok(())) => Err(primary),
        (Ok(()), cleanup) => cleanup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkOperation, SinkState, WriteErrorKind};
    use std::io::{self, Read};
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

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
    fn test_write_one_str() {
        let (mut reader, writer) = pipe();
        write_one_str(&writer, "error: something broke\n").unwrap();
        drop(writer);

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "error: something broke\n");
    }

    #[test]
    fn test_write_one_str_empty() {
        let (mut reader, writer) = pipe();
        assert!(write_one_str(&writer, "").is_ok());
        drop(writer);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_one_str_reports_write_failure() {
        let (reader, writer) = pipe();
        drop(reader);

        let err = write_one_str(&writer, "nobody listens").unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::IoFailure);
        assert_eq!(err.sink_name(), ONE_STR_SINK_NAME);
        assert_eq!(err.raw_os_error(), Some(libc::EPIPE));
        // Borrowed close cannot fail, so nothing is attached.
        assert!(err.secondary().is_none());
    }

    #[test]
    fn test_write_once_closes_after_failed_write() {
        let (_reader, writer) = pipe();
        // SAFETY: F_DUPFD_CLOEXEC returns a fresh descriptor or -1.
        let raw = unsafe { libc::fcntl(writer.as_raw_fd(), libc::F_DUPFD_CLOEXEC, 512) };
        assert!(raw >= 512);
        // SAFETY: `raw` was just created and nothing else owns it.
        let mut sink = HandleSink::owned("gone", unsafe { OwnedFd::from_raw_fd(raw) });
        // Write and close both hit a descriptor that no longer exists.
        // SAFETY: the sink hands `raw` to close(2) without touching it again.
        assert_eq!(unsafe { libc::close(raw) }, 0);

        let err = write_once(&mut sink, "lost").unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::IoFailure);
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
        assert!(matches!(
            err.secondary(),
            Some(WriteError::IoFailure { operation: SinkOperation::Close, .. })
        ));
        assert_eq!(sink.state(), SinkState::Closed);
    }

    #[test]
    fn test_settle_prefers_primary() {
        let write = Err(WriteError::closed("s", 3, 10));
        let close = Err(WriteError::io_failure(
            "s",
            SinkOperation::Close,
            io::Error::from_raw_os_error(libc::EIO),
        ));

        let err = settle(write, close).unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::Closed);
        assert_eq!(
            err.secondary().map(WriteError::kind),
            Some(WriteErrorKind::IoFailure)
        );
    }

    #[test]
    fn test_settle_cleanup_only() {
        let close = Err(WriteError::contract_violation("s", "closed twice"));
        let err = settle(Ok(()), close).unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::ContractViolation);

        assert!(settle(Ok(()), Ok(())).is_ok());
    }
}
