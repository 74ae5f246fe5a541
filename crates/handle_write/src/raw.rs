//! OS write primitive and the full-write loop shared by every sink.

use std::fs::OpenOptions;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use contracts::{SinkOperation, WriteError};

/// Largest byte count handed to a single `write(2)` call.
const MAX_WRITE: usize = isize::MAX as usize;

/// Hand `data` to `attempt` until every byte has been accepted.
///
/// `attempt` receives the unwritten tail of `data` and reports how many of
/// those bytes it took. Interruptions are retried at the same offset; zero
/// progress with bytes remaining fails with [`WriteError::Closed`].
pub(crate) fn write_fully<F>(sink_name: &str, data: &[u8], mut attempt: F) -> Result<(), WriteError>
where
    F: FnMut(&[u8]) -> io::Result<usize>,
{
    let mut offset = 0;

    while offset < data.len() {
        match attempt(&data[offset..]) {
            Ok(0) => return Err(WriteError::closed(sink_name, offset, data.len())),
            Ok(n) => offset += n,
            Err(e) => match WriteError::from_os(sink_name, SinkOperation::Write, e) {
                WriteError::Interrupted { .. } => continue,
                err => return Err(err),
            },
        }
    }

    Ok(())
}

/// Single `write(2)` call.
pub(crate) fn fd_write(fd: BorrowedFd<'_>, buf: &[u8]) -> io::Result<usize> {
    let len = buf.len().min(MAX_WRITE);
    // SAFETY: `buf` is valid for `len` bytes and `fd` is open for the borrow.
    let result = unsafe { libc::write(fd.as_raw_fd(), buf.as_ptr().cast(), len) };
    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        // Non-negative ssize_t fits in usize.
        Ok(result as usize)
    }
}

/// `close(2)` that reports the failure instead of discarding it like `Drop`.
///
/// `EINTR` counts as success: Linux releases the descriptor before returning it.
pub(crate) fn fd_close(fd: OwnedFd) -> io::Result<()> {
    let raw = fd.into_raw_fd();
    // SAFETY: `raw` came out of an `OwnedFd`, so nothing else will close it.
    if unsafe { libc::close(raw) } == -1 {
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
    Ok(())
}

/// Open `path` write-only, creating it with `mode` when missing.
pub(crate) fn open_for_write(path: &Path, append: bool, mode: u32) -> io::Result<OwnedFd> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .mode(mode)
        .open(path)?;
    Ok(OwnedFd::from(file))
}

/// Borrow a descriptor inherited from the parent process for the rest of the run.
///
/// Fails with `EBADF` when `raw` is negative or not an open descriptor.
///
/// # Safety
/// The caller guarantees nothing in this process closes `raw` while the
/// returned borrow (or any sink built on it) is alive.
pub unsafe fn borrow_inherited(raw: RawFd) -> io::Result<BorrowedFd<'static>> {
    if raw < 0 {
        return Err(io::Error::from_raw_os_error(libc::EBADF));
    }
    // SAFETY: F_GETFD only inspects descriptor flags.
    if unsafe { libc::fcntl(raw, libc::F_GETFD) } == -1 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `raw` is open and non-negative; the caller upholds the lifetime.
    Ok(unsafe { BorrowedFd::borrow_raw(raw) })
}
