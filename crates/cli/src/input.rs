//! Chunked reading of command input.

use std::io::{self, ErrorKind, Read};

/// Read size for stdin copies
pub const CHUNK_SIZE: usize = 8192;

/// Feed `reader` to `consume` in chunks until end of input
///
/// Interrupted reads are retried. Returns the number of bytes consumed.
pub fn for_each_chunk<R, F, E>(mut reader: R, mut consume: F) -> Result<u64, E>
where
    R: Read,
    F: FnMut(&[u8]) -> Result<(), E>,
    E: From<io::Error>,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        consume(&buf[..n])?;
        total += n as u64;
    }
}

/// The payload given on the command line, optionally newline-terminated
pub fn text_payload(text: &str, newline: bool) -> String {
    if newline {
        format!("{text}\n")
    } else {
        text.to_string()
    }
}
