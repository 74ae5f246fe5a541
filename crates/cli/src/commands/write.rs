//! `write` command implementation.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use handle_write::{
    borrow_inherited, write_one_str, BufferedWrite, HandleSink, WriteSink, ONE_STR_SINK_NAME,
};
use observability::metrics::{record_bytes_written, record_write_failure};

use crate::cli::WriteArgs;
use crate::error::CliError;
use crate::input::{for_each_chunk, text_payload};

/// Execute the `write` command
pub fn run_write(args: &WriteArgs) -> Result<()> {
    // SAFETY: the descriptor comes from the invoking process and stays open
    // for the lifetime of this one, which never closes it.
    let fd = unsafe { borrow_inherited(args.fd) }
        .map_err(|e| CliError::bad_descriptor(args.fd, e))?;

    let name = args.name.as_deref().unwrap_or(ONE_STR_SINK_NAME);
    info!(fd = args.fd, sink = name, "Writing to descriptor");

    let result = match (&args.text, &args.name) {
        (Some(text), None) => {
            let payload = text_payload(text, args.newline);
            write_one_str(fd, &payload)
                .map(|()| payload.len() as u64)
                .map_err(CliError::from)
        }
        (text, _) => write_through_sink(HandleSink::new(name, fd), text.as_deref(), args.newline),
    };

    match result {
        Ok(bytes) => {
            record_bytes_written(name, bytes as usize);
            debug!(sink = name, bytes, "Write complete");
            Ok(())
        }
        Err(e) => {
            if let CliError::Write(ref write_error) = e {
                record_write_failure(write_error.sink_name(), write_error.kind());
            }
            Err(e).with_context(|| format!("Failed to write to fd {}", args.fd))
        }
    }
}

/// Write `text` (or all of stdin) through a buffered sink and close it
///
/// Close runs even when copying fails; a write failure keeps the close
/// failure as its secondary error.
fn write_through_sink<S: WriteSink>(
    sink: S,
    text: Option<&str>,
    newline: bool,
) -> Result<u64, CliError> {
    let mut sink = BufferedWrite::new(sink);
    sink.open()?;

    let copied = copy_payload(&mut sink, text, newline);
    let closed = sink.close();

    match (copied, closed) {
        (Ok(total), closed) => closed.map(|()| total).map_err(CliError::from),
        (Err(CliError::Write(primary)), Err(secondary)) => {
            Err(primary.with_secondary(secondary).into())
        }
        (Err(e), Err(secondary)) => {
            warn!(error = %secondary, "Close failed after input error");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
    }
}

fn copy_payload<S: WriteSink>(
    sink: &mut BufferedWrite<S>,
    text: Option<&str>,
    newline: bool,
) -> Result<u64, CliError> {
    let mut total = match text {
        Some(text) => {
            sink.write_str(text)?;
            text.len() as u64
        }
        None => for_each_chunk(std::io::stdin().lock(), |chunk| {
            sink.write(chunk).map_err(CliError::from)
        })?,
    };

    if newline {
        sink.write(b"\n")?;
        total += 1;
    }
    Ok(total)
}
