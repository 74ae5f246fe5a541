//! # Handle Write
//!
//! Write sinks over OS file descriptors.
//!
//! Provides:
//! - `HandleSink`: full writes to a borrowed or owned descriptor, retrying
//!   interrupted calls and continuing after partial writes
//! - `write_one_str`: one-shot open/write/close on a descriptor
//! - `MemorySink` and the `BufferedWrite` decorator behind the same trait
//! - `Dispatcher`: fan-out of the same bytes to several sinks, isolating failures

pub mod dispatcher;
pub mod error;
pub mod helper;
pub mod metrics;
mod raw;
pub mod sinks;

pub use contracts::{SinkState, WriteError, WriteErrorKind, WriteSink};
pub use dispatcher::{create_dispatcher, create_sink, BoxedSink, DispatchOutcome, Dispatcher};
pub use error::DispatcherError;
pub use helper::{write_one_str, ONE_STR_SINK_NAME};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use raw::borrow_inherited;
pub use sinks::{BufferedWrite, FileOptions, HandleSink, MemorySink};
