//! Sink implementations
//!
//! Contains HandleSink, MemorySink, and the BufferedWrite decorator.

mod buffered;
mod handle;
mod memory;

pub use self::buffered::BufferedWrite;
pub use self::handle::{FileOptions, HandleSink};
pub use self::memory::MemorySink;
