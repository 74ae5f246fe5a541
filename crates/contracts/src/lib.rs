//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate, reverse dependencies are prohibited.
//!
//! ## Sink lifecycle
//! - `Unopened` → `open` → `Open` → `write`* → `close` → `Closed`
//! - A surfaced write error moves the sink to `Failed`; only `close` is valid there

mod config;
mod error;
mod sink;

pub use config::*;
pub use error::*;
pub use sink::*;
