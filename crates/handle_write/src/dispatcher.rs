//! Dispatcher - fan-out of the same bytes to several sinks

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use contracts::{SinkConfig, SinkDefaults, SinkSetConfig, SinkTarget, WriteError, WriteSink};

use crate::error::DispatcherError;
use crate::helper::settle;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::raw;
use crate::sinks::{BufferedWrite, FileOptions, HandleSink, MemorySink};

/// Any sink the dispatcher can drive
pub type BoxedSink = Box<dyn WriteSink + Send>;

/// Create a sink from configuration
///
/// `stdout`, `stderr` and `fd` targets borrow descriptors inherited by the
/// process; `file` targets are opened and owned by the sink.
#[instrument(
    name = "dispatcher_create_sink",
    skip(config, defaults),
    fields(sink = %config.name, kind = config.target.kind())
)]
pub fn create_sink(
    config: &SinkConfig,
    defaults: &SinkDefaults,
) -> Result<BoxedSink, DispatcherError> {
    let sink: BoxedSink = match &config.target {
        SinkTarget::Stdout => inherited_sink(&config.name, libc::STDOUT_FILENO)?,
        SinkTarget::Stderr => inherited_sink(&config.name, libc::STDERR_FILENO)?,
        SinkTarget::Fd { fd } => inherited_sink(&config.name, *fd)?,
        SinkTarget::File { path, append, mode } => {
            let options = FileOptions {
                append: *append,
                mode: *mode,
            };
            Box::new(HandleSink::create_file(&config.name, path, options)?)
        }
        SinkTarget::Memory { capacity } => match capacity {
            Some(limit) => Box::new(MemorySink::with_limit(&config.name, *limit)),
            None => Box::new(MemorySink::new(&config.name)),
        },
    };

    match config.effective_buffer_size(defaults) {
        Some(size) => {
            debug!(sink = %config.name, buffer_size = size, "Buffering enabled");
            Ok(Box::new(BufferedWrite::with_capacity(size, sink)))
        }
        None => Ok(sink),
    }
}

fn inherited_sink(name: &str, raw_fd: i32) -> Result<BoxedSink, DispatcherError> {
    // SAFETY: standard streams and configured descriptors are inherited from
    // the parent and never closed by this process.
    let fd = unsafe { raw::borrow_inherited(raw_fd) }
        .map_err(|e| DispatcherError::sink_creation(name, format!("descriptor {raw_fd}: {e}")))?;
    Ok(Box::new(HandleSink::new(name, fd)))
}

/// Build a dispatcher with one sink per configured route
///
/// Sinks marked `optional` that cannot be created are left out with a
/// warning; any other creation failure aborts.
pub fn create_dispatcher(config: &SinkSetConfig) -> Result<Dispatcher, DispatcherError> {
    let mut sinks = Vec::with_capacity(config.sinks.len());
    for sink in &config.sinks {
        match create_sink(sink, &config.defaults) {
            Ok(built) => sinks.push(built),
            Err(e) if sink.optional => {
                warn!(sink = %sink.name, error = %e, "Optional sink unavailable, continuing without it");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(Dispatcher::new(sinks))
}

/// Result of one dispatch
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Sinks that accepted every byte (a buffered sink may still hold them
    /// until the next flush or close)
    pub delivered: usize,
    /// Sinks skipped because an earlier dispatch failed on them
    pub skipped: usize,
    /// Sinks that failed during this dispatch
    pub failures: Vec<(String, WriteError)>,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }
}

struct Route {
    sink: BoxedSink,
    metrics: Arc<SinkMetrics>,
    healthy: bool,
}

/// Fans every buffer out to all of its sinks
///
/// A failing sink is isolated: its error is reported once, it is skipped on
/// later dispatches, and the remaining sinks keep receiving data.
pub struct Dispatcher {
    routes: Vec<Route>,
}

impl Dispatcher {
    /// Create a dispatcher over already-built sinks
    pub fn new(sinks: Vec<BoxedSink>) -> Self {
        let routes = sinks
            .into_iter()
            .map(|sink| Route {
                sink,
                metrics: Arc::new(SinkMetrics::new()),
                healthy: true,
            })
            .collect();
        Self { routes }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Sink names in dispatch order
    pub fn sink_names(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.sink.name()).collect()
    }

    /// Shared metrics handle for one sink
    pub fn sink_metrics(&self, name: &str) -> Option<Arc<SinkMetrics>> {
        self.routes
            .iter()
            .find(|r| r.sink.name() == name)
            .map(|r| Arc::clone(&r.metrics))
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.routes
            .iter()
            .map(|r| (r.sink.name().to_string(), r.metrics.snapshot()))
            .collect()
    }

    /// Open every sink that is not open yet
    ///
    /// # Errors
    /// Stops at the first sink that fails to open.
    #[instrument(name = "dispatcher_open_all", skip(self), fields(sinks = self.routes.len()))]
    pub fn open_all(&mut self) -> Result<(), WriteError> {
        for route in &mut self.routes {
            if route.sink.state() == contracts::SinkState::Unopened {
                route.sink.open()?;
            }
        }
        info!(sinks = self.routes.len(), "Dispatcher opened");
        Ok(())
    }

    /// Write `data` to every healthy sink
    pub fn dispatch(&mut self, data: &[u8]) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for route in &mut self.routes {
            if !route.healthy {
                route.metrics.inc_skipped_count();
                outcome.skipped += 1;
                continue;
            }

            match route.sink.write(data) {
                Ok(()) => {
                    route.metrics.record_write(data.len());
                    outcome.delivered += 1;
                }
                Err(e) => {
                    route.metrics.record_failure();
                    route.healthy = false;
                    warn!(sink = %route.sink.name(), error = %e, "Sink disabled after write failure");
                    outcome.failures.push((route.sink.name().to_string(), e));
                }
            }
        }

        outcome
    }

    /// Flush every healthy sink, confirming the bytes it accepted so far
    pub fn flush_all(&mut self) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for route in &mut self.routes {
            if !route.healthy {
                route.metrics.inc_skipped_count();
                outcome.skipped += 1;
                continue;
            }
            match route.sink.flush() {
                Ok(()) => {
                    route.metrics.confirm_pending();
                    outcome.delivered += 1;
                }
                Err(e) => {
                    route.metrics.record_failure();
                    route.healthy = false;
                    warn!(sink = %route.sink.name(), error = %e, "Sink disabled after flush failure");
                    outcome.failures.push((route.sink.name().to_string(), e));
                }
            }
        }

        outcome
    }

    /// Flush and close every sink, collecting failures instead of stopping
    ///
    /// Metrics handles taken through [`Dispatcher::sink_metrics`] stay valid
    /// and reflect the final byte counts once this returns.
    #[instrument(name = "dispatcher_shutdown", skip(self))]
    pub fn shutdown(mut self) -> Vec<(String, WriteError)> {
        let mut failures = Vec::new();

        for route in &mut self.routes {
            let flushed = if route.sink.is_writable() {
                route.sink.flush()
            } else {
                Ok(())
            };
            match settle(flushed, route.sink.close()) {
                Ok(()) => route.metrics.confirm_pending(),
                Err(e) => {
                    route.metrics.record_failure();
                    failures.push((route.sink.name().to_string(), e));
                }
            }
        }

        debug!(failures = failures.len(), "Dispatcher shutdown complete");
        failures
    }
}
