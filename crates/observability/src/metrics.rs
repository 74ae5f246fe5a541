//! Write and dispatch metrics
//!
//! Counters go through the `metrics` facade; they are no-ops until a recorder
//! is installed. `DispatchStats` keeps the same numbers in memory for the
//! summary printed at the end of a run.

use std::collections::BTreeMap;
use std::fmt;

use contracts::WriteErrorKind;
use metrics::counter;

/// Record bytes accepted by a sink
pub fn record_bytes_written(sink_name: &str, bytes: usize) {
    counter!(
        "hwrite_bytes_written_total",
        "sink" => sink_name.to_string()
    )
    .increment(bytes as u64);
}

/// Record a failed write, labelled with the error kind
pub fn record_write_failure(sink_name: &str, kind: WriteErrorKind) {
    counter!(
        "hwrite_write_failures_total",
        "sink" => sink_name.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record one fan-out dispatch
pub fn record_dispatch(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("hwrite_dispatch_total", "status" => status).increment(1);
}

/// Dispatch statistics aggregator
#[derive(Debug, Clone, Default)]
pub struct DispatchStats {
    /// Total dispatches
    pub dispatches: u64,
    /// Dispatches where every targeted sink accepted the payload
    pub clean_dispatches: u64,
    /// Sink deliveries across all dispatches
    pub deliveries: u64,
    /// Sinks skipped because they had already failed
    pub skipped: u64,
    /// Payload size statistics
    pub payload: SizeStats,
    /// Failures per sink
    pub failures: BTreeMap<String, u64>,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one dispatch into the statistics
    pub fn update<'a>(
        &mut self,
        payload_len: usize,
        delivered: usize,
        skipped: usize,
        failed_sinks: impl IntoIterator<Item = &'a str>,
    ) {
        self.dispatches += 1;
        self.deliveries += delivered as u64;
        self.skipped += skipped as u64;
        self.payload.push(payload_len as u64);

        let mut clean = true;
        for sink in failed_sinks {
            clean = false;
            *self.failures.entry(sink.to_string()).or_insert(0) += 1;
        }
        if clean {
            self.clean_dispatches += 1;
        }
    }

    /// Whether any sink failed so far
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            dispatches: self.dispatches,
            deliveries: self.deliveries,
            skipped: self.skipped,
            failure_rate: if self.dispatches > 0 {
                (self.dispatches - self.clean_dispatches) as f64 / self.dispatches as f64 * 100.0
            } else {
                0.0
            },
            payload: self.payload,
            failures: self.failures.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Dispatch summary
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub dispatches: u64,
    pub deliveries: u64,
    pub skipped: u64,
    pub failure_rate: f64,
    pub payload: SizeStats,
    pub failures: BTreeMap<String, u64>,
}

impl fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(
            f,
            "Dispatches: {} ({:.2}% with failures)",
            self.dispatches, self.failure_rate
        )?;
        writeln!(f, "Deliveries: {}", self.deliveries)?;
        writeln!(f, "Skipped: {}", self.skipped)?;
        writeln!(f, "Payload bytes: {}", self.payload)?;

        if !self.failures.is_empty() {
            writeln!(f, "Failed sinks:")?;
            for (sink, count) in &self.failures {
                writeln!(f, "  {sink}: {count}")?;
            }
        }

        Ok(())
    }
}

/// Running count/total/min/max over byte sizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeStats {
    count: u64,
    total: u64,
    min: u64,
    max: u64,
}

impl SizeStats {
    pub fn push(&mut self, value: u64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.total = self.total.saturating_add(value);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total as f64 / self.count as f64
        }
    }
}

impl fmt::Display for SizeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "total={}, min={}, max={}, mean={:.1} (n={})",
                self.total,
                self.min,
                self.max,
                self.mean(),
                self.count
            )
        }
    }
}
