//! Sink metrics for observability
//!
//! A write accepted by a sink may still sit in an output buffer, so its bytes
//! stay pending until the next successful flush or close confirms them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Total successful writes
    write_count: AtomicU64,
    /// Total write, flush or close failures
    failure_count: AtomicU64,
    /// Bytes confirmed by a successful flush or close
    bytes_written: AtomicU64,
    /// Bytes accepted since the last confirmation
    bytes_pending: AtomicU64,
    /// Dispatches skipped because the sink had already failed
    skipped_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total write count
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Record a write of `bytes` bytes the sink accepted
    pub fn record_write(&self, bytes: usize) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_pending
            .fetch_add(u64::try_from(bytes).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    /// Move pending bytes to `bytes_written` after a successful flush or close
    pub fn confirm_pending(&self) {
        let pending = self.bytes_pending.swap(0, Ordering::Relaxed);
        self.bytes_written.fetch_add(pending, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Record a failure; pending bytes can no longer be confirmed
    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_pending.store(0, Ordering::Relaxed);
    }

    /// Get bytes confirmed written
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Get bytes accepted but not yet confirmed
    pub fn bytes_pending(&self) -> u64 {
        self.bytes_pending.load(Ordering::Relaxed)
    }

    /// Get skipped count
    pub fn skipped_count(&self) -> u64 {
        self.skipped_count.load(Ordering::Relaxed)
    }

    /// Increment skipped count
    pub fn inc_skipped_count(&self) {
        self.skipped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            bytes_written: self.bytes_written(),
            bytes_pending: self.bytes_pending(),
            skipped_count: self.skipped_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub write_count: u64,
    pub failure_count: u64,
    pub bytes_written: u64,
    pub bytes_pending: u64,
    pub skipped_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_write_is_pending_until_confirmed() {
        let metrics = SinkMetrics::new();
        metrics.record_write(10);
        metrics.record_write(5);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.write_count, 2);
        assert_eq!(snapshot.bytes_written, 0);
        assert_eq!(snapshot.bytes_pending, 15);

        metrics.confirm_pending();
        assert_eq!(metrics.bytes_written(), 15);
        assert_eq!(metrics.bytes_pending(), 0);
    }

    #[test]
    fn test_failure_drops_pending() {
        let metrics = SinkMetrics::new();
        metrics.record_write(4);
        metrics.confirm_pending();
        metrics.record_write(6);
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.failure_count, 1);
        assert_eq!(snapshot.bytes_written, 4);
        assert_eq!(snapshot.bytes_pending, 0);
        assert_eq!(snapshot.skipped_count, 0);
    }
}
