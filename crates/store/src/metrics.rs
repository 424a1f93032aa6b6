//! Store metrics collection and monitoring
//!
//! This module provides metrics for ordered-set stores:
//!
//! - Operation counts per primitive (add, remove, cardinality, score, range, delete, pipeline)
//! - Operation latencies (cumulative microseconds and p50/p95/p99 percentiles)
//! - Error and timeout counts
//! - Health check counts
//!
//! Metrics are usually collected by wrapping a store in
//! [`MeteredStore`](crate::MeteredStore), which records every call.
//!
//! # Memory Ordering Strategy
//!
//! All atomic operations use `Ordering::Relaxed`. Each counter is independent
//! and monotonically increasing, so atomicity of the individual `fetch_add` is
//! all that is needed. A [`snapshot`](Metrics::snapshot) reads counters one by
//! one and may observe them at slightly different instants; dashboards work on
//! time-aggregated data, where that skew does not matter.
//!
//! # Percentile Tracking
//!
//! Each operation keeps a `LatencyHistogram`: a circular buffer of the most
//! recent 1024 latency samples (in microseconds), guarded by a
//! [`parking_lot::Mutex`] held only for a single push. Percentiles are computed
//! at snapshot time by sorting a copy of the buffer.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use socialgraph_store::metrics::{Metrics, Operation};
//!
//! let metrics = Metrics::new();
//!
//! metrics.record(Operation::Add, Duration::from_micros(100));
//! metrics.record(Operation::Range, Duration::from_micros(300));
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.add.count, 1);
//! assert_eq!(snapshot.add.avg_latency_us(), 100.0);
//! assert_eq!(snapshot.range.percentiles.p50, 300);
//! ```

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;
use tracing::warn;

/// Default number of latency samples retained per operation.
const DEFAULT_HISTOGRAM_WINDOW_SIZE: usize = 1024;

/// Error rate above which [`Metrics::log_metrics`] emits a warning.
const HIGH_ERROR_RATE: f64 = 0.05;

/// Store primitives tracked by [`Metrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`SortedSetStore::add`](crate::SortedSetStore::add)
    Add,
    /// [`SortedSetStore::remove`](crate::SortedSetStore::remove)
    Remove,
    /// [`SortedSetStore::cardinality`](crate::SortedSetStore::cardinality)
    Cardinality,
    /// [`SortedSetStore::score`](crate::SortedSetStore::score) and `contains`
    Score,
    /// Any ranked read
    Range,
    /// [`SortedSetStore::delete`](crate::SortedSetStore::delete)
    Delete,
    /// A pipeline commit
    Pipeline,
}

impl Operation {
    /// Every tracked operation, in snapshot order.
    pub const ALL: [Operation; 7] = [
        Operation::Add,
        Operation::Remove,
        Operation::Cardinality,
        Operation::Score,
        Operation::Range,
        Operation::Delete,
        Operation::Pipeline,
    ];

    /// Short lowercase name, used as a log field prefix.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Remove => "remove",
            Operation::Cardinality => "cardinality",
            Operation::Score => "score",
            Operation::Range => "range",
            Operation::Delete => "delete",
            Operation::Pipeline => "pipeline",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── LatencyPercentiles ──────────────────────────────────────────────────

/// Latency percentiles for a single operation, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyPercentiles {
    /// 50th percentile (median) latency in microseconds.
    pub p50: u64,
    /// 95th percentile latency in microseconds.
    pub p95: u64,
    /// 99th percentile latency in microseconds.
    pub p99: u64,
}

/// A bounded circular buffer of latency samples.
///
/// Records the most recent `capacity` latency values (in microseconds); older
/// values are overwritten once the buffer is full.
pub(crate) struct LatencyHistogram {
    inner: Mutex<HistogramInner>,
}

struct HistogramInner {
    buf: Vec<u64>,
    pos: usize,
    capacity: usize,
}

impl LatencyHistogram {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(HistogramInner {
                buf: Vec::with_capacity(capacity),
                pos: 0,
                capacity,
            }),
        }
    }

    pub(crate) fn record(&self, value_us: u64) {
        let mut inner = self.inner.lock();
        let pos = inner.pos;
        if inner.buf.len() < inner.capacity {
            inner.buf.push(value_us);
        } else {
            inner.buf[pos] = value_us;
        }
        inner.pos = (pos + 1) % inner.capacity;
    }

    /// Computes p50, p95, p99 from the current buffer contents.
    ///
    /// Returns all zeros if no samples have been recorded.
    pub(crate) fn percentiles(&self) -> LatencyPercentiles {
        let inner = self.inner.lock();
        if inner.buf.is_empty() {
            return LatencyPercentiles::default();
        }
        let mut sorted = inner.buf.clone();
        sorted.sort_unstable();
        let len = sorted.len();
        LatencyPercentiles {
            p50: sorted[percentile_index(len, 50)],
            p95: sorted[percentile_index(len, 95)],
            p99: sorted[percentile_index(len, 99)],
        }
    }

    pub(crate) fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.buf.clear();
        inner.pos = 0;
    }
}

/// Nearest-rank index: `ceil(percentile/100 * len) - 1`, clamped to the slice.
fn percentile_index(len: usize, percentile: u32) -> usize {
    if len == 0 {
        return 0;
    }
    let rank = (u64::from(percentile) * len as u64).div_ceil(100) as usize;
    rank.saturating_sub(1).min(len - 1)
}

// ── Snapshots ───────────────────────────────────────────────────────────

/// Counters for one operation at snapshot time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationSnapshot {
    /// Number of completed calls.
    pub count: u64,
    /// Cumulative latency in microseconds.
    pub latency_us: u64,
    /// Recent-window latency percentiles.
    pub percentiles: LatencyPercentiles,
}

impl OperationSnapshot {
    /// Returns the average latency in microseconds, or 0 with no calls.
    #[must_use]
    pub fn avg_latency_us(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.latency_us as f64 / self.count as f64 }
    }
}

/// Metrics snapshot for export.
#[derive(Debug, Clone, Default, bon::Builder)]
pub struct MetricsSnapshot {
    /// Add calls.
    #[builder(default)]
    pub add: OperationSnapshot,
    /// Remove calls.
    #[builder(default)]
    pub remove: OperationSnapshot,
    /// Cardinality calls.
    #[builder(default)]
    pub cardinality: OperationSnapshot,
    /// Score and membership lookups.
    #[builder(default)]
    pub score: OperationSnapshot,
    /// Ranked reads.
    #[builder(default)]
    pub range: OperationSnapshot,
    /// Whole-set deletes.
    #[builder(default)]
    pub delete: OperationSnapshot,
    /// Pipeline commits.
    #[builder(default)]
    pub pipeline: OperationSnapshot,

    /// Total errors.
    #[builder(default)]
    pub error_count: u64,
    /// Timeout errors (a subset of `error_count`).
    #[builder(default)]
    pub timeout_count: u64,
    /// Health check count.
    #[builder(default)]
    pub health_check_count: u64,
}

impl MetricsSnapshot {
    /// Returns the snapshot for a single operation.
    #[must_use]
    pub fn operation(&self, operation: Operation) -> &OperationSnapshot {
        match operation {
            Operation::Add => &self.add,
            Operation::Remove => &self.remove,
            Operation::Cardinality => &self.cardinality,
            Operation::Score => &self.score,
            Operation::Range => &self.range,
            Operation::Delete => &self.delete,
            Operation::Pipeline => &self.pipeline,
        }
    }

    /// Returns the total operations count.
    #[must_use]
    pub fn total_operations(&self) -> u64 {
        Operation::ALL.iter().map(|op| self.operation(*op).count).sum()
    }

    /// Returns the write operations count (add, remove, delete, pipeline).
    #[must_use]
    pub fn write_operations(&self) -> u64 {
        self.add.count + self.remove.count + self.delete.count + self.pipeline.count
    }

    /// Returns the error rate (0.0 - 1.0).
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        let total_ops = self.total_operations();
        if total_ops == 0 { 0.0 } else { self.error_count as f64 / total_ops as f64 }
    }
}

// ── Metrics ─────────────────────────────────────────────────────────────

struct OperationCounters {
    count: AtomicU64,
    latency_us: AtomicU64,
    histogram: LatencyHistogram,
}

impl OperationCounters {
    fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            latency_us: AtomicU64::new(0),
            histogram: LatencyHistogram::new(DEFAULT_HISTOGRAM_WINDOW_SIZE),
        }
    }

    fn snapshot(&self) -> OperationSnapshot {
        OperationSnapshot {
            count: self.count.load(Ordering::Relaxed),
            latency_us: self.latency_us.load(Ordering::Relaxed),
            percentiles: self.histogram.percentiles(),
        }
    }

    fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.latency_us.store(0, Ordering::Relaxed);
        self.histogram.reset();
    }
}

struct MetricsInner {
    operations: [OperationCounters; Operation::ALL.len()],
    error_count: AtomicU64,
    timeout_count: AtomicU64,
    health_check_count: AtomicU64,
}

/// Collects operation counts, latencies and error counts for a store.
///
/// Cloning is cheap; clones share the same counters.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

impl Metrics {
    /// Creates a new metrics collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                operations: std::array::from_fn(|_| OperationCounters::new()),
                error_count: AtomicU64::new(0),
                timeout_count: AtomicU64::new(0),
                health_check_count: AtomicU64::new(0),
            }),
        }
    }

    /// Records a completed call of `operation` that took `duration`.
    pub fn record(&self, operation: Operation, duration: Duration) {
        let us = duration.as_micros() as u64;
        let counters = &self.inner.operations[operation.index()];
        counters.count.fetch_add(1, Ordering::Relaxed);
        counters.latency_us.fetch_add(us, Ordering::Relaxed);
        counters.histogram.record(us);
    }

    /// Increments the general error counter.
    pub fn record_error(&self) {
        self.inner.error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a timeout error. Also counts as an error.
    pub fn record_timeout(&self) {
        self.inner.timeout_count.fetch_add(1, Ordering::Relaxed);
        self.record_error();
    }

    /// Records a health check.
    pub fn record_health_check(&self) {
        self.inner.health_check_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of current metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let op = |operation: Operation| self.inner.operations[operation.index()].snapshot();
        MetricsSnapshot {
            add: op(Operation::Add),
            remove: op(Operation::Remove),
            cardinality: op(Operation::Cardinality),
            score: op(Operation::Score),
            range: op(Operation::Range),
            delete: op(Operation::Delete),
            pipeline: op(Operation::Pipeline),
            error_count: self.inner.error_count.load(Ordering::Relaxed),
            timeout_count: self.inner.timeout_count.load(Ordering::Relaxed),
            health_check_count: self.inner.health_check_count.load(Ordering::Relaxed),
        }
    }

    /// Resets all metrics to zero.
    pub fn reset(&self) {
        for counters in &self.inner.operations {
            counters.reset();
        }
        self.inner.error_count.store(0, Ordering::Relaxed);
        self.inner.timeout_count.store(0, Ordering::Relaxed);
        self.inner.health_check_count.store(0, Ordering::Relaxed);
    }

    /// Logs current metrics at INFO level, warning on a high error rate.
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();

        if snapshot.total_operations() == 0 {
            return;
        }

        tracing::info!(
            add_count = snapshot.add.count,
            remove_count = snapshot.remove.count,
            cardinality_count = snapshot.cardinality.count,
            score_count = snapshot.score.count,
            range_count = snapshot.range.count,
            delete_count = snapshot.delete.count,
            pipeline_count = snapshot.pipeline.count,
            avg_add_latency_us = snapshot.add.avg_latency_us(),
            avg_range_latency_us = snapshot.range.avg_latency_us(),
            avg_pipeline_latency_us = snapshot.pipeline.avg_latency_us(),
            range_p50 = snapshot.range.percentiles.p50,
            range_p95 = snapshot.range.percentiles.p95,
            range_p99 = snapshot.range.percentiles.p99,
            pipeline_p99 = snapshot.pipeline.percentiles.p99,
            error_count = snapshot.error_count,
            error_rate = snapshot.error_rate(),
            timeout_count = snapshot.timeout_count,
            "Store metrics snapshot"
        );

        if snapshot.error_rate() > HIGH_ERROR_RATE {
            warn!(
                error_rate = snapshot.error_rate(),
                error_count = snapshot.error_count,
                total_ops = snapshot.total_operations(),
                "High store error rate detected"
            );
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Exposes the [`Metrics`] instance for a store.
pub trait MetricsCollector {
    /// Returns a reference to the store's metrics collector.
    fn metrics(&self) -> &Metrics;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use rstest::rstest;

    use super::*;

    // ── LatencyHistogram ────────────────────────────────────────────────

    #[test]
    fn test_histogram_empty_percentiles() {
        let h = LatencyHistogram::new(16);
        assert_eq!(h.percentiles(), LatencyPercentiles::default());
    }

    #[test]
    fn test_histogram_known_distribution() {
        let h = LatencyHistogram::new(1024);
        for v in 1..=100 {
            h.record(v);
        }
        let p = h.percentiles();
        assert_eq!(p.p50, 50);
        assert_eq!(p.p95, 95);
        assert_eq!(p.p99, 99);
    }

    #[test]
    fn test_histogram_circular_eviction() {
        let h = LatencyHistogram::new(10);
        for v in 1..=20 {
            h.record(v);
        }
        // Only [11..=20] remain.
        let p = h.percentiles();
        assert_eq!(p.p50, 15);
        assert_eq!(p.p99, 20);
    }

    #[test]
    fn test_histogram_reset() {
        let h = LatencyHistogram::new(16);
        h.record(100);
        h.reset();
        assert_eq!(h.percentiles(), LatencyPercentiles::default());
    }

    #[rstest]
    #[case(0, 50, 0)]
    #[case(1, 50, 0)]
    #[case(1, 99, 0)]
    #[case(100, 50, 49)]
    #[case(100, 95, 94)]
    #[case(100, 99, 98)]
    fn test_percentile_index(#[case] len: usize, #[case] percentile: u32, #[case] expected: usize) {
        assert_eq!(percentile_index(len, percentile), expected);
    }

    // ── Metrics ─────────────────────────────────────────────────────────

    #[test]
    fn test_each_operation_is_tracked_separately() {
        let metrics = Metrics::new();

        for (i, op) in Operation::ALL.iter().enumerate() {
            metrics.record(*op, Duration::from_micros(100 * (i as u64 + 1)));
        }

        let snapshot = metrics.snapshot();
        for (i, op) in Operation::ALL.iter().enumerate() {
            let stats = snapshot.operation(*op);
            assert_eq!(stats.count, 1, "{op}");
            assert_eq!(stats.percentiles.p50, 100 * (i as u64 + 1), "{op}");
        }
        assert_eq!(snapshot.total_operations(), Operation::ALL.len() as u64);
        assert_eq!(snapshot.write_operations(), 4);
    }

    #[test]
    fn test_average_latency() {
        let metrics = Metrics::new();
        metrics.record(Operation::Add, Duration::from_micros(100));
        metrics.record(Operation::Add, Duration::from_micros(300));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.add.avg_latency_us(), 200.0);
        assert_eq!(snapshot.remove.avg_latency_us(), 0.0);
    }

    #[test]
    fn test_error_rate() {
        let metrics = Metrics::new();
        for _ in 0..10 {
            metrics.record(Operation::Score, Duration::from_micros(10));
        }
        metrics.record_error();
        metrics.record_timeout();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.error_count, 2);
        assert_eq!(snapshot.timeout_count, 1);
        assert!((snapshot.error_rate() - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_operations_error_rate() {
        assert_eq!(MetricsSnapshot::default().error_rate(), 0.0);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record(Operation::Range, Duration::from_micros(100));
        metrics.record_error();
        metrics.record_health_check();
        metrics.reset();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_operations(), 0);
        assert_eq!(snapshot.error_count, 0);
        assert_eq!(snapshot.health_check_count, 0);
        assert_eq!(snapshot.range.percentiles, LatencyPercentiles::default());
    }

    #[test]
    fn test_clone_shares_counters() {
        let metrics = Metrics::new();
        let cloned = metrics.clone();
        cloned.record(Operation::Add, Duration::from_micros(1));

        assert_eq!(metrics.snapshot().add.count, 1);
    }

    #[test]
    fn test_snapshot_builder() {
        let snapshot = MetricsSnapshot::builder()
            .add(OperationSnapshot { count: 10, ..OperationSnapshot::default() })
            .error_count(2)
            .build();

        assert_eq!(snapshot.total_operations(), 10);
        assert_eq!(snapshot.error_count, 2);
    }

    #[test]
    fn test_log_metrics_does_not_panic() {
        let metrics = Metrics::new();
        metrics.log_metrics();

        for _ in 0..10 {
            metrics.record(Operation::Add, Duration::from_micros(100));
        }
        metrics.record_error();
        metrics.log_metrics();
    }
}
