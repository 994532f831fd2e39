//! Metrics contract and the concurrent counter/histogram source.
//!
//! Producer and consumer workers record activity through the
//! [`PerformanceMetrics`] trait without coordinating with the reporting
//! thread. The [`MetricsCollector`] implementation keeps per-interval and
//! run-lifetime counters in atomic cells and latency distributions in HDR
//! histograms, and hands the reporting engine consistent-enough snapshots:
//! a report may observe a count that is being concurrently incremented,
//! which is accepted imprecision rather than a correctness bug.
//!
//! Latency samples are recorded in the configured native unit: milliseconds
//! when millisecond display is selected, nanoseconds otherwise.

use anyhow::Result;
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Significant figures kept by every latency histogram.
const HISTOGRAM_SIGFIG: u8 = 3;

/// Contract workers call to record activity during a run.
///
/// `interval` tells the external scheduler how often to tick the reporting
/// engine; `reset_globals` clears run-lifetime aggregates between repeated
/// benchmark phases.
pub trait PerformanceMetrics: Send + Sync {
    /// Mark the beginning of measured time.
    fn start(&self);

    /// Record one published message.
    fn published(&self);

    /// Record `count` confirmed messages and their publish-to-confirm latencies.
    fn confirmed(&self, count: u64, latencies: &[u64]);

    /// Record `count` negatively-acknowledged messages.
    fn nacked(&self, count: u64);

    /// Record one returned message.
    fn returned(&self);

    /// Record one received message and its end-to-end latency.
    fn received(&self, latency: u64);

    /// Reporting cadence the scheduler should tick at.
    fn interval(&self) -> Duration;

    /// Clear run-lifetime aggregates (totals, global histograms, global start).
    fn reset_globals(&self);
}

/// No-op implementation for contexts where reporting is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpMetrics;

impl PerformanceMetrics for NoOpMetrics {
    fn start(&self) {}
    fn published(&self) {}
    fn confirmed(&self, _count: u64, _latencies: &[u64]) {}
    fn nacked(&self, _count: u64) {}
    fn returned(&self) {}
    fn received(&self, _latency: u64) {}
    fn interval(&self) -> Duration {
        Duration::ZERO
    }
    fn reset_globals(&self) {}
}

/// Legacy min/avg/max accounting for one interval, fed by both consumer and
/// confirm latency samples.
#[derive(Debug, Clone, Copy)]
pub struct LegacyLatency {
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub sum: u64,
}

impl LegacyLatency {
    /// Mean sample value; zero when the interval saw no samples.
    pub fn avg(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.sum / self.count
        }
    }
}

/// Everything the reporting engine needs to render one interval tick.
///
/// Taking a snapshot resets the interval counters and histograms inside the
/// collector; the engine never mutates them itself.
#[derive(Debug)]
pub struct IntervalSnapshot {
    /// Time covered by this interval (since the previous tick).
    pub elapsed: Duration,
    /// Time since measured start, for the `time:` column.
    pub total_elapsed: Duration,
    pub published: u64,
    pub returned: u64,
    pub confirmed: u64,
    pub nacked: u64,
    pub received: u64,
    pub consumer_latency: Histogram<u64>,
    pub confirm_latency: Histogram<u64>,
    pub legacy: LegacyLatency,
}

/// Run-lifetime totals for the terminal summary.
#[derive(Debug, Clone, Copy)]
pub struct CumulativeSnapshot {
    /// Time since the global start (or the last `reset_globals`).
    pub elapsed: Duration,
    pub published_total: u64,
    pub received_total: u64,
}

/// Measured-time bookkeeping, guarded together so an interval snapshot sees
/// a coherent (start, last tick) pair.
struct Timeline {
    start: Instant,
    last_tick: Instant,
    global_start: Instant,
}

/// Counter and histogram source shared between workers and the reporting engine.
///
/// Workers increment atomic cells and record histogram samples; the engine
/// only reads snapshots, preserving single-writer-per-cell discipline.
pub struct MetricsCollector {
    interval: Duration,

    timeline: Mutex<Timeline>,

    published_interval: AtomicU64,
    returned_interval: AtomicU64,
    confirmed_interval: AtomicU64,
    nacked_interval: AtomicU64,
    received_interval: AtomicU64,

    published_total: AtomicU64,
    received_total: AtomicU64,

    legacy_count: AtomicU64,
    legacy_min: AtomicU64,
    legacy_max: AtomicU64,
    legacy_sum: AtomicU64,

    consumer_interval: Mutex<Histogram<u64>>,
    confirm_interval: Mutex<Histogram<u64>>,
    consumer_global: Mutex<Histogram<u64>>,
    confirm_global: Mutex<Histogram<u64>>,
}

impl MetricsCollector {
    /// Create a collector reporting at the given cadence.
    pub fn new(interval: Duration) -> Result<Self> {
        let now = Instant::now();
        Ok(Self {
            interval,
            timeline: Mutex::new(Timeline {
                start: now,
                last_tick: now,
                global_start: now,
            }),
            published_interval: AtomicU64::new(0),
            returned_interval: AtomicU64::new(0),
            confirmed_interval: AtomicU64::new(0),
            nacked_interval: AtomicU64::new(0),
            received_interval: AtomicU64::new(0),
            published_total: AtomicU64::new(0),
            received_total: AtomicU64::new(0),
            legacy_count: AtomicU64::new(0),
            legacy_min: AtomicU64::new(u64::MAX),
            legacy_max: AtomicU64::new(0),
            legacy_sum: AtomicU64::new(0),
            consumer_interval: Mutex::new(Histogram::new(HISTOGRAM_SIGFIG)?),
            confirm_interval: Mutex::new(Histogram::new(HISTOGRAM_SIGFIG)?),
            consumer_global: Mutex::new(Histogram::new(HISTOGRAM_SIGFIG)?),
            confirm_global: Mutex::new(Histogram::new(HISTOGRAM_SIGFIG)?),
        })
    }

    /// Read and reset the interval counters and histograms.
    ///
    /// Called by the reporting engine once per scheduler tick. The interval
    /// elapsed time is measured here, so ticks are always non-zero duration.
    pub fn take_interval(&self) -> IntervalSnapshot {
        let (elapsed, total_elapsed) = {
            let mut timeline = self.timeline.lock();
            let now = Instant::now();
            let elapsed = now.duration_since(timeline.last_tick);
            let total = now.duration_since(timeline.start);
            timeline.last_tick = now;
            (elapsed, total)
        };

        let count = self.legacy_count.swap(0, Ordering::Relaxed);
        let min = self.legacy_min.swap(u64::MAX, Ordering::Relaxed);
        let legacy = LegacyLatency {
            count,
            min: if count == 0 { 0 } else { min },
            max: self.legacy_max.swap(0, Ordering::Relaxed),
            sum: self.legacy_sum.swap(0, Ordering::Relaxed),
        };

        IntervalSnapshot {
            elapsed,
            total_elapsed,
            published: self.published_interval.swap(0, Ordering::Relaxed),
            returned: self.returned_interval.swap(0, Ordering::Relaxed),
            confirmed: self.confirmed_interval.swap(0, Ordering::Relaxed),
            nacked: self.nacked_interval.swap(0, Ordering::Relaxed),
            received: self.received_interval.swap(0, Ordering::Relaxed),
            consumer_latency: Self::drain_histogram(&self.consumer_interval),
            confirm_latency: Self::drain_histogram(&self.confirm_interval),
            legacy,
        }
    }

    /// Run-lifetime totals, read once at finalization.
    pub fn cumulative(&self) -> CumulativeSnapshot {
        let elapsed = self.timeline.lock().global_start.elapsed();
        CumulativeSnapshot {
            elapsed,
            published_total: self.published_total.load(Ordering::Relaxed),
            received_total: self.received_total.load(Ordering::Relaxed),
        }
    }

    /// Snapshots of the run-lifetime latency histograms (consumer, confirm).
    pub fn global_histograms(&self) -> (Histogram<u64>, Histogram<u64>) {
        (
            self.consumer_global.lock().clone(),
            self.confirm_global.lock().clone(),
        )
    }

    fn drain_histogram(histogram: &Mutex<Histogram<u64>>) -> Histogram<u64> {
        let mut guard = histogram.lock();
        let snapshot = guard.clone();
        guard.reset();
        snapshot
    }

    fn record_legacy(&self, latency: u64) {
        self.legacy_count.fetch_add(1, Ordering::Relaxed);
        self.legacy_sum.fetch_add(latency, Ordering::Relaxed);
        self.legacy_min.fetch_min(latency, Ordering::Relaxed);
        self.legacy_max.fetch_max(latency, Ordering::Relaxed);
    }
}

impl PerformanceMetrics for MetricsCollector {
    fn start(&self) {
        let mut timeline = self.timeline.lock();
        let now = Instant::now();
        timeline.start = now;
        timeline.last_tick = now;
        timeline.global_start = now;
    }

    fn published(&self) {
        self.published_interval.fetch_add(1, Ordering::Relaxed);
        self.published_total.fetch_add(1, Ordering::Relaxed);
    }

    fn confirmed(&self, count: u64, latencies: &[u64]) {
        self.confirmed_interval.fetch_add(count, Ordering::Relaxed);
        if !latencies.is_empty() {
            let mut interval = self.confirm_interval.lock();
            let mut global = self.confirm_global.lock();
            for &latency in latencies {
                interval.saturating_record(latency);
                global.saturating_record(latency);
            }
        }
        for &latency in latencies {
            self.record_legacy(latency);
        }
    }

    fn nacked(&self, count: u64) {
        self.nacked_interval.fetch_add(count, Ordering::Relaxed);
    }

    fn returned(&self) {
        self.returned_interval.fetch_add(1, Ordering::Relaxed);
    }

    fn received(&self, latency: u64) {
        self.received_interval.fetch_add(1, Ordering::Relaxed);
        self.received_total.fetch_add(1, Ordering::Relaxed);
        self.consumer_interval.lock().saturating_record(latency);
        self.consumer_global.lock().saturating_record(latency);
        self.record_legacy(latency);
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn reset_globals(&self) {
        self.timeline.lock().global_start = Instant::now();
        self.published_total.store(0, Ordering::Relaxed);
        self.received_total.store(0, Ordering::Relaxed);
        self.consumer_global.lock().reset();
        self.confirm_global.lock().reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_interval_resets_counters() {
        let collector = MetricsCollector::new(Duration::from_secs(1)).unwrap();
        collector.published();
        collector.published();
        collector.returned();
        collector.confirmed(2, &[1_000, 2_000]);
        collector.nacked(1);
        collector.received(5_000);

        let snapshot = collector.take_interval();
        assert_eq!(snapshot.published, 2);
        assert_eq!(snapshot.returned, 1);
        assert_eq!(snapshot.confirmed, 2);
        assert_eq!(snapshot.nacked, 1);
        assert_eq!(snapshot.received, 1);
        assert_eq!(snapshot.consumer_latency.len(), 1);
        assert_eq!(snapshot.confirm_latency.len(), 2);
        assert_eq!(snapshot.legacy.count, 3);
        assert_eq!(snapshot.legacy.min, 1_000);
        assert_eq!(snapshot.legacy.max, 5_000);

        let next = collector.take_interval();
        assert_eq!(next.published, 0);
        assert_eq!(next.received, 0);
        assert_eq!(next.consumer_latency.len(), 0);
        assert_eq!(next.legacy.count, 0);
        assert_eq!(next.legacy.min, 0);
    }

    #[test]
    fn totals_survive_interval_resets() {
        let collector = MetricsCollector::new(Duration::from_secs(1)).unwrap();
        for _ in 0..5 {
            collector.published();
        }
        collector.received(100);
        let _ = collector.take_interval();
        collector.published();

        let cumulative = collector.cumulative();
        assert_eq!(cumulative.published_total, 6);
        assert_eq!(cumulative.received_total, 1);
    }

    #[test]
    fn global_histograms_accumulate_across_intervals() {
        let collector = MetricsCollector::new(Duration::from_secs(1)).unwrap();
        collector.received(1_000);
        let _ = collector.take_interval();
        collector.received(2_000);

        let (consumer, _confirm) = collector.global_histograms();
        assert_eq!(consumer.len(), 2);
    }

    #[test]
    fn reset_globals_clears_lifetime_aggregates() {
        let collector = MetricsCollector::new(Duration::from_secs(1)).unwrap();
        collector.published();
        collector.received(1_000);
        collector.reset_globals();

        let cumulative = collector.cumulative();
        assert_eq!(cumulative.published_total, 0);
        assert_eq!(cumulative.received_total, 0);
        let (consumer, confirm) = collector.global_histograms();
        assert_eq!(consumer.len(), 0);
        assert_eq!(confirm.len(), 0);
    }

    #[test]
    fn legacy_avg_is_zero_without_samples() {
        let legacy = LegacyLatency {
            count: 0,
            min: 0,
            max: 0,
            sum: 0,
        };
        assert_eq!(legacy.avg(), 0);
    }

    #[test]
    fn no_op_metrics_reports_zero_interval() {
        let metrics = NoOpMetrics;
        metrics.published();
        metrics.received(42);
        assert_eq!(metrics.interval(), Duration::ZERO);
    }
}
