//! Reporting engine orchestration.
//!
//! The engine is purely reactive: an external scheduler calls [`ReportingEngine::tick`]
//! on a fixed cadence and some driver (the scheduler itself, a shutdown
//! handler, possibly a different thread) calls [`ReportingEngine::finalize`]
//! once at end of run. Each tick takes an interval snapshot from the
//! collector, which resets the interval counters, and hands it to the
//! reporter; finalization reads the run-lifetime totals and global histograms
//! instead. The reporter's finalization guard makes the two paths mutually
//! exclusive in outcome, so a tick racing the finalize signal produces output
//! from at most one of them.

use crate::metrics::MetricsCollector;
use crate::report::ConsoleReporter;
use std::sync::Arc;
use tracing::debug;

/// Drives the reporting pipeline: collector snapshot, rate and latency
/// computation, console/CSV rendering.
pub struct ReportingEngine {
    collector: Arc<MetricsCollector>,
    reporter: ConsoleReporter,
}

impl ReportingEngine {
    pub fn new(collector: Arc<MetricsCollector>, reporter: ConsoleReporter) -> Self {
        Self {
            collector,
            reporter,
        }
    }

    /// The counter source workers feed.
    pub fn collector(&self) -> &Arc<MetricsCollector> {
        &self.collector
    }

    /// Whether the terminal summary has started or completed.
    pub fn is_finalized(&self) -> bool {
        self.reporter.is_finalized()
    }

    /// Produce one interval report.
    ///
    /// Called by the external scheduler. Ticks arriving once finalization has
    /// begun are silent; the snapshot is not even taken, so a late tick does
    /// not clear counters behind the terminal summary.
    pub fn tick(&self) {
        if self.reporter.is_finalized() {
            debug!("interval tick after finalization, suppressed");
            return;
        }
        let snapshot = self.collector.take_interval();
        self.reporter.report_interval(&snapshot);
    }

    /// Produce the terminal summary.
    ///
    /// Safe to call from a different thread than the scheduler and safe to
    /// call more than once; only the first call produces output.
    pub fn finalize(&self) {
        let cumulative = self.collector.cumulative();
        let (consumer_global, confirm_global) = self.collector.global_histograms();
        self.reporter
            .print_final(&cumulative, &consumer_global, &confirm_global);
    }
}
