//! # mq-throughput
//!
//! A statistics reporting engine for a message-throughput load-generation
//! tool. Concurrent producer/consumer workers feed counters and latency
//! histograms through a small metrics contract; a periodic scheduler ticks
//! the reporting engine, which converts the accumulated interval counts into
//! per-second rates and percentile summaries, prints one console line per
//! interval, optionally appends a row to a CSV file, and produces a single
//! authoritative end-of-run summary that never races with in-flight interval
//! reports.
//!
//! ## Architecture Overview
//!
//! The library is organized into several key modules:
//!
//! - `metrics`: the worker-facing contract ([`PerformanceMetrics`]) and the
//!   lock-free counter/histogram source ([`MetricsCollector`])
//! - `rate`: count-over-elapsed rate conversion and magnitude-dependent
//!   rate formatting
//! - `latency`: min/median/p75/p95/p99 summaries over HDR histogram
//!   snapshots with unit-dependent scaling
//! - `report`: console line and CSV record rendering, plus the
//!   finalization guard that makes the terminal summary exclusive
//! - `engine`: the orchestrator the external scheduler ticks
//! - `cli`: command-line parsing and run configuration
//! - `logging`: colorized tracing output for the driver
//!
//! ## Concurrency Model
//!
//! Workers increment atomic counter cells and record histogram samples
//! without coordinating with the reporting thread; snapshot reads are
//! eventually consistent by design. The finalize signal may arrive from a
//! different thread than the scheduler: a single compare-and-set flag
//! guarantees the terminal summary is produced exactly once and that no
//! interval output follows it.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use mq_throughput::{
//!     EnabledCategories, ConsoleReporter, MetricsCollector,
//!     PerformanceMetrics, ReportingEngine,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! fn main() -> anyhow::Result<()> {
//!     let collector = Arc::new(MetricsCollector::new(Duration::from_secs(1))?);
//!     let reporter = ConsoleReporter::new("test-1", EnabledCategories::default(), None);
//!     let engine = ReportingEngine::new(collector.clone(), reporter);
//!
//!     collector.start();
//!     collector.published();
//!     collector.received(1_500_000); // 1.5 ms, recorded in nanoseconds
//!
//!     engine.tick();     // one interval line
//!     engine.finalize(); // the terminal summary, exactly once
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod engine;
pub mod latency;
pub mod logging;
pub mod metrics;
pub mod rate;
pub mod report;

pub use cli::{Args, RunConfiguration};
pub use engine::ReportingEngine;
pub use latency::LatencySummary;
pub use metrics::{
    CumulativeSnapshot, IntervalSnapshot, MetricsCollector, NoOpMetrics, PerformanceMetrics,
};
pub use report::{ConsoleReporter, EnabledCategories};

/// The current version of the crate, used in `--version` output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values.
pub mod defaults {
    use std::time::Duration;

    /// Default reporting interval.
    ///
    /// One second keeps console output readable while remaining fine-grained
    /// enough to spot rate dips during a run.
    pub const INTERVAL: Duration = Duration::from_secs(1);

    /// Default run duration for the driver binary.
    pub const DURATION: Duration = Duration::from_secs(10);

    /// Default synthetic workload pace in messages per second.
    pub const PUBLISH_RATE: f64 = 100.0;
}
