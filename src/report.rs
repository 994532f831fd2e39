//! Interval and terminal report rendering.
//!
//! [`ConsoleReporter`] turns interval snapshots into a human-readable console
//! line and an optional CSV record, and produces the single end-of-run
//! summary. A compare-and-set flag guarantees the terminal summary is printed
//! exactly once and that no interval output (console or CSV) follows it or
//! interleaves with it.
//!
//! Reporting never fails the run it is measuring: sink write errors are
//! logged and swallowed, and the next tick proceeds normally.

use crate::latency::{self, unit_label, LatencySummary};
use crate::metrics::{CumulativeSnapshot, IntervalSnapshot};
use crate::rate::{conditional_rate, format_rate, rate};
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

const LATENCY_HEADER: &str = "min/median/75th/95th/99th";
const MESSAGE_RATE_LABEL: &str = "msg/s";

/// Which measurement categories are enabled, fixed at construction.
///
/// Disabled categories are neither computed nor displayed; their CSV columns
/// stay present but empty so the record shape is constant for a given
/// configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnabledCategories {
    pub send: bool,
    pub receive: bool,
    pub returns: bool,
    pub confirms: bool,
    pub legacy_metrics: bool,
    pub use_millis: bool,
}

impl EnabledCategories {
    /// Consumer latency is displayed iff the receive category is enabled.
    pub fn display_consumer_latency(&self) -> bool {
        self.receive
    }

    /// Confirm latency is displayed iff both send and confirm are enabled.
    pub fn display_confirm_latency(&self) -> bool {
        self.send && self.confirms
    }
}

impl Default for EnabledCategories {
    fn default() -> Self {
        Self {
            send: true,
            receive: true,
            returns: false,
            confirms: false,
            legacy_metrics: false,
            use_millis: false,
        }
    }
}

/// Per-category rates computed for one interval. Disabled categories stay 0.
#[derive(Debug, Clone, Copy, Default)]
struct IntervalRates {
    published: f64,
    returned: f64,
    confirmed: f64,
    nacked: f64,
    received: f64,
}

/// Writes interval reports and the terminal summary to the console and an
/// optional CSV sink.
pub struct ConsoleReporter {
    test_id: String,
    categories: EnabledCategories,
    units: &'static str,
    console: Mutex<Box<dyn Write + Send>>,
    csv: Option<Mutex<Box<dyn Write + Send>>>,
    // Single false -> true transition; set by the terminal summary winner.
    finalized: AtomicBool,
}

impl ConsoleReporter {
    /// Create a reporter writing to stdout, with an optional CSV sink.
    ///
    /// When a CSV sink is present the header row is written immediately.
    pub fn new(
        test_id: impl Into<String>,
        categories: EnabledCategories,
        csv: Option<Box<dyn Write + Send>>,
    ) -> Self {
        Self::with_console(test_id, categories, Box::new(std::io::stdout()), csv)
    }

    /// Create a reporter with an injected console sink, used by tests to
    /// capture output.
    pub fn with_console(
        test_id: impl Into<String>,
        categories: EnabledCategories,
        console: Box<dyn Write + Send>,
        csv: Option<Box<dyn Write + Send>>,
    ) -> Self {
        let reporter = Self {
            test_id: test_id.into(),
            categories,
            units: unit_label(categories.use_millis),
            console: Mutex::new(console),
            csv: csv.map(Mutex::new),
            finalized: AtomicBool::new(false),
        };
        reporter.write_csv_header();
        reporter
    }

    /// Whether the terminal summary has started or completed.
    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::Acquire)
    }

    /// Render and emit one interval report.
    ///
    /// Produces no output at all once finalization has begun; the flag is
    /// consulted independently before the console write and the CSV write.
    pub fn report_interval(&self, snapshot: &IntervalSnapshot) {
        if self.is_finalized() {
            return;
        }

        let rates = self.compute_rates(snapshot);
        let consumer_summary = if self.categories.display_consumer_latency() {
            Some(latency::summarize(
                &snapshot.consumer_latency,
                self.categories.use_millis,
            ))
        } else {
            None
        };
        let confirm_summary = if self.categories.display_confirm_latency() {
            Some(latency::summarize(
                &snapshot.confirm_latency,
                self.categories.use_millis,
            ))
        } else {
            None
        };

        let line = self.format_interval_line(snapshot, &rates, consumer_summary, confirm_summary);
        if !self.is_finalized() {
            let mut console = self.console.lock();
            if let Err(e) = writeln!(console, "{}", line) {
                warn!("console write failed, skipping interval line: {}", e);
            }
        }

        self.write_csv_row(snapshot, &rates, consumer_summary, confirm_summary);
    }

    /// Emit the terminal summary exactly once.
    ///
    /// Only the caller that wins the false -> true transition produces
    /// output; later callers and concurrent interval ticks stay silent.
    /// A zero cumulative elapsed time emits nothing, average-send-rate line
    /// included, so no division by zero can occur.
    pub fn print_final(
        &self,
        cumulative: &CumulativeSnapshot,
        consumer_global: &Histogram<u64>,
        confirm_global: &Histogram<u64>,
    ) {
        if self
            .finalized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let elapsed_ms = cumulative.elapsed.as_millis() as u64;
        if elapsed_ms == 0 {
            return;
        }

        let mut summary = format!(
            "id: {}, sending rate avg: {} {}\n",
            self.test_id,
            format_rate(rate(cumulative.published_total, elapsed_ms)),
            MESSAGE_RATE_LABEL
        );
        summary.push_str(&format!(
            "id: {}, receiving rate avg: {} {}\n",
            self.test_id,
            format_rate(rate(cumulative.received_total, elapsed_ms)),
            MESSAGE_RATE_LABEL
        ));
        if self.categories.display_consumer_latency() {
            summary.push_str(&format!(
                "id: {}, consumer latency {} {}\n",
                self.test_id,
                LATENCY_HEADER,
                latency::summarize(consumer_global, self.categories.use_millis)
            ));
        }
        if self.categories.display_confirm_latency() {
            summary.push_str(&format!(
                "id: {}, confirm latency {} {}\n",
                self.test_id,
                LATENCY_HEADER,
                latency::summarize(confirm_global, self.categories.use_millis)
            ));
        }

        let mut console = self.console.lock();
        if let Err(e) = write!(console, "{}", summary) {
            warn!("console write failed for terminal summary: {}", e);
        }
    }

    fn compute_rates(&self, snapshot: &IntervalSnapshot) -> IntervalRates {
        // Sub-millisecond ticks round up so the division stays defined.
        let elapsed_ms = (snapshot.elapsed.as_millis() as u64).max(1);
        let c = &self.categories;
        IntervalRates {
            published: if c.send {
                rate(snapshot.published, elapsed_ms)
            } else {
                0.0
            },
            returned: if c.send && c.returns {
                rate(snapshot.returned, elapsed_ms)
            } else {
                0.0
            },
            confirmed: if c.send && c.confirms {
                rate(snapshot.confirmed, elapsed_ms)
            } else {
                0.0
            },
            nacked: if c.send && c.confirms {
                rate(snapshot.nacked, elapsed_ms)
            } else {
                0.0
            },
            received: if c.receive {
                rate(snapshot.received, elapsed_ms)
            } else {
                0.0
            },
        }
    }

    fn format_interval_line(
        &self,
        snapshot: &IntervalSnapshot,
        rates: &IntervalRates,
        consumer_summary: Option<LatencySummary>,
        confirm_summary: Option<LatencySummary>,
    ) -> String {
        let c = &self.categories;
        let mut line = format!(
            "id: {}, time: {:.3}s",
            self.test_id,
            snapshot.total_elapsed.as_secs_f64()
        );

        let clauses = [
            ("sent", rates.published, c.send),
            ("returned", rates.returned, c.send && c.returns),
            ("confirmed", rates.confirmed, c.send && c.confirms),
            ("nacked", rates.nacked, c.send && c.confirms),
            ("received", rates.received, c.receive),
        ];
        for (label, value, enabled) in clauses {
            if enabled {
                line.push_str(&format!(
                    ", {}: {} {}",
                    label,
                    format_rate(value),
                    MESSAGE_RATE_LABEL
                ));
            }
        }

        if c.legacy_metrics && snapshot.legacy.count > 0 {
            // Legacy clause is always reported in microseconds.
            line.push_str(&format!(
                ", min/avg/max latency: {}/{}/{} µs",
                snapshot.legacy.min / 1000,
                snapshot.legacy.avg() / 1000,
                snapshot.legacy.max / 1000
            ));
        } else {
            if consumer_summary.is_some() || confirm_summary.is_some() {
                line.push_str(&format!(", {} ", LATENCY_HEADER));
            }
            if let Some(summary) = consumer_summary {
                line.push_str(&format!("consumer latency: {}", summary));
            }
            if consumer_summary.is_some() && confirm_summary.is_some() {
                line.push_str(", ");
            }
            if let Some(summary) = confirm_summary {
                line.push_str(&format!("confirm latency: {}", summary));
            }
        }

        line
    }

    fn write_csv_header(&self) {
        let csv = match &self.csv {
            Some(csv) => csv,
            None => return,
        };
        let u = self.units;
        let header = format!(
            "id,time (s),published (msg/s),returned (msg/s),\
             confirmed (msg/s),nacked (msg/s),received (msg/s),\
             min consumer latency ({u}),median consumer latency ({u}),\
             75th p. consumer latency ({u}),95th p. consumer latency ({u}),\
             99th p. consumer latency ({u}),min confirm latency ({u}),\
             median confirm latency ({u}),75th p. confirm latency ({u}),\
             95th p. confirm latency ({u}),99th p. confirm latency ({u})",
            u = u
        );
        let mut sink = csv.lock();
        if let Err(e) = writeln!(sink, "{}", header) {
            warn!("csv write failed for header row: {}", e);
        }
    }

    fn write_csv_row(
        &self,
        snapshot: &IntervalSnapshot,
        rates: &IntervalRates,
        consumer_summary: Option<LatencySummary>,
        confirm_summary: Option<LatencySummary>,
    ) {
        let csv = match &self.csv {
            Some(csv) => csv,
            None => return,
        };
        if self.is_finalized() {
            return;
        }

        let c = &self.categories;
        let mut fields: Vec<String> = Vec::with_capacity(17);
        fields.push(self.test_id.clone());
        fields.push(format!("{:.3}", snapshot.total_elapsed.as_secs_f64()));
        fields.push(conditional_rate(rates.published, c.send));
        fields.push(conditional_rate(rates.returned, c.send && c.returns));
        fields.push(conditional_rate(rates.confirmed, c.send && c.confirms));
        fields.push(conditional_rate(rates.nacked, c.send && c.confirms));
        fields.push(conditional_rate(rates.received, c.receive));
        for summary in [consumer_summary, confirm_summary] {
            match summary {
                Some(summary) => {
                    fields.extend(summary.values().iter().map(|v| v.to_string()));
                }
                // Placeholder fields keep the column count constant.
                None => fields.extend(std::iter::repeat(String::new()).take(5)),
            }
        }

        let mut sink = csv.lock();
        if let Err(e) = writeln!(sink, "{}", fields.join(",")) {
            warn!("csv write failed, skipping interval row: {}", e);
        }
    }
}
