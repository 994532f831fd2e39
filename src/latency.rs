//! Latency summarization over HDR histogram snapshots.
//!
//! A summary is the fixed 5-tuple (min, median, 75th, 95th, 99th percentile)
//! extracted from a histogram and scaled to the configured display unit.
//! Samples are recorded in the configured native unit: milliseconds when the
//! millisecond flag is set, nanoseconds otherwise. Scaling leaves millisecond
//! samples untouched and truncates nanosecond samples down to microseconds,
//! so the displayed unit is always `ms` or `µs`.

use hdrhistogram::Histogram;
use std::fmt;

/// Display label for the millisecond unit.
pub const UNIT_MS: &str = "ms";
/// Display label for the microsecond unit.
pub const UNIT_US: &str = "µs";

/// Fixed ordered percentile summary of a latency distribution.
///
/// Elements are non-decreasing for any valid histogram snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySummary {
    pub min: u64,
    pub median: u64,
    pub p75: u64,
    pub p95: u64,
    pub p99: u64,
    use_millis: bool,
}

impl LatencySummary {
    /// The summary values in display order.
    pub fn values(&self) -> [u64; 5] {
        [self.min, self.median, self.p75, self.p95, self.p99]
    }

    /// Unit label matching the scaling applied to the values.
    pub fn unit(&self) -> &'static str {
        unit_label(self.use_millis)
    }
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{} {}",
            self.min,
            self.median,
            self.p75,
            self.p95,
            self.p99,
            self.unit()
        )
    }
}

/// Unit label for the configured display unit.
pub fn unit_label(use_millis: bool) -> &'static str {
    if use_millis {
        UNIT_MS
    } else {
        UNIT_US
    }
}

/// Scale a raw histogram value to the display unit.
///
/// Millisecond-native samples pass through; nanosecond-native samples are
/// truncated down to microseconds.
pub fn scale(value: u64, use_millis: bool) -> u64 {
    if use_millis {
        value
    } else {
        value / 1000
    }
}

/// Extract the (min, median, p75, p95, p99) summary from a histogram snapshot,
/// each element independently scaled to the display unit.
pub fn summarize(histogram: &Histogram<u64>, use_millis: bool) -> LatencySummary {
    LatencySummary {
        min: scale(histogram.min(), use_millis),
        median: scale(histogram.value_at_quantile(0.50), use_millis),
        p75: scale(histogram.value_at_quantile(0.75), use_millis),
        p95: scale(histogram.value_at_quantile(0.95), use_millis),
        p99: scale(histogram.value_at_quantile(0.99), use_millis),
        use_millis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram_with(values: &[u64]) -> Histogram<u64> {
        let mut h = Histogram::<u64>::new(3).unwrap();
        for &v in values {
            h.record(v).unwrap();
        }
        h
    }

    #[test]
    fn scale_truncates_nanos_to_micros() {
        assert_eq!(scale(1999, false), 1);
        assert_eq!(scale(2000, false), 2);
        assert_eq!(scale(999, false), 0);
        assert_eq!(scale(1999, true), 1999);
    }

    #[test]
    fn summary_is_non_decreasing() {
        let h = histogram_with(&[1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000]);
        let s = summarize(&h, false);
        let v = s.values();
        for w in v.windows(2) {
            assert!(w[0] <= w[1], "summary not ordered: {:?}", v);
        }
    }

    #[test]
    fn summary_display_uses_configured_unit() {
        let h = histogram_with(&[2_000_000]);
        let micros = summarize(&h, false);
        assert_eq!(micros.unit(), "µs");
        assert!(micros.to_string().ends_with(" µs"));

        let h = histogram_with(&[25]);
        let millis = summarize(&h, true);
        assert_eq!(millis.unit(), "ms");
        assert_eq!(millis.to_string(), "25/25/25/25/25 ms");
    }

    #[test]
    fn empty_histogram_summarizes_to_zero() {
        let h = Histogram::<u64>::new(3).unwrap();
        let s = summarize(&h, false);
        assert_eq!(s.values(), [0, 0, 0, 0, 0]);
    }
}
