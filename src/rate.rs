//! Rate calculation and display formatting.
//!
//! Converts raw event counts over an elapsed interval into events-per-second
//! rates and formats them with magnitude-dependent precision: high rates are
//! shown as whole numbers to avoid noisy sub-integer digits, while low rates
//! keep enough decimals to stay meaningful.

/// Milliseconds per second, used to convert per-millisecond counts to per-second rates.
const MS_TO_SECOND: f64 = 1000.0;

/// Convert an event count over an elapsed interval into an events-per-second rate.
///
/// The scheduler contract guarantees `elapsed_ms > 0` for interval ticks;
/// the terminal-summary path checks elapsed time explicitly before calling this.
pub fn rate(count: u64, elapsed_ms: u64) -> f64 {
    MS_TO_SECOND * count as f64 / elapsed_ms as f64
}

/// Format a rate with magnitude-dependent precision.
///
/// - `0` exactly when the rate is zero
/// - two decimals below 1 (e.g. `0.50`)
/// - one decimal below 10 (e.g. `5.0`)
/// - truncated integer otherwise (e.g. `15`)
pub fn format_rate(rate: f64) -> String {
    if rate == 0.0 {
        format!("{}", rate as u64)
    } else if rate < 1.0 {
        format!("{:.2}", rate)
    } else if rate < 10.0 {
        format!("{:.1}", rate)
    } else {
        format!("{}", rate as u64)
    }
}

/// Format a rate when its category is enabled, otherwise return an empty string.
///
/// Used to build both console clauses and CSV fields uniformly: a disabled
/// category contributes an empty field, never an omitted one.
pub fn conditional_rate(rate: f64, enabled: bool) -> String {
    if enabled {
        format_rate(rate)
    } else {
        String::new()
    }
}
