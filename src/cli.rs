//! Command-line interface and run configuration.
//!
//! Parses user-friendly CLI options with clap and converts them into the
//! internal [`RunConfiguration`] consumed by the driver: a test identifier,
//! the reporting cadence, the enabled measurement categories, the display
//! unit, and the optional CSV sink path.

use crate::report::EnabledCategories;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Message-throughput load statistics reporter
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Test identifier used in every console line and CSV row
    #[clap(long)]
    pub id: Option<String>,

    /// Reporting interval (e.g. "1s", "500ms")
    #[clap(short = 'i', long, value_parser = parse_duration, default_value = "1s")]
    pub interval: Duration,

    /// Duration to run before finalizing (e.g. "10s", "5m")
    #[clap(short = 'd', long, value_parser = parse_duration, default_value = "10s")]
    pub duration: Duration,

    /// CSV output file; omit to disable CSV output entirely
    #[clap(long)]
    pub csv: Option<PathBuf>,

    /// Report send (publish) statistics
    #[clap(long, default_value_t = true)]
    pub send_stats: bool,

    /// Report receive (consume) statistics
    #[clap(long, default_value_t = true)]
    pub recv_stats: bool,

    /// Report returned-message statistics
    #[clap(long, default_value_t = false)]
    pub return_stats: bool,

    /// Report confirm/nack statistics
    #[clap(long, default_value_t = false)]
    pub confirm_stats: bool,

    /// Use the single combined min/avg/max latency clause instead of percentiles
    #[clap(long, default_value_t = false)]
    pub legacy_metrics: bool,

    /// Display latencies in milliseconds instead of microseconds
    #[clap(long, default_value_t = false)]
    pub use_millis: bool,

    /// Synthetic workload pace in messages per second
    #[clap(short = 'r', long, default_value_t = crate::defaults::PUBLISH_RATE)]
    pub rate: f64,
}

/// Configuration for one reporting run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfiguration {
    pub test_id: String,
    pub interval: Duration,
    pub duration: Duration,
    pub csv_file: Option<PathBuf>,
    pub categories: EnabledCategories,
    pub rate: f64,
}

impl From<&Args> for RunConfiguration {
    fn from(args: &Args) -> Self {
        Self {
            test_id: args.id.clone().unwrap_or_else(generate_test_id),
            interval: args.interval,
            duration: args.duration,
            csv_file: args.csv.clone(),
            categories: EnabledCategories {
                send: args.send_stats,
                receive: args.recv_stats,
                returns: args.return_stats,
                confirms: args.confirm_stats,
                legacy_metrics: args.legacy_metrics,
                use_millis: args.use_millis,
            },
            rate: args.rate,
        }
    }
}

/// Generate a default test identifier.
///
/// A short UUID fragment keeps concurrent runs distinguishable in merged
/// CSV files without making every row unwieldy.
pub fn generate_test_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("test-{}", &uuid[..8])
}

/// Parse duration from string (e.g. "500ms", "10s", "5m", "1h")
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (num_str, unit) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, "ms")
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, "s")
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, "m")
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, "h")
    } else {
        (s, "s") // Default to seconds
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number in duration: {}", num_str))?;

    let duration = match unit {
        "ms" => Duration::from_millis(num as u64),
        "s" => Duration::from_secs(num as u64),
        "m" => Duration::from_secs((num * 60.0) as u64),
        "h" => Duration::from_secs((num * 3600.0) as u64),
        _ => return Err(format!("Invalid duration unit: {}", unit)),
    };

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("10").unwrap(), Duration::from_secs(10));

        assert!(parse_duration("").is_err());
        assert!(parse_duration("invalid").is_err());
    }

    #[test]
    fn test_generate_test_id() {
        let id = generate_test_id();
        assert!(id.starts_with("test-"));
        assert_eq!(id.len(), "test-".len() + 8);
        assert_ne!(generate_test_id(), id);
    }

    #[test]
    fn test_configuration_from_args() {
        let args = Args::parse_from(["mq-throughput", "--id", "run-1", "--confirm-stats"]);
        let config = RunConfiguration::from(&args);
        assert_eq!(config.test_id, "run-1");
        assert!(config.categories.send);
        assert!(config.categories.confirms);
        assert!(!config.categories.returns);
        assert_eq!(config.interval, Duration::from_secs(1));
    }
}
