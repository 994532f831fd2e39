//! # mq-throughput - Main Entry Point
//!
//! Thin driver around the reporting engine:
//! 1. **Initialize logging**: colorized tracing output, env-filtered
//! 2. **Parse arguments**: test id, cadence, categories, sinks
//! 3. **Wire the pipeline**: collector -> reporting engine -> console/CSV
//! 4. **Schedule**: a tokio interval timer ticks the engine at the
//!    configured cadence while a fixed-pace synthetic event source feeds
//!    the collector
//! 5. **Finalize**: on run deadline or ctrl-c, trigger the terminal
//!    summary exactly once
//!
//! Message transport and workload shaping are out of scope here; the
//! synthetic source exists only so the binary exercises the reporting path
//! end to end.

use anyhow::{Context, Result};
use clap::Parser;
use mq_throughput::{
    cli::{Args, RunConfiguration},
    logging, ConsoleReporter, MetricsCollector, PerformanceMetrics, ReportingEngine,
};
use rand::Rng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args = Args::parse();
    let config = RunConfiguration::from(&args);
    info!("starting reporting run {}", config.test_id);

    // An absent CSV sink disables CSV output entirely; console is unaffected.
    let csv: Option<Box<dyn Write + Send>> = match &config.csv_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create CSV file {:?}", path))?;
            Some(Box::new(BufWriter::new(file)))
        }
        None => None,
    };

    let collector = Arc::new(MetricsCollector::new(config.interval)?);
    let reporter = ConsoleReporter::new(config.test_id.clone(), config.categories, csv);
    let engine = ReportingEngine::new(collector.clone(), reporter);

    collector.start();
    let workload = tokio::spawn(synthetic_workload(collector.clone(), config.clone()));

    let deadline = tokio::time::sleep(config.duration);
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval(collector.interval());
    ticker.tick().await; // the first tick completes immediately
    loop {
        tokio::select! {
            _ = ticker.tick() => engine.tick(),
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, finalizing");
                break;
            }
        }
    }

    workload.abort();
    engine.finalize();
    info!("run {} complete", config.test_id);
    Ok(())
}

/// Fixed-pace synthetic event source.
///
/// Publishes one message per pace tick and mirrors it with confirm, return
/// and receive events according to the enabled categories, with randomized
/// latency samples in the configured native unit.
async fn synthetic_workload(metrics: Arc<MetricsCollector>, config: RunConfiguration) {
    let pace = Duration::from_secs_f64(1.0 / config.rate.max(1.0));
    let mut ticker = tokio::time::interval(pace);
    let mut sequence: u64 = 0;
    loop {
        ticker.tick().await;
        sequence += 1;
        if config.categories.send {
            metrics.published();
            if config.categories.returns && sequence % 50 == 0 {
                metrics.returned();
            }
            if config.categories.confirms {
                if sequence % 100 == 0 {
                    metrics.nacked(1);
                } else {
                    metrics.confirmed(1, &[sample_latency(config.categories.use_millis)]);
                }
            }
        }
        if config.categories.receive {
            metrics.received(sample_latency(config.categories.use_millis));
        }
    }
}

/// Randomized latency sample: 1-25 ms, expressed in the configured unit.
fn sample_latency(use_millis: bool) -> u64 {
    let mut rng = rand::thread_rng();
    if use_millis {
        rng.gen_range(1..25)
    } else {
        rng.gen_range(1_000_000..25_000_000)
    }
}
