use mq_throughput::{
    ConsoleReporter, EnabledCategories, MetricsCollector, PerformanceMetrics, ReportingEngine,
};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Console sink whose contents outlive the reporter so tests can assert on
/// the exact lines the run produced.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn build_engine(categories: EnabledCategories) -> (ReportingEngine, SharedBuf) {
    let collector = Arc::new(MetricsCollector::new(Duration::from_millis(50)).unwrap());
    let console = SharedBuf::default();
    let reporter =
        ConsoleReporter::with_console("cycle-test", categories, Box::new(console.clone()), None);
    (ReportingEngine::new(collector, reporter), console)
}

#[test]
fn concurrent_workers_feed_one_interval_line_per_tick() {
    let (engine, console) = build_engine(EnabledCategories::default());
    engine.collector().start();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let collector = engine.collector().clone();
            std::thread::spawn(move || {
                for i in 0..250u64 {
                    collector.published();
                    collector.received(1_000_000 + i * 10_000);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    std::thread::sleep(Duration::from_millis(10));
    engine.tick();
    std::thread::sleep(Duration::from_millis(10));
    engine.tick();

    let output = console.contents();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("id: cycle-test, time: "));
    assert!(lines[0].contains("sent: "));
    assert!(lines[0].contains("received: "));
    assert!(lines[0].contains("min/median/75th/95th/99th consumer latency: "));
    // Counters were drained by the first tick.
    assert!(lines[1].contains("sent: 0 msg/s"), "line: {}", lines[1]);
}

#[test]
fn finalize_suppresses_all_later_interval_output() {
    let (engine, console) = build_engine(EnabledCategories::default());
    engine.collector().start();
    engine.collector().published();
    engine.collector().received(2_000_000);

    std::thread::sleep(Duration::from_millis(10));
    engine.finalize();
    let summary = console.contents();
    assert!(summary.contains("id: cycle-test, sending rate avg: "));
    assert!(summary.contains("id: cycle-test, receiving rate avg: "));
    assert!(summary.contains("consumer latency min/median/75th/95th/99th "));

    engine.tick();
    engine.finalize();
    assert_eq!(console.contents(), summary);
}

#[test]
fn racing_finalize_calls_produce_one_summary() {
    let (engine, console) = build_engine(EnabledCategories::default());
    engine.collector().start();
    for _ in 0..100 {
        engine.collector().published();
    }
    std::thread::sleep(Duration::from_millis(10));

    let engine = Arc::new(engine);
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                if i % 2 == 0 {
                    engine.finalize();
                } else {
                    engine.tick();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Racing ticks may or may not print, but the summary appears exactly once
    // and no tick that starts after it produces output.
    let output = console.contents();
    assert_eq!(output.matches("sending rate avg").count(), 1);

    engine.tick();
    assert_eq!(console.contents(), output);
}

#[test]
fn confirm_latency_requires_send_and_confirm() {
    let categories = EnabledCategories {
        send: true,
        receive: false,
        returns: false,
        confirms: true,
        legacy_metrics: false,
        use_millis: false,
    };
    let (engine, console) = build_engine(categories);
    engine.collector().start();
    engine.collector().published();
    engine.collector().confirmed(1, &[3_000_000]);

    std::thread::sleep(Duration::from_millis(10));
    engine.tick();

    let output = console.contents();
    assert!(output.contains("confirmed: "));
    assert!(output.contains("confirm latency: "));
    assert!(!output.contains("consumer latency"));
}

#[test]
fn reset_globals_starts_a_fresh_phase() {
    let (engine, console) = build_engine(EnabledCategories::default());
    engine.collector().start();
    for _ in 0..50 {
        engine.collector().published();
    }
    engine.collector().reset_globals();
    std::thread::sleep(Duration::from_millis(20));

    engine.finalize();
    let output = console.contents();
    // Totals were cleared, so the average send rate is zero.
    assert!(
        output.contains("sending rate avg: 0 msg/s"),
        "output: {}",
        output
    );
}
