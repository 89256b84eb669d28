//! Run statistics.

use std::time::Duration;

use observability::CycleStatsAggregator;

/// Statistics from a collector run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Cycles completed
    pub cycles: u64,

    /// Ended by Ctrl+C / SIGTERM rather than by finishing
    pub stopped_by_signal: bool,

    /// Wall time of the whole run
    pub duration: Duration,

    /// Devices in the inventory
    pub devices: usize,

    /// Sinks configured
    pub sinks: usize,

    /// Per-cycle aggregates
    pub cycle_stats: CycleStatsAggregator,
}

impl PipelineStats {
    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Collector Statistics                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Cycles: {}", self.cycles);
        println!("   ├─ Devices: {}", self.devices);
        println!("   ├─ Sinks: {}", self.sinks);
        println!(
            "   └─ Stopped by signal: {}",
            if self.stopped_by_signal { "yes" } else { "no" }
        );

        let summary = self.cycle_stats.summary();

        println!("\n📈 Cycle Metrics");
        println!(
            "   ├─ Device polls: {} ok, {} failed ({:.2}%)",
            summary.device_successes, summary.device_failures, summary.device_failure_rate
        );
        println!(
            "   ├─ Sink writes: {} ok, {} failed",
            summary.sink_successes, summary.sink_failures
        );
        println!("   └─ Cycle duration (ms): {}", summary.cycle_duration_ms);

        if !summary.failures_by_device.is_empty() {
            println!("\n⚠️  Device Failures");
            for (device, count) in &summary.failures_by_device {
                println!("   ├─ {}: {}", device, count);
            }
        }
        if !summary.failures_by_sink.is_empty() {
            println!("\n⚠️  Sink Failures");
            for (sink, count) in &summary.failures_by_sink {
                println!("   ├─ {}: {}", sink, count);
            }
        }

        println!();
    }
}
