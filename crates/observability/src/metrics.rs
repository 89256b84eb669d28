//! Collection cycle 指标收集模块
//!
//! 基于 CycleReport 记录 Prometheus 指标，并在内存中聚合运行统计。

use std::collections::BTreeMap;

use contracts::{CycleReport, VendorKind};
use metrics::{counter, gauge, histogram};

/// 从 CycleReport 记录周期级指标
///
/// 每个采集周期结束时调用一次。
pub fn record_cycle_metrics(report: &CycleReport) {
    counter!("plugwatch_cycles_total").increment(1);

    gauge!("plugwatch_cycle_devices_ok").set(report.devices_ok as f64);
    gauge!("plugwatch_cycle_devices_failed").set(report.devices_failed() as f64);

    histogram!("plugwatch_cycle_duration_ms").record(report.duration.as_secs_f64() * 1000.0);

    for outcome in &report.sink_outcomes {
        record_sink_write(&outcome.sink, outcome.points, outcome.is_success());
    }
}

/// 记录单个设备的一次轮询结果
pub fn record_device_poll(device: &str, vendor_kind: VendorKind, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "plugwatch_device_polls_total",
        "device" => device.to_string(),
        "vendor_kind" => vendor_kind.as_str(),
        "status" => status
    )
    .increment(1);
}

/// 记录一次 sink 批量写入
pub fn record_sink_write(sink: &str, points: usize, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "plugwatch_sink_writes_total",
        "sink" => sink.to_string(),
        "status" => status
    )
    .increment(1);

    if success {
        counter!("plugwatch_points_written_total", "sink" => sink.to_string())
            .increment(points as u64);
    }
}

/// 采集周期聚合器
///
/// 在内存中聚合指标，便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct CycleStatsAggregator {
    /// 总周期数
    pub total_cycles: u64,

    /// 所有设备都成功的周期数
    pub clean_cycles: u64,

    /// 设备成功/失败总次数
    pub device_successes: u64,
    pub device_failures: u64,

    /// sink 写入成功/失败总次数
    pub sink_successes: u64,
    pub sink_failures: u64,

    /// 周期耗时统计 (毫秒)
    pub duration_stats: RunningStats,

    /// 各设备失败次数
    pub failures_by_device: BTreeMap<String, u64>,

    /// 各 sink 失败次数
    pub failures_by_sink: BTreeMap<String, u64>,
}

impl CycleStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, report: &CycleReport) {
        self.total_cycles += 1;
        if report.device_failures.is_empty() && report.sinks_failed() == 0 {
            self.clean_cycles += 1;
        }

        self.device_successes += report.devices_ok as u64;
        self.device_failures += report.devices_failed() as u64;
        for failure in &report.device_failures {
            *self
                .failures_by_device
                .entry(failure.device.clone())
                .or_insert(0) += 1;
        }

        for outcome in &report.sink_outcomes {
            if outcome.is_success() {
                self.sink_successes += 1;
            } else {
                self.sink_failures += 1;
                *self.failures_by_sink.entry(outcome.sink.clone()).or_insert(0) += 1;
            }
        }

        self.duration_stats
            .push(report.duration.as_secs_f64() * 1000.0);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let device_polls = self.device_successes + self.device_failures;
        MetricsSummary {
            total_cycles: self.total_cycles,
            clean_cycles: self.clean_cycles,
            device_successes: self.device_successes,
            device_failures: self.device_failures,
            sink_successes: self.sink_successes,
            sink_failures: self.sink_failures,
            device_failure_rate: if device_polls > 0 {
                self.device_failures as f64 / device_polls as f64 * 100.0
            } else {
                0.0
            },
            cycle_duration_ms: StatsSummary::from(&self.duration_stats),
            failures_by_device: self.failures_by_device.clone(),
            failures_by_sink: self.failures_by_sink.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_cycles: u64,
    pub clean_cycles: u64,
    pub device_successes: u64,
    pub device_failures: u64,
    pub sink_successes: u64,
    pub sink_failures: u64,
    pub device_failure_rate: f64,
    pub cycle_duration_ms: StatsSummary,
    pub failures_by_device: BTreeMap<String, u64>,
    pub failures_by_sink: BTreeMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Collection Summary ===")?;
        writeln!(
            f,
            "Cycles: {} ({} without failures)",
            self.total_cycles, self.clean_cycles
        )?;
        writeln!(
            f,
            "Device polls: {} ok, {} failed ({:.2}%)",
            self.device_successes, self.device_failures, self.device_failure_rate
        )?;
        writeln!(
            f,
            "Sink writes: {} ok, {} failed",
            self.sink_successes, self.sink_failures
        )?;
        writeln!(f, "Cycle duration (ms): {}", self.cycle_duration_ms)?;

        if !self.failures_by_device.is_empty() {
            writeln!(f, "Device failures:")?;
            for (device, count) in &self.failures_by_device {
                writeln!(f, "  {}: {}", device, count)?;
            }
        }
        if !self.failures_by_sink.is_empty() {
            writeln!(f, "Sink failures:")?;
            for (sink, count) in &self.failures_by_sink {
                writeln!(f, "  {}: {}", sink, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DeviceFailure, FailureStage, SinkOutcome};
    use std::time::Duration;

    fn report(cycle: u64, ok: usize, failed: &[&str], sink_ok: bool, millis: u64) -> CycleReport {
        CycleReport {
            cycle,
            devices_ok: ok,
            device_failures: failed
                .iter()
                .map(|d| DeviceFailure {
                    device: d.to_string(),
                    vendor_kind: VendorKind::CloudSession,
                    stage: FailureStage::Acquisition,
                    cause: "timeout".to_string(),
                })
                .collect(),
            sink_outcomes: vec![SinkOutcome {
                sink: "influx".to_string(),
                points: ok,
                result: if sink_ok { Ok(()) } else { Err("503".to_string()) },
            }],
            duration: Duration::from_millis(millis),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = CycleStatsAggregator::new();
        aggregator.update(&report(1, 2, &[], true, 100));
        aggregator.update(&report(2, 1, &["fridge"], false, 300));

        assert_eq!(aggregator.total_cycles, 2);
        assert_eq!(aggregator.clean_cycles, 1);
        assert_eq!(aggregator.device_successes, 3);
        assert_eq!(aggregator.device_failures, 1);
        assert_eq!(aggregator.sink_failures, 1);
        assert_eq!(aggregator.failures_by_device.get("fridge"), Some(&1));
        assert_eq!(aggregator.failures_by_sink.get("influx"), Some(&1));
        assert!((aggregator.duration_stats.mean() - 200.0).abs() < 1e-9);

        let summary = aggregator.summary();
        assert!((summary.device_failure_rate - 25.0).abs() < 1e-9);

        aggregator.reset();
        assert_eq!(aggregator.total_cycles, 0);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = CycleStatsAggregator::new();
        aggregator.update(&report(1, 1, &["fridge"], true, 50));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Cycles: 1 (0 without failures)"));
        assert!(output.contains("50.00%"));
        assert!(output.contains("fridge: 1"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        // No global recorder installed: the macros must not panic
        record_cycle_metrics(&report(1, 1, &[], true, 10));
        record_device_poll("washer", VendorKind::LocalProtocol, true);
    }
}
