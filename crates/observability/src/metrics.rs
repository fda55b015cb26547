//! Relay 指标收集模块
//!
//! Prometheus 记录函数 + 进程内的分发统计聚合器。

use std::collections::BTreeMap;

use contracts::Reading;
use metrics::{counter, gauge, histogram};

/// 单次 sink 更新的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateStatus {
    Success,
    RateLimited,
    Failure,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::RateLimited => "rate_limited",
            Self::Failure => "failure",
        }
    }
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 记录一次 sink 更新
pub fn record_sink_update(sink_name: &str, status: UpdateStatus, latency_ms: f64) {
    counter!(
        "tilt_relay_sink_updates_total",
        "sink" => sink_name.to_string(),
        "status" => status.as_str()
    )
    .increment(1);

    histogram!(
        "tilt_relay_sink_update_latency_ms",
        "sink" => sink_name.to_string()
    )
    .record(latency_ms);
}

/// 记录队列深度
pub fn record_queue_depth(depth: usize) {
    gauge!("tilt_relay_queue_depth").set(depth as f64);
}

/// 记录分发的读数数量
pub fn record_reading_dispatched() {
    counter!("tilt_relay_readings_dispatched_total").increment(1);
}

/// 以颜色为标签发布最新读数
pub fn record_reading(reading: &Reading) {
    let color = reading.color().as_str();
    let name = reading.name().to_string();

    gauge!(
        "tilt_relay_temperature_fahrenheit",
        "color" => color,
        "name" => name.clone()
    )
    .set(reading.temp_fahrenheit());

    gauge!(
        "tilt_relay_specific_gravity",
        "color" => color,
        "name" => name.clone()
    )
    .set(reading.gravity());

    if let Some(abv) = reading.alcohol_by_volume() {
        gauge!(
            "tilt_relay_alcohol_by_volume",
            "color" => color,
            "name" => name
        )
        .set(abv);
    }

    gauge!("tilt_relay_last_reading_timestamp_seconds", "color" => color)
        .set(reading.timestamp().timestamp() as f64);
}

/// 单个 sink 的统计
#[derive(Debug, Clone, Default)]
pub struct SinkStats {
    pub successes: u64,
    pub rate_limited: u64,
    pub failures: u64,
    /// 更新延迟（毫秒）
    pub latency_ms: RunningStats,
}

impl SinkStats {
    pub fn attempts(&self) -> u64 {
        self.successes + self.rate_limited + self.failures
    }
}

/// 分发统计聚合器
///
/// 由分发循环独占，在内存中聚合，结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchStats {
    /// 已分发的读数
    pub readings_dispatched: u64,

    /// 空轮询次数
    pub empty_polls: u64,

    /// 队列满告警次数
    pub saturation_warnings: u64,

    /// 各 sink 统计（按名称）
    pub sinks: BTreeMap<String, SinkStats>,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次 sink 更新
    pub fn record_update(&mut self, sink_name: &str, status: UpdateStatus, latency_ms: f64) {
        let stats = self.sinks.entry(sink_name.to_string()).or_default();
        match status {
            UpdateStatus::Success => stats.successes += 1,
            UpdateStatus::RateLimited => stats.rate_limited += 1,
            UpdateStatus::Failure => stats.failures += 1,
        }
        stats.latency_ms.push(latency_ms);
    }

    pub fn record_cycle(&mut self) {
        self.readings_dispatched += 1;
    }

    pub fn record_empty_poll(&mut self) {
        self.empty_polls += 1;
    }

    pub fn record_saturation(&mut self) {
        self.saturation_warnings += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            readings_dispatched: self.readings_dispatched,
            empty_polls: self.empty_polls,
            saturation_warnings: self.saturation_warnings,
            sinks: self
                .sinks
                .iter()
                .map(|(name, stats)| {
                    (
                        name.clone(),
                        SinkSummary {
                            successes: stats.successes,
                            rate_limited: stats.rate_limited,
                            failures: stats.failures,
                            latency_ms: StatsSummary::from(&stats.latency_ms),
                        },
                    )
                })
                .collect(),
        }
    }
}

/// 分发摘要
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub readings_dispatched: u64,
    pub empty_polls: u64,
    pub saturation_warnings: u64,
    pub sinks: BTreeMap<String, SinkSummary>,
}

/// 单个 sink 摘要
#[derive(Debug, Clone, Default)]
pub struct SinkSummary {
    pub successes: u64,
    pub rate_limited: u64,
    pub failures: u64,
    pub latency_ms: StatsSummary,
}

impl std::fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Readings dispatched: {}", self.readings_dispatched)?;
        writeln!(f, "Empty polls: {}", self.empty_polls)?;
        writeln!(f, "Queue saturation warnings: {}", self.saturation_warnings)?;

        if !self.sinks.is_empty() {
            writeln!(f, "Sinks:")?;
            for (name, sink) in &self.sinks {
                writeln!(
                    f,
                    "  {}: ok={} rate_limited={} failed={} latency_ms: {}",
                    name, sink.successes, sink.rate_limited, sink.failures, sink.latency_ms
                )?;
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
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
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
