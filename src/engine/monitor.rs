use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};

use crate::util::unix_millis;

const FPS_WINDOW: Duration = Duration::from_secs(1);
const FPS_SAMPLE_WINDOW: usize = 180;

const LOW_FPS: f64 = 30.0;
const HIGH_NODE_COUNT: usize = 5_000;
const HIGH_MEMORY_MB: f64 = 500.0;
const SLOW_RENDER_MS: f64 = 100.0;

const NODE_BYTES: f64 = 512.0;
const EDGE_BYTES: f64 = 128.0;
const CLUSTER_BYTES: f64 = 1_024.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub render_time_ms: f64,
    pub node_count: usize,
    pub edge_count: usize,
    pub cluster_count: usize,
    /// `None` until a full measurement window has elapsed.
    pub fps: Option<f64>,
    pub memory_estimate_mb: f64,
    pub last_update_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recommendation {
    ReduceVisibleNodes,
    RaiseClusteringThreshold,
    MoreAggressiveLod,
    ReduceMaxVisibleElements,
    Nominal,
}

impl Recommendation {
    pub fn message(self) -> &'static str {
        match self {
            Self::ReduceVisibleNodes => {
                "Low frame rate: reduce visible nodes or disable animations"
            }
            Self::RaiseClusteringThreshold => {
                "High node count: raise the clustering threshold to aggregate more nodes"
            }
            Self::MoreAggressiveLod => "High memory usage: use a more aggressive LOD table",
            Self::ReduceMaxVisibleElements => {
                "Slow rendering: reduce the maximum number of visible elements"
            }
            Self::Nominal => "Performance nominal",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FpsSummary {
    pub current: f64,
    pub average: f64,
    pub low: f64,
    pub high: f64,
}

impl FpsSummary {
    pub fn display_text(&self) -> String {
        let frame_time = if self.current > f64::EPSILON {
            1000.0 / self.current
        } else {
            0.0
        };
        format!(
            "FPS {:.0} | avg {:.1} | low {:.0} | high {:.0} | {:.1} ms",
            self.current, self.average, self.low, self.high, frame_time
        )
    }
}

/// Frame-rate and render-cost bookkeeping. Timestamps come from the host.
#[derive(Clone, Debug, Default)]
pub struct PerformanceMonitor {
    frames: u32,
    window_start: Option<Instant>,
    fps_samples: VecDeque<f64>,
    memory_sample_mb: Option<f64>,
    metrics: PerformanceMetrics,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new fps when this frame closed a measurement window.
    pub fn record_frame(&mut self, now: Instant) -> Option<f64> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            self.frames = 0;
            return None;
        };

        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed < FPS_WINDOW {
            return None;
        }

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let fps = (f64::from(self.frames) * 1000.0 / elapsed_ms).clamp(0.0, 1000.0);
        self.frames = 0;
        self.window_start = Some(now);

        self.fps_samples.push_back(fps);
        while self.fps_samples.len() > FPS_SAMPLE_WINDOW {
            self.fps_samples.pop_front();
        }

        self.metrics.fps = Some(fps);
        self.metrics.last_update_ms = unix_millis();
        Some(fps)
    }

    /// Drops the open measurement window. The next frame starts a fresh one, so a pause
    /// in frame delivery is not averaged into the next fps reading.
    pub fn reset_window(&mut self) {
        self.window_start = None;
        self.frames = 0;
    }

    pub fn record_render(
        &mut self,
        duration: Duration,
        node_count: usize,
        edge_count: usize,
        cluster_count: usize,
    ) {
        self.metrics.render_time_ms = duration.as_secs_f64() * 1000.0;
        self.metrics.node_count = node_count;
        self.metrics.edge_count = edge_count;
        self.metrics.cluster_count = cluster_count;
        self.metrics.memory_estimate_mb = self.memory_estimate_mb();
        self.metrics.last_update_ms = unix_millis();
    }

    /// An externally measured footprint replaces the count-based estimate.
    pub fn record_memory_sample(&mut self, megabytes: f64) {
        if !megabytes.is_finite() || megabytes < 0.0 {
            return;
        }
        self.memory_sample_mb = Some(megabytes);
        self.metrics.memory_estimate_mb = megabytes;
        self.metrics.last_update_ms = unix_millis();
    }

    fn memory_estimate_mb(&self) -> f64 {
        self.memory_sample_mb.unwrap_or_else(|| {
            let bytes = self.metrics.node_count as f64 * NODE_BYTES
                + self.metrics.edge_count as f64 * EDGE_BYTES
                + self.metrics.cluster_count as f64 * CLUSTER_BYTES;
            bytes / (1024.0 * 1024.0)
        })
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn fps_summary(&self) -> Option<FpsSummary> {
        let current = *self.fps_samples.back()?;
        let average = self.fps_samples.iter().sum::<f64>() / self.fps_samples.len() as f64;
        let low = self.fps_samples.iter().copied().reduce(f64::min)?;
        let high = self.fps_samples.iter().copied().reduce(f64::max)?;

        Some(FpsSummary {
            current,
            average,
            low,
            high,
        })
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        let metrics = &self.metrics;
        let mut recommendations = Vec::new();

        if metrics.fps.is_some_and(|fps| fps < LOW_FPS) {
            recommendations.push(Recommendation::ReduceVisibleNodes);
        }
        if metrics.node_count > HIGH_NODE_COUNT {
            recommendations.push(Recommendation::RaiseClusteringThreshold);
        }
        if metrics.memory_estimate_mb > HIGH_MEMORY_MB {
            recommendations.push(Recommendation::MoreAggressiveLod);
        }
        if metrics.render_time_ms > SLOW_RENDER_MS {
            recommendations.push(Recommendation::ReduceMaxVisibleElements);
        }

        if recommendations.is_empty() {
            recommendations.push(Recommendation::Nominal);
        }
        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_is_measured_per_window() {
        let mut monitor = PerformanceMonitor::new();
        let start = Instant::now();

        assert_eq!(monitor.record_frame(start), None);
        for frame in 1..60 {
            let now = start + Duration::from_millis(frame * 16);
            assert_eq!(monitor.record_frame(now), None);
        }
        let fps = monitor
            .record_frame(start + Duration::from_millis(1_000))
            .expect("window closed");

        assert!((fps - 60.0).abs() < 1e-9);
        assert_eq!(monitor.metrics().fps, Some(fps));

        let summary = monitor.fps_summary().expect("one sample");
        assert_eq!(summary.current, fps);
        assert_eq!(summary.low, fps);
        assert!(summary.display_text().starts_with("FPS 60"));
    }

    #[test]
    fn reset_window_ignores_paused_interval() {
        let mut monitor = PerformanceMonitor::new();
        let start = Instant::now();
        for frame in 0..=60 {
            monitor.record_frame(start + Duration::from_micros(frame * 16_667));
        }
        assert!(monitor.metrics().fps.is_some_and(|fps| fps > 59.0));

        monitor.reset_window();
        let resumed = start + Duration::from_secs(11);
        assert_eq!(monitor.record_frame(resumed), None);
        assert_eq!(monitor.record_frame(resumed + Duration::from_millis(16)), None);

        let mut closed = None;
        for frame in 2..=61 {
            if let Some(fps) = monitor.record_frame(resumed + Duration::from_micros(frame * 16_667)) {
                closed = Some(fps);
            }
        }
        let fps = closed.expect("window closed after resume");
        assert!(fps > 59.0, "got {fps}");
        assert_eq!(monitor.recommendations(), [Recommendation::Nominal]);
    }

    #[test]
    fn nominal_without_measurements() {
        let monitor = PerformanceMonitor::new();
        assert_eq!(monitor.recommendations(), [Recommendation::Nominal]);
        assert!(monitor.fps_summary().is_none());
    }

    #[test]
    fn rules_fire_in_fixed_order() {
        let mut monitor = PerformanceMonitor::new();
        let start = Instant::now();
        monitor.record_frame(start);
        for frame in 1..=10 {
            monitor.record_frame(start + Duration::from_millis(frame * 100));
        }

        monitor.record_render(Duration::from_millis(150), 6_000, 100, 4);
        monitor.record_memory_sample(900.0);

        assert_eq!(
            monitor.recommendations(),
            [
                Recommendation::ReduceVisibleNodes,
                Recommendation::RaiseClusteringThreshold,
                Recommendation::MoreAggressiveLod,
                Recommendation::ReduceMaxVisibleElements,
            ]
        );
    }

    #[test]
    fn memory_estimate_follows_counts_until_sampled() {
        let mut monitor = PerformanceMonitor::new();
        monitor.record_render(Duration::from_millis(5), 2_048, 0, 0);
        assert!((monitor.metrics().memory_estimate_mb - 1.0).abs() < 1e-9);

        monitor.record_memory_sample(42.0);
        monitor.record_render(Duration::from_millis(5), 10, 10, 10);
        assert_eq!(monitor.metrics().memory_estimate_mb, 42.0);

        monitor.record_memory_sample(f64::NAN);
        assert_eq!(monitor.metrics().memory_estimate_mb, 42.0);
    }
}
