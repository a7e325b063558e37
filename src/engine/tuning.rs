use serde::{Deserialize, Serialize};

use super::config::PerformanceConfig;

const LOW_END_CORES: usize = 4;
const HIGH_END_CORES: usize = 8;
const ASSUMED_CORES: usize = 4;

/// Host capabilities, supplied by the embedding application.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub hardware_concurrency: Option<usize>,
    pub device_memory_gb: Option<f64>,
    pub is_mobile: bool,
}

impl DeviceProfile {
    pub fn tier(&self) -> DeviceTier {
        let cores = self.hardware_concurrency.unwrap_or(ASSUMED_CORES);
        if self.is_mobile || cores < LOW_END_CORES {
            DeviceTier::LowEnd
        } else if cores >= HIGH_END_CORES {
            DeviceTier::HighEnd
        } else {
            DeviceTier::Standard
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceTier {
    LowEnd,
    Standard,
    HighEnd,
}

impl DeviceTier {
    pub fn multiplier(self) -> f64 {
        match self {
            Self::LowEnd => 0.5,
            Self::Standard => 1.0,
            Self::HighEnd => 1.5,
        }
    }
}

pub fn tune_config(
    config: &PerformanceConfig,
    device: &DeviceProfile,
) -> (PerformanceConfig, DeviceTier) {
    let tier = device.tier();
    (config.scaled(tier.multiplier()), tier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_from_device_signals() {
        let mobile = DeviceProfile {
            hardware_concurrency: Some(16),
            is_mobile: true,
            ..DeviceProfile::default()
        };
        assert_eq!(mobile.tier(), DeviceTier::LowEnd);

        let dual_core = DeviceProfile {
            hardware_concurrency: Some(2),
            ..DeviceProfile::default()
        };
        assert_eq!(dual_core.tier(), DeviceTier::LowEnd);

        let workstation = DeviceProfile {
            hardware_concurrency: Some(12),
            ..DeviceProfile::default()
        };
        assert_eq!(workstation.tier(), DeviceTier::HighEnd);

        assert_eq!(DeviceProfile::default().tier(), DeviceTier::Standard);
    }

    #[test]
    fn low_end_halves_every_integer_field() {
        let original = PerformanceConfig::default();
        let device = DeviceProfile {
            hardware_concurrency: Some(2),
            is_mobile: true,
            device_memory_gb: Some(2.0),
        };

        let (tuned, tier) = tune_config(&original, &device);
        let half = |value: usize| (value as f64 * 0.5).floor() as usize;

        assert_eq!(tier, DeviceTier::LowEnd);
        assert_eq!(tuned.max_visible_nodes, half(original.max_visible_nodes));
        assert_eq!(tuned.max_visible_edges, half(original.max_visible_edges));
        assert_eq!(tuned.clustering_threshold, half(original.clustering_threshold));
        assert_eq!(tuned.render_batch_size, half(original.render_batch_size));
        assert_eq!(
            tuned.update_throttle_ms,
            (original.update_throttle_ms as f64 * 0.5).floor() as u64
        );
        for (tuned, original) in tuned.lod_thresholds.iter().zip(&original.lod_thresholds) {
            assert_eq!(tuned.zoom, original.zoom);
            assert_eq!(tuned.max_nodes, half(original.max_nodes));
        }
    }

    #[test]
    fn high_end_scales_up() {
        let original = PerformanceConfig::default();
        let device = DeviceProfile {
            hardware_concurrency: Some(8),
            ..DeviceProfile::default()
        };
        let (tuned, tier) = tune_config(&original, &device);
        assert_eq!(tier, DeviceTier::HighEnd);
        assert_eq!(tuned.max_visible_nodes, 15_000);
        assert_eq!(tuned.render_batch_size, 750);
    }
}
