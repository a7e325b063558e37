use super::config::{LodThreshold, PerformanceConfig};
use super::error::ConfigError;

#[derive(Clone, Debug)]
pub struct LodSelector {
    thresholds: Vec<LodThreshold>,
    max_visible_nodes: usize,
}

impl LodSelector {
    pub fn new(config: &PerformanceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            thresholds: config.lod_thresholds.clone(),
            max_visible_nodes: config.max_visible_nodes,
        })
    }

    /// Index of the threshold governing `zoom`. Non-positive and NaN zooms use the first entry.
    pub fn level(&self, zoom: f64) -> usize {
        if zoom.is_nan() || zoom <= 0.0 {
            return 0;
        }

        self.thresholds
            .iter()
            .rposition(|threshold| threshold.zoom <= zoom)
            .unwrap_or(0)
    }

    pub fn budget(&self, zoom: f64) -> usize {
        self.thresholds
            .get(self.level(zoom))
            .map_or(0, |threshold| threshold.max_nodes)
            .min(self.max_visible_nodes)
    }

    pub fn thresholds(&self) -> &[LodThreshold] {
        &self.thresholds
    }
}
