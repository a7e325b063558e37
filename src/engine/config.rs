use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodThreshold {
    pub zoom: f64,
    pub max_nodes: usize,
}

impl LodThreshold {
    pub const fn new(zoom: f64, max_nodes: usize) -> Self {
        Self { zoom, max_nodes }
    }
}

/// The tunable budget set. Every integer field is rescaled by auto-tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub max_visible_nodes: usize,
    pub max_visible_edges: usize,
    pub lod_thresholds: Vec<LodThreshold>,
    pub clustering_threshold: usize,
    pub render_batch_size: usize,
    pub update_throttle_ms: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_visible_nodes: 10_000,
            max_visible_edges: 20_000,
            lod_thresholds: vec![
                LodThreshold::new(0.1, 50),
                LodThreshold::new(0.3, 200),
                LodThreshold::new(0.6, 500),
                LodThreshold::new(1.0, 1_000),
                LodThreshold::new(2.0, 5_000),
                LodThreshold::new(3.0, 15_000),
            ],
            clustering_threshold: 1_000,
            render_batch_size: 500,
            update_throttle_ms: 100,
        }
    }
}

impl PerformanceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lod_thresholds.is_empty() {
            return Err(ConfigError::EmptyLodTable);
        }

        let mut previous = 0.0_f64;
        for (index, threshold) in self.lod_thresholds.iter().enumerate() {
            let zoom = threshold.zoom;
            if !zoom.is_finite() || zoom <= 0.0 || (index > 0 && zoom <= previous) {
                return Err(ConfigError::UnorderedLodThreshold { index, zoom });
            }
            previous = zoom;
        }

        if self.clustering_threshold == 0 {
            return Err(ConfigError::NonPositive {
                field: "clustering_threshold",
            });
        }
        if self.render_batch_size == 0 {
            return Err(ConfigError::NonPositive {
                field: "render_batch_size",
            });
        }

        Ok(())
    }

    /// `⌊value · multiplier⌋` for every integer field. Fields that must stay positive floor at 1.
    pub fn scaled(&self, multiplier: f64) -> Self {
        let scale = |value: usize| (value as f64 * multiplier).floor() as usize;

        Self {
            max_visible_nodes: scale(self.max_visible_nodes),
            max_visible_edges: scale(self.max_visible_edges),
            lod_thresholds: self
                .lod_thresholds
                .iter()
                .map(|threshold| LodThreshold::new(threshold.zoom, scale(threshold.max_nodes)))
                .collect(),
            clustering_threshold: scale(self.clustering_threshold).max(1),
            render_batch_size: scale(self.render_batch_size).max(1),
            update_throttle_ms: (self.update_throttle_ms as f64 * multiplier).floor() as u64,
        }
    }

    pub fn update_throttle(&self) -> Duration {
        Duration::from_millis(self.update_throttle_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TieBreak {
    Disabled,
    Seeded { seed: u64, max_jitter: f64 },
}

impl Default for TieBreak {
    fn default() -> Self {
        Self::Seeded {
            seed: 0x5eed,
            max_jitter: 10.0,
        }
    }
}

/// Policy knobs that auto-tuning leaves alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub spatial_grid_size: f64,
    pub min_cluster_members: usize,
    pub tie_break: TieBreak,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            spatial_grid_size: 50.0,
            min_cluster_members: 3,
            tie_break: TieBreak::default(),
        }
    }
}

impl EngineSettings {
    pub fn deterministic() -> Self {
        Self {
            tie_break: TieBreak::Disabled,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.spatial_grid_size.is_finite() || self.spatial_grid_size <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "spatial_grid_size",
            });
        }

        if let TieBreak::Seeded { max_jitter, .. } = self.tie_break
            && (!max_jitter.is_finite() || max_jitter < 0.0)
        {
            return Err(ConfigError::InvalidJitter(max_jitter));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub performance: PerformanceConfig,
    pub engine: EngineSettings,
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid engine config JSON in {}", path.display()))?;

        config
            .performance
            .validate()
            .with_context(|| format!("invalid performance budgets in {}", path.display()))?;
        config
            .engine
            .validate()
            .with_context(|| format!("invalid engine settings in {}", path.display()))?;

        Ok(config)
    }
}
