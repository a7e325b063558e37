use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::config::PerformanceConfig;
use super::monitor::{PerformanceMetrics, Recommendation};
use super::tuning::DeviceProfile;

/// Bumped whenever a field is renamed or removed.
pub const DIAGNOSTIC_SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SelectionDiagnostics {
    pub generation: u64,
    pub snapshot_version: u64,
    pub candidate_nodes: usize,
    pub admitted_nodes: usize,
    pub clustered_nodes: usize,
    pub dropped_edges: usize,
    pub capped_edges: usize,
    pub dangling_edges: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HostEnvironment {
    pub hardware_concurrency: Option<usize>,
    pub device_memory_gb: Option<f64>,
    pub is_mobile: bool,
}

impl From<&DeviceProfile> for HostEnvironment {
    fn from(device: &DeviceProfile) -> Self {
        Self {
            hardware_concurrency: device.hardware_concurrency,
            device_memory_gb: device.device_memory_gb,
            is_mobile: device.is_mobile,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiagnosticReport {
    pub schema_version: u32,
    pub generated_at_ms: u64,
    pub config: PerformanceConfig,
    pub metrics: PerformanceMetrics,
    pub environment: HostEnvironment,
    pub selection: SelectionDiagnostics,
    pub recommendations: Vec<Recommendation>,
}

impl DiagnosticReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize diagnostic report")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json)
            .with_context(|| format!("failed to write diagnostic report to {}", path.display()))
    }
}
