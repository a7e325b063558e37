use std::collections::HashMap;

use crate::graph::{GraphNode, ViewportBounds};
use crate::util::stable_unit_pair;

use super::error::ConfigError;

/// Side of the square that pseudo-positions are spread over.
pub const WORLD_EXTENT: f64 = 1000.0;

pub type BucketKey = (i64, i64);

/// Placement derived from the id alone, independent of the rendered layout.
pub fn pseudo_position(id: &str) -> (f64, f64) {
    let (x, y) = stable_unit_pair(id);
    (x * WORLD_EXTENT, y * WORLD_EXTENT)
}

pub fn bucket_key(position: (f64, f64), grid_size: f64) -> BucketKey {
    (
        (position.0 / grid_size).floor() as i64,
        (position.1 / grid_size).floor() as i64,
    )
}

pub fn world_bounds() -> ViewportBounds {
    ViewportBounds::new(0.0, 0.0, WORLD_EXTENT, WORLD_EXTENT)
}

/// Uniform grid over node pseudo-positions. Entries are indices into the snapshot's node list.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    grid_size: f64,
    version: Option<u64>,
    positions: Vec<(f64, f64)>,
    buckets: HashMap<BucketKey, Vec<usize>>,
}

impl SpatialIndex {
    pub fn new(grid_size: f64) -> Result<Self, ConfigError> {
        if !grid_size.is_finite() || grid_size <= 0.0 {
            return Err(ConfigError::NonPositive { field: "grid_size" });
        }

        Ok(Self {
            grid_size,
            version: None,
            positions: Vec::new(),
            buckets: HashMap::new(),
        })
    }

    pub fn build(nodes: &[GraphNode], grid_size: f64) -> Result<Self, ConfigError> {
        Ok(Self::new(grid_size)?.rebuilt(None, nodes))
    }

    /// Fresh index over `nodes` with the same grid; the caller swaps it in whole.
    pub fn rebuilt(&self, version: Option<u64>, nodes: &[GraphNode]) -> Self {
        let mut positions = Vec::with_capacity(nodes.len());
        let mut buckets: HashMap<BucketKey, Vec<usize>> = HashMap::new();

        for (index, node) in nodes.iter().enumerate() {
            let position = pseudo_position(&node.id);
            positions.push(position);
            buckets
                .entry(bucket_key(position, self.grid_size))
                .or_default()
                .push(index);
        }

        Self {
            grid_size: self.grid_size,
            version,
            positions,
            buckets,
        }
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn position(&self, index: usize) -> Option<(f64, f64)> {
        self.positions.get(index).copied()
    }

    /// Every node in a bucket touching the viewport's bucket range. May include nodes
    /// slightly outside the rectangle.
    pub fn query(&self, viewport: &ViewportBounds) -> Vec<usize> {
        let viewport = viewport.normalized();
        let (min_x, min_y) = bucket_key((viewport.x1, viewport.y1), self.grid_size);
        let (max_x, max_y) = bucket_key((viewport.x2, viewport.y2), self.grid_size);

        let span_x = max_x.saturating_sub(min_x).saturating_add(1) as u128;
        let span_y = max_y.saturating_sub(min_y).saturating_add(1) as u128;

        let mut matches = Vec::new();
        if span_x.saturating_mul(span_y) > self.buckets.len() as u128 {
            for (&(x, y), indices) in &self.buckets {
                if (min_x..=max_x).contains(&x) && (min_y..=max_y).contains(&y) {
                    matches.extend_from_slice(indices);
                }
            }
        } else {
            for x in min_x..=max_x {
                for y in min_y..=max_y {
                    if let Some(indices) = self.buckets.get(&(x, y)) {
                        matches.extend_from_slice(indices);
                    }
                }
            }
        }

        matches.sort_unstable();
        matches
    }

    pub fn query_exact(&self, viewport: &ViewportBounds) -> Vec<usize> {
        let viewport = viewport.normalized();
        let mut matches = self.query(&viewport);
        matches.retain(|&index| {
            self.positions
                .get(index)
                .is_some_and(|&(x, y)| viewport.contains(x, y))
        });
        matches
    }
}
