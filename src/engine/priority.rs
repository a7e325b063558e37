use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::graph::{GraphNode, NodeKind, NodeStatus};

use super::config::TieBreak;
use super::error::ConfigError;

const TYPE_FACTOR: f64 = 0.4;
const STATUS_FACTOR: f64 = 0.3;
const MAGNITUDE_FACTOR: f64 = 0.2;

pub fn type_weight(kind: &NodeKind) -> f64 {
    match kind {
        NodeKind::Region => 100.0,
        NodeKind::Zone => 95.0,
        NodeKind::Cluster => 90.0,
        NodeKind::Namespace => 85.0,
        NodeKind::Service => 80.0,
        NodeKind::Database => 75.0,
        NodeKind::Instance => 70.0,
        NodeKind::Pod => 60.0,
        NodeKind::Other(_) => 50.0,
    }
}

pub fn status_weight(status: NodeStatus) -> f64 {
    match status {
        NodeStatus::Critical => 100.0,
        NodeStatus::Warning => 80.0,
        NodeStatus::Degraded => 60.0,
        NodeStatus::Healthy => 40.0,
        NodeStatus::Unknown => 50.0,
    }
}

pub fn magnitude_weight(magnitude: Option<f64>) -> f64 {
    match magnitude {
        None => 0.0,
        Some(value) if value > 100_000.0 => 100.0,
        Some(value) if value > 50_000.0 => 80.0,
        Some(value) if value > 10_000.0 => 60.0,
        Some(value) if value > 1_000.0 => 40.0,
        Some(_) => 20.0,
    }
}

/// Jitter-free score of a node.
pub fn base_priority(node: &GraphNode) -> f64 {
    TYPE_FACTOR * type_weight(&node.kind)
        + STATUS_FACTOR * status_weight(node.status)
        + MAGNITUDE_FACTOR * magnitude_weight(node.magnitude)
}

fn by_priority(a_priority: f64, a_id: &str, b_priority: f64, b_id: &str) -> Ordering {
    b_priority
        .total_cmp(&a_priority)
        .then_with(|| a_id.cmp(b_id))
}

pub struct NodePrioritizer {
    jitter: Option<(StdRng, f64)>,
}

impl NodePrioritizer {
    pub fn new(tie_break: TieBreak) -> Result<Self, ConfigError> {
        let jitter = match tie_break {
            TieBreak::Disabled => None,
            TieBreak::Seeded { max_jitter, .. } if !max_jitter.is_finite() || max_jitter < 0.0 => {
                return Err(ConfigError::InvalidJitter(max_jitter));
            }
            TieBreak::Seeded { max_jitter, .. } if max_jitter == 0.0 => None,
            TieBreak::Seeded { seed, max_jitter } => Some((StdRng::seed_from_u64(seed), max_jitter)),
        };

        Ok(Self { jitter })
    }

    pub fn deterministic() -> Self {
        Self { jitter: None }
    }

    pub fn is_deterministic(&self) -> bool {
        self.jitter.is_none()
    }

    pub fn score(&mut self, node: &GraphNode) -> f64 {
        let base = base_priority(node);
        match self.jitter.as_mut() {
            Some((rng, max_jitter)) => base + rng.gen_range(0.0..*max_jitter),
            None => base,
        }
    }

    /// Scores the candidate indices of `nodes` and clones out the best `budget` of them, ranked.
    pub fn admit(
        &mut self,
        nodes: &[GraphNode],
        candidates: &[usize],
        budget: usize,
    ) -> Vec<GraphNode> {
        if budget == 0 || candidates.is_empty() {
            return Vec::new();
        }

        let mut scored = candidates
            .iter()
            .filter_map(|&index| nodes.get(index).map(|node| (index, self.score(node))))
            .collect::<Vec<_>>();

        let compare = |a: &(usize, f64), b: &(usize, f64)| {
            by_priority(a.1, &nodes[a.0].id, b.1, &nodes[b.0].id)
        };

        if scored.len() > budget {
            scored.select_nth_unstable_by(budget - 1, compare);
            scored.truncate(budget);
        }
        scored.sort_by(compare);

        scored
            .into_iter()
            .map(|(index, priority)| {
                let mut node = nodes[index].clone();
                node.priority = priority;
                node
            })
            .collect()
    }
}
