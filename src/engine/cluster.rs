use std::collections::{BTreeMap, HashMap};

use crate::graph::{CLUSTER_ID_PREFIX, GraphNode, NodeKind, ViewportBounds};

use super::spatial::{BucketKey, WORLD_EXTENT, bucket_key, pseudo_position};

const MIN_CLUSTER_GRID: f64 = 10.0;
const CLUSTER_GRID_SCALE: f64 = 50.0;

/// A synthetic entity standing in for the dense bucket it replaces.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterNode {
    pub id: String,
    pub label: String,
    pub members: Vec<GraphNode>,
    pub bounds: ViewportBounds,
    pub aggregated_metrics: BTreeMap<String, f64>,
}

impl ClusterNode {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn center(&self) -> (f64, f64) {
        self.bounds.center()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterOutcome {
    pub clusters: Vec<ClusterNode>,
    pub remaining_nodes: Vec<GraphNode>,
}

impl ClusterOutcome {
    pub fn clustered_node_count(&self) -> usize {
        self.clusters.iter().map(ClusterNode::member_count).sum()
    }
}

/// Finer buckets at higher zoom, never below 10 units.
pub fn cluster_grid_size(zoom: f64) -> f64 {
    if zoom.is_nan() || zoom <= 0.0 {
        return WORLD_EXTENT;
    }
    (CLUSTER_GRID_SCALE / zoom).floor().max(MIN_CLUSTER_GRID)
}

pub fn cluster_id(key: BucketKey) -> String {
    format!("{CLUSTER_ID_PREFIX}{}:{}", key.0, key.1)
}

fn dominant_kind(members: &[GraphNode]) -> Option<&NodeKind> {
    let mut counts: BTreeMap<&NodeKind, usize> = BTreeMap::new();
    for member in members {
        *counts.entry(&member.kind).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(kind, _)| kind)
}

fn cluster_label(members: &[GraphNode]) -> String {
    match dominant_kind(members) {
        Some(kind) if members.len() == 1 => format!("1 {kind}"),
        Some(kind) => format!("{} {}", members.len(), kind.plural()),
        None => "empty cluster".to_owned(),
    }
}

fn build_cluster(key: BucketKey, members: Vec<GraphNode>) -> ClusterNode {
    let mut aggregated_metrics = BTreeMap::new();
    let mut bounds: Option<ViewportBounds> = None;

    for member in &members {
        for (name, value) in &member.properties {
            *aggregated_metrics.entry(name.clone()).or_insert(0.0) += value;
        }

        let (x, y) = pseudo_position(&member.id);
        bounds = Some(match bounds {
            Some(mut current) => {
                current.include_point(x, y);
                current
            }
            None => ViewportBounds::around_point(x, y),
        });
    }

    ClusterNode {
        id: cluster_id(key),
        label: cluster_label(&members),
        bounds: bounds.unwrap_or_else(|| ViewportBounds::around_point(0.0, 0.0)),
        aggregated_metrics,
        members,
    }
}

/// Buckets `nodes` on a zoom-dependent grid. Buckets with more than `min_members`
/// nodes collapse into a cluster; the rest pass through in their input order.
pub fn cluster_nodes(nodes: Vec<GraphNode>, zoom: f64, min_members: usize) -> ClusterOutcome {
    let grid_size = cluster_grid_size(zoom);

    let mut buckets: HashMap<BucketKey, Vec<(usize, GraphNode)>> = HashMap::new();
    for (order, node) in nodes.into_iter().enumerate() {
        let key = bucket_key(pseudo_position(&node.id), grid_size);
        buckets.entry(key).or_default().push((order, node));
    }

    let mut keys = buckets.keys().copied().collect::<Vec<_>>();
    keys.sort_unstable();

    let mut clusters = Vec::new();
    let mut remaining = Vec::new();
    for key in keys {
        let Some(bucket) = buckets.remove(&key) else {
            continue;
        };

        if bucket.len() > min_members {
            let members = bucket.into_iter().map(|(_, node)| node).collect();
            clusters.push(build_cluster(key, members));
        } else {
            remaining.extend(bucket);
        }
    }

    remaining.sort_unstable_by_key(|(order, _)| *order);

    ClusterOutcome {
        clusters,
        remaining_nodes: remaining.into_iter().map(|(_, node)| node).collect(),
    }
}
