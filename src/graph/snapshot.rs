use std::collections::HashMap;

use log::warn;
use serde::Serialize;

use super::model::{CLUSTER_ID_PREFIX, GraphEdge, GraphNode};

/// Anomalies found while ingesting a snapshot. None of them are fatal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub rejected_nodes: usize,
    pub discarded_values: usize,
    pub dangling_edges: usize,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Immutable, versioned view of the graph handed over by the data provider.
#[derive(Clone, Debug)]
pub struct GraphSnapshot {
    version: u64,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index_by_id: HashMap<String, usize>,
    report: IngestReport,
}

impl GraphSnapshot {
    pub fn new(version: u64, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let mut report = IngestReport::default();
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        let mut accepted = Vec::with_capacity(nodes.len());

        for mut node in nodes {
            if node.id.is_empty() || node.id.starts_with(CLUSTER_ID_PREFIX) {
                warn!("rejecting node with reserved or empty id {:?}", node.id);
                report.rejected_nodes += 1;
                continue;
            }

            if index_by_id.contains_key(&node.id) {
                warn!("rejecting duplicate node id {:?}", node.id);
                report.rejected_nodes += 1;
                continue;
            }

            let before = node.properties.len();
            node.properties.retain(|_, value| value.is_finite());
            report.discarded_values += before - node.properties.len();

            if node.magnitude.is_some_and(|magnitude| !magnitude.is_finite()) {
                node.magnitude = None;
                report.discarded_values += 1;
            }

            node.priority = 0.0;
            index_by_id.insert(node.id.clone(), accepted.len());
            accepted.push(node);
        }

        for edge in &edges {
            if !index_by_id.contains_key(&edge.source) || !index_by_id.contains_key(&edge.target) {
                report.dangling_edges += 1;
            }
        }

        if report.dangling_edges > 0 {
            warn!(
                "snapshot v{version}: {} of {} edges reference missing nodes",
                report.dangling_edges,
                edges.len()
            );
        }
        if report.discarded_values > 0 {
            warn!(
                "snapshot v{version}: discarded {} non-finite numeric values",
                report.discarded_values
            );
        }

        Self {
            version,
            nodes: accepted,
            edges,
            index_by_id,
            report,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn report(&self) -> IngestReport {
        self.report
    }
}
