use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::model::{EdgeKind, GraphEdge, GraphNode, NodeKind, NodeStatus};
use super::snapshot::GraphSnapshot;

struct Layer {
    kind: NodeKind,
    share: f64,
    cost_range: (f64, f64),
}

static LAYERS: [Layer; 6] = [
    Layer {
        kind: NodeKind::Region,
        share: 0.0005,
        cost_range: (60_000.0, 400_000.0),
    },
    Layer {
        kind: NodeKind::Cluster,
        share: 0.004,
        cost_range: (8_000.0, 90_000.0),
    },
    Layer {
        kind: NodeKind::Service,
        share: 0.04,
        cost_range: (500.0, 20_000.0),
    },
    Layer {
        kind: NodeKind::Database,
        share: 0.01,
        cost_range: (2_000.0, 60_000.0),
    },
    Layer {
        kind: NodeKind::Instance,
        share: 0.2,
        cost_range: (50.0, 3_000.0),
    },
    Layer {
        kind: NodeKind::Pod,
        share: 1.0,
        cost_range: (1.0, 400.0),
    },
];

fn random_status(rng: &mut StdRng) -> NodeStatus {
    match rng.gen_range(0..100) {
        0..=1 => NodeStatus::Critical,
        2..=6 => NodeStatus::Warning,
        7..=11 => NodeStatus::Degraded,
        12..=14 => NodeStatus::Unknown,
        _ => NodeStatus::Healthy,
    }
}

/// Seeded cloud-topology generator for demos and load tests.
pub fn generate_topology(node_count: usize, seed: u64) -> GraphSnapshot {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut nodes = Vec::with_capacity(node_count);
    let mut edges = Vec::new();
    let mut parents: Vec<String> = Vec::new();

    for layer in &LAYERS {
        let remaining = node_count.saturating_sub(nodes.len());
        if remaining == 0 {
            break;
        }

        let wanted = ((node_count as f64 * layer.share).ceil() as usize).clamp(1, remaining);
        let mut layer_ids = Vec::with_capacity(wanted);

        for index in 0..wanted {
            let id = format!("{}-{index}", layer.kind.label());
            let cost = rng.gen_range(layer.cost_range.0..layer.cost_range.1);
            let node = GraphNode::new(id.clone(), layer.kind.clone())
                .with_status(random_status(&mut rng))
                .with_magnitude(cost)
                .with_property("cost", cost)
                .with_property("cpu", rng.gen_range(0.1..64.0))
                .with_property("memory_gb", rng.gen_range(0.25..256.0));
            nodes.push(node);

            if !parents.is_empty() {
                let parent = &parents[rng.gen_range(0..parents.len())];
                edges.push(GraphEdge::new(
                    format!("contains-{}", edges.len()),
                    parent.clone(),
                    id.clone(),
                    EdgeKind::Contains,
                ));
            }

            layer_ids.push(id);
        }

        if matches!(layer.kind, NodeKind::Region | NodeKind::Cluster | NodeKind::Service) {
            parents = layer_ids;
        }
    }

    let peer_edges = nodes.len() / 2;
    for _ in 0..peer_edges {
        if nodes.len() < 2 {
            break;
        }

        let source = rng.gen_range(0..nodes.len());
        let target = rng.gen_range(0..nodes.len());
        if source == target {
            continue;
        }

        let (kind, weight) = match rng.gen_range(0..20) {
            0 => (EdgeKind::Critical, 1.0),
            1..=8 => (EdgeKind::DependsOn, rng.gen_range(0.5..2.0)),
            _ => (EdgeKind::ConnectsTo, rng.gen_range(0.5..1.5)),
        };
        edges.push(
            GraphEdge::new(
                format!("{}-{}", kind.label(), edges.len()),
                nodes[source].id.clone(),
                nodes[target].id.clone(),
                kind,
            )
            .with_weight(weight),
        );
    }

    GraphSnapshot::new(seed, nodes, edges)
}
