use std::collections::{HashMap, HashSet};

use graph_lod::engine::{
    LodThreshold, TieBreak, bucket_key, cluster_grid_size, edge_budget, pseudo_position,
    world_bounds,
};
use graph_lod::graph::{EdgeKind, NodeKind, NodeStatus, generate_topology};
use graph_lod::{
    Engine, EngineSettings, GraphEdge, GraphNode, GraphSnapshot, PerformanceConfig, Selection,
    ViewportBounds,
};

const ZOOMS: [f64; 9] = [0.01, 0.1, 0.25, 0.5, 0.8, 1.0, 1.7, 2.5, 6.0];

fn deterministic_engine(config: PerformanceConfig) -> Engine {
    Engine::new(config, EngineSettings::deterministic()).expect("valid config")
}

fn ids(selection: &Selection) -> (Vec<String>, Vec<String>, Vec<String>) {
    (
        selection.visible_nodes.iter().map(|node| node.id.clone()).collect(),
        selection.visible_edges.iter().map(|edge| edge.id.clone()).collect(),
        selection.clusters.iter().map(|cluster| cluster.id.clone()).collect(),
    )
}

#[test]
fn visible_nodes_never_exceed_budget() {
    let snapshot = generate_topology(20_000, 3);
    let config = PerformanceConfig {
        max_visible_nodes: 4_000,
        ..PerformanceConfig::default()
    };
    let mut engine = deterministic_engine(config.clone());

    for zoom in ZOOMS {
        let selection = engine.select(&snapshot, zoom, world_bounds());
        assert!(selection.visible_nodes.len() <= engine.lod_budget(zoom));
        assert!(selection.visible_nodes.len() <= config.max_visible_nodes);
        assert!(selection.diagnostics.admitted_nodes <= engine.lod_budget(zoom));
    }
}

#[test]
fn visible_edges_connect_visible_nodes() {
    let snapshot = generate_topology(15_000, 8);
    let mut engine = deterministic_engine(PerformanceConfig::default());

    for zoom in ZOOMS {
        let selection = engine.select(&snapshot, zoom, world_bounds());
        let visible = selection
            .visible_nodes
            .iter()
            .map(|node| node.id.as_str())
            .collect::<HashSet<_>>();

        for edge in &selection.visible_edges {
            assert!(visible.contains(edge.source.as_str()), "{} source hidden", edge.id);
            assert!(visible.contains(edge.target.as_str()), "{} target hidden", edge.id);
        }
        assert!(
            selection.visible_edges.len()
                <= edge_budget(engine.config().max_visible_edges, zoom)
        );
    }
}

#[test]
fn clusters_and_visible_nodes_partition_admitted_set() {
    let snapshot = generate_topology(30_000, 21);
    let config = PerformanceConfig {
        clustering_threshold: 200,
        ..PerformanceConfig::default()
    };
    let mut engine = deterministic_engine(config);

    let selection = engine.select(&snapshot, 2.0, world_bounds());
    assert!(!selection.clusters.is_empty());

    let mut seen = HashSet::new();
    for member in selection.clusters.iter().flat_map(|cluster| &cluster.members) {
        assert!(seen.insert(member.id.clone()), "{} appears twice", member.id);
    }
    for node in &selection.visible_nodes {
        assert!(seen.insert(node.id.clone()), "{} appears twice", node.id);
    }
    assert_eq!(seen.len(), selection.diagnostics.admitted_nodes);
    assert_eq!(
        selection.diagnostics.clustered_nodes + selection.visible_nodes.len(),
        selection.diagnostics.admitted_nodes
    );

    let node_ids = snapshot
        .nodes()
        .iter()
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();
    for cluster in &selection.clusters {
        assert!(cluster.id.starts_with("cluster:"));
        assert!(!node_ids.contains(cluster.id.as_str()));
    }
}

#[test]
fn passes_are_deterministic_without_jitter() {
    let snapshot = generate_topology(12_000, 99);
    let config = PerformanceConfig {
        clustering_threshold: 300,
        ..PerformanceConfig::default()
    };
    let viewport = ViewportBounds::new(100.0, 150.0, 850.0, 900.0);

    for zoom in ZOOMS {
        let first = deterministic_engine(config.clone()).select(&snapshot, zoom, viewport);
        let mut engine = deterministic_engine(config.clone());
        engine.select(&snapshot, zoom * 0.5, viewport);
        let second = engine.select(&snapshot, zoom, viewport);

        assert_eq!(ids(&first), ids(&second), "zoom {zoom}");
        assert_eq!(first.clusters, second.clusters);
    }
}

#[test]
fn seeded_jitter_is_reproducible_across_engines() {
    let snapshot = generate_topology(5_000, 4);
    let settings = EngineSettings {
        tie_break: TieBreak::Seeded {
            seed: 17,
            max_jitter: 10.0,
        },
        ..EngineSettings::default()
    };

    let mut first = Engine::new(PerformanceConfig::default(), settings.clone()).expect("valid");
    let mut second = Engine::new(PerformanceConfig::default(), settings).expect("valid");
    assert_eq!(
        ids(&first.select(&snapshot, 0.8, world_bounds())),
        ids(&second.select(&snapshot, 0.8, world_bounds()))
    );
}

#[test]
fn edge_cap_never_shrinks_as_zoom_grows() {
    let mut previous = 0;
    for step in 1..=40 {
        let cap = edge_budget(PerformanceConfig::default().max_visible_edges, step as f64 * 0.05);
        assert!(cap >= previous);
        previous = cap;
    }
}

#[test]
fn lod_threshold_scenario() {
    let config = PerformanceConfig {
        max_visible_nodes: 100_000,
        lod_thresholds: vec![
            LodThreshold::new(0.1, 50),
            LodThreshold::new(1.0, 1_000),
            LodThreshold::new(3.0, 15_000),
        ],
        ..PerformanceConfig::default()
    };
    let engine = deterministic_engine(config);

    assert_eq!(engine.lod_budget(0.5), 50);
    assert_eq!(engine.lod_budget(1.0), 1_000);
    assert_eq!(engine.lod_budget(5.0), 15_000);
}

#[test]
fn ten_co_bucketed_nodes_form_one_cluster() {
    let zoom = 1.0;
    let grid = cluster_grid_size(zoom);

    let mut by_bucket: HashMap<(i64, i64), Vec<String>> = HashMap::new();
    let mut members = None;
    for index in 0..200_000 {
        let id = format!("pod-{index}");
        let bucket = by_bucket
            .entry(bucket_key(pseudo_position(&id), grid))
            .or_default();
        bucket.push(id);
        if bucket.len() == 10 {
            members = Some(bucket.clone());
            break;
        }
    }
    let members = members.expect("some bucket fills up");

    let nodes = members
        .iter()
        .enumerate()
        .map(|(index, id)| {
            GraphNode::new(id.clone(), NodeKind::Pod)
                .with_property("cpu", index as f64 + 0.5)
                .with_property("cost", 100.0)
        })
        .collect::<Vec<_>>();
    let snapshot = GraphSnapshot::new(1, nodes, Vec::new());

    let config = PerformanceConfig {
        clustering_threshold: 5,
        ..PerformanceConfig::default()
    };
    let mut engine = deterministic_engine(config);
    let selection = engine.select(&snapshot, zoom, world_bounds());

    assert_eq!(selection.clusters.len(), 1);
    assert!(selection.visible_nodes.is_empty());

    let cluster = &selection.clusters[0];
    assert_eq!(cluster.members.len(), 10);
    assert_eq!(cluster.label, "10 pods");
    assert_eq!(cluster.aggregated_metrics.get("cpu"), Some(&50.0));
    assert_eq!(cluster.aggregated_metrics.get("cost"), Some(&1_000.0));
}

#[test]
fn edge_to_node_cut_by_admission_is_counted() {
    let nodes = vec![
        GraphNode::new("db", NodeKind::Database).with_status(NodeStatus::Critical),
        GraphNode::new("api", NodeKind::Service).with_status(NodeStatus::Warning),
        GraphNode::new("pod", NodeKind::Pod),
    ];
    let edges = vec![
        GraphEdge::new("api->db", "api", "db", EdgeKind::DependsOn),
        GraphEdge::new("api->pod", "api", "pod", EdgeKind::Contains),
    ];
    let snapshot = GraphSnapshot::new(1, nodes, edges);

    let config = PerformanceConfig {
        lod_thresholds: vec![LodThreshold::new(0.1, 2)],
        ..PerformanceConfig::default()
    };
    let mut engine = deterministic_engine(config);
    let selection = engine.select(&snapshot, 1.0, world_bounds());

    assert!(!selection.visible_nodes.iter().any(|node| node.id == "pod"));
    assert!(!selection.visible_edges.iter().any(|edge| edge.id == "api->pod"));
    assert_eq!(selection.diagnostics.dropped_edges, 1);
    assert_eq!(engine.last_diagnostics().dropped_edges, 1);
}

#[test]
fn dangling_edges_are_reported_not_rendered() {
    let nodes = vec![
        GraphNode::new("a", NodeKind::Service),
        GraphNode::new("b", NodeKind::Service),
    ];
    let edges = vec![
        GraphEdge::new("ok", "a", "b", EdgeKind::ConnectsTo),
        GraphEdge::new("late", "a", "not-yet-loaded", EdgeKind::Critical),
    ];
    let snapshot = GraphSnapshot::new(4, nodes, edges);
    let mut engine = deterministic_engine(PerformanceConfig::default());
    let selection = engine.select(&snapshot, 1.0, world_bounds());

    assert_eq!(selection.visible_edges.len(), 1);
    assert_eq!(selection.diagnostics.dangling_edges, 1);
    assert_eq!(selection.diagnostics.dropped_edges, 1);
}

#[test]
fn viewport_restricts_candidates() {
    let snapshot = generate_topology(10_000, 2);
    let mut engine = deterministic_engine(PerformanceConfig::default());
    let viewport = ViewportBounds::new(500.0, 500.0, 250.0, 250.0);

    let selection = engine.select(&snapshot, 6.0, viewport);
    assert!(selection.diagnostics.candidate_nodes < snapshot.node_count());
    for node in &selection.visible_nodes {
        let (x, y) = pseudo_position(&node.id);
        assert!(viewport.contains(x, y));
    }
}
