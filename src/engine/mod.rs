mod batch;
mod cluster;
mod config;
mod diagnostics;
mod edges;
mod error;
mod lod;
mod monitor;
mod priority;
mod spatial;
mod tuning;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tokio::sync::watch;

use crate::graph::{GraphEdge, GraphNode, GraphSnapshot, ViewportBounds};
use crate::util::unix_millis;

pub use batch::{BatchOutcome, CancelSignal, Throttle, render_in_batches};
pub use cluster::{ClusterNode, ClusterOutcome, cluster_grid_size, cluster_id, cluster_nodes};
pub use config::{EngineConfig, EngineSettings, LodThreshold, PerformanceConfig, TieBreak};
pub use diagnostics::{
    DIAGNOSTIC_SCHEMA_VERSION, DiagnosticReport, HostEnvironment, SelectionDiagnostics,
};
pub use edges::{EdgeSelection, edge_budget, edge_importance, edge_type_weight, select_edges};
pub use error::ConfigError;
pub use lod::LodSelector;
pub use monitor::{FpsSummary, PerformanceMetrics, PerformanceMonitor, Recommendation};
pub use priority::{
    NodePrioritizer, base_priority, magnitude_weight, status_weight, type_weight,
};
pub use spatial::{
    BucketKey, SpatialIndex, WORLD_EXTENT, bucket_key, pseudo_position, world_bounds,
};
pub use tuning::{DeviceProfile, DeviceTier, tune_config};

/// Output of one selection pass, ready for the rendering surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    pub generation: u64,
    pub visible_nodes: Vec<GraphNode>,
    pub visible_edges: Vec<GraphEdge>,
    pub clusters: Vec<ClusterNode>,
    pub diagnostics: SelectionDiagnostics,
    pub elapsed: Duration,
}

/// Nodes and clusters share one id space, so the renderer can treat them alike.
#[derive(Clone, Copy, Debug)]
pub enum VisibleEntity<'a> {
    Node(&'a GraphNode),
    Cluster(&'a ClusterNode),
}

impl VisibleEntity<'_> {
    pub fn id(&self) -> &str {
        match self {
            Self::Node(node) => &node.id,
            Self::Cluster(cluster) => &cluster.id,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        match self {
            Self::Node(node) => pseudo_position(&node.id),
            Self::Cluster(cluster) => cluster.center(),
        }
    }
}

impl Selection {
    pub fn entities(&self) -> impl Iterator<Item = VisibleEntity<'_>> {
        self.clusters
            .iter()
            .map(VisibleEntity::Cluster)
            .chain(self.visible_nodes.iter().map(VisibleEntity::Node))
    }

    pub fn entity_count(&self) -> usize {
        self.clusters.len() + self.visible_nodes.len()
    }
}

/// One engine per graph view. All selection state is owned here and mutated only by `select`.
pub struct Engine {
    config: PerformanceConfig,
    /// Budgets as configured, before any device scaling.
    base_config: PerformanceConfig,
    settings: EngineSettings,
    lod: LodSelector,
    prioritizer: NodePrioritizer,
    index: SpatialIndex,
    monitor: PerformanceMonitor,
    device: DeviceProfile,
    generation: u64,
    generation_tx: watch::Sender<u64>,
    last_diagnostics: SelectionDiagnostics,
}

impl Engine {
    pub fn new(config: PerformanceConfig, settings: EngineSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let lod = LodSelector::new(&config)?;
        let prioritizer = NodePrioritizer::new(settings.tie_break)?;
        let index = SpatialIndex::new(settings.spatial_grid_size)?;
        let (generation_tx, _) = watch::channel(0);

        Ok(Self {
            base_config: config.clone(),
            config,
            settings,
            lod,
            prioritizer,
            index,
            monitor: PerformanceMonitor::new(),
            device: DeviceProfile::default(),
            generation: 0,
            generation_tx,
            last_diagnostics: SelectionDiagnostics::default(),
        })
    }

    pub fn from_config(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::new(config.performance, config.engine)
    }

    pub fn config(&self) -> &PerformanceConfig {
        &self.config
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Swaps in a new budget set and makes it the base for later auto-tuning.
    /// The previous one stays active on error.
    pub fn set_config(&mut self, config: PerformanceConfig) -> Result<(), ConfigError> {
        self.activate(config.clone())?;
        self.base_config = config;
        Ok(())
    }

    fn activate(&mut self, config: PerformanceConfig) -> Result<(), ConfigError> {
        self.lod = LodSelector::new(&config)?;
        self.config = config;
        Ok(())
    }

    pub fn lod_budget(&self, zoom: f64) -> usize {
        self.lod.budget(zoom)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fires once a later `select` call starts.
    pub fn cancel_signal(&self) -> CancelSignal {
        CancelSignal::new(self.generation_tx.subscribe(), self.generation)
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    pub fn record_frame(&mut self, now: Instant) -> Option<f64> {
        self.monitor.record_frame(now)
    }

    /// Call when frame delivery pauses so the gap is not read as slow frames.
    pub fn reset_frame_window(&mut self) {
        self.monitor.reset_window();
    }

    pub fn record_render(&mut self, duration: Duration, selection: &Selection) {
        self.monitor.record_render(
            duration,
            selection.visible_nodes.len(),
            selection.visible_edges.len(),
            selection.clusters.len(),
        );
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    pub fn last_diagnostics(&self) -> SelectionDiagnostics {
        self.last_diagnostics
    }

    /// Rescales the configured budgets for `device` and makes the result the active config.
    /// Always scales from the last config passed to `new` or `set_config`, so repeated
    /// calls do not compound.
    pub fn auto_tune(&mut self, device: &DeviceProfile) -> DeviceTier {
        let (tuned, tier) = tune_config(&self.base_config, device);
        self.device = device.clone();

        match self.activate(tuned) {
            Ok(()) => info!(
                "auto-tuned for {tier:?} device (x{}): {} nodes, {} edges, batches of {}",
                tier.multiplier(),
                self.config.max_visible_nodes,
                self.config.max_visible_edges,
                self.config.render_batch_size
            ),
            Err(error) => warn!("auto-tune produced an invalid config, keeping previous: {error}"),
        }

        tier
    }

    fn ensure_index(&mut self, snapshot: &GraphSnapshot) {
        let current = self.index.version() == Some(snapshot.version())
            && self.index.len() == snapshot.node_count();
        if current {
            return;
        }

        let started = Instant::now();
        let rebuilt = self.index.rebuilt(Some(snapshot.version()), snapshot.nodes());
        self.index = rebuilt;
        debug!(
            "spatial index rebuilt for snapshot v{}: {} nodes in {} buckets ({:.1} ms)",
            snapshot.version(),
            self.index.len(),
            self.index.bucket_count(),
            started.elapsed().as_secs_f64() * 1000.0
        );
    }

    /// Runs one selection pass. Never fails; anomalies show up in the diagnostics.
    pub fn select(
        &mut self,
        snapshot: &GraphSnapshot,
        zoom: f64,
        viewport: ViewportBounds,
    ) -> Selection {
        let started = Instant::now();
        self.generation += 1;
        self.generation_tx.send_replace(self.generation);

        self.ensure_index(snapshot);

        let candidates = self.index.query_exact(&viewport.normalized());
        let budget = self.lod.budget(zoom);
        let admitted = self.prioritizer.admit(snapshot.nodes(), &candidates, budget);
        let admitted_count = admitted.len();

        let outcome = if admitted_count > self.config.clustering_threshold {
            cluster_nodes(admitted, zoom, self.settings.min_cluster_members)
        } else {
            ClusterOutcome {
                clusters: Vec::new(),
                remaining_nodes: admitted,
            }
        };
        let clustered_nodes = outcome.clustered_node_count();

        let visible_ids = outcome
            .remaining_nodes
            .iter()
            .map(|node| node.id.as_str())
            .collect::<HashSet<_>>();
        let edges = select_edges(
            snapshot.edges(),
            &visible_ids,
            zoom,
            self.config.max_visible_edges,
        );

        let diagnostics = SelectionDiagnostics {
            generation: self.generation,
            snapshot_version: snapshot.version(),
            candidate_nodes: candidates.len(),
            admitted_nodes: admitted_count,
            clustered_nodes,
            dropped_edges: edges.dropped,
            capped_edges: edges.capped,
            dangling_edges: snapshot.report().dangling_edges,
        };
        self.last_diagnostics = diagnostics;

        let elapsed = started.elapsed();
        debug!(
            "selection #{} at zoom {zoom:.3}: {} candidates, budget {budget}, {} nodes, {} clusters, {} edges ({} dropped, {} capped) in {:.2} ms",
            self.generation,
            candidates.len(),
            outcome.remaining_nodes.len(),
            outcome.clusters.len(),
            edges.edges.len(),
            edges.dropped,
            edges.capped,
            elapsed.as_secs_f64() * 1000.0
        );

        Selection {
            generation: self.generation,
            visible_nodes: outcome.remaining_nodes,
            visible_edges: edges.edges,
            clusters: outcome.clusters,
            diagnostics,
            elapsed,
        }
    }

    pub fn is_current(&self, selection: &Selection) -> bool {
        selection.generation == self.generation
    }

    pub fn diagnostic_report(&self) -> DiagnosticReport {
        DiagnosticReport {
            schema_version: DIAGNOSTIC_SCHEMA_VERSION,
            generated_at_ms: unix_millis(),
            config: self.config.clone(),
            metrics: self.monitor.metrics().clone(),
            environment: HostEnvironment::from(&self.device),
            selection: self.last_diagnostics,
            recommendations: self.monitor.recommendations(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, NodeKind, NodeStatus};

    fn deterministic_engine(config: PerformanceConfig) -> Engine {
        Engine::new(config, EngineSettings::deterministic()).expect("valid config")
    }

    #[test]
    fn admission_follows_priority_and_drops_orphaned_edges() {
        let nodes = vec![
            GraphNode::new("region", NodeKind::Region).with_status(NodeStatus::Critical),
            GraphNode::new("service", NodeKind::Service).with_status(NodeStatus::Warning),
            GraphNode::new("pod", NodeKind::Pod).with_status(NodeStatus::Healthy),
        ];
        let edges = vec![
            GraphEdge::new("e1", "region", "service", EdgeKind::Contains),
            GraphEdge::new("e2", "service", "pod", EdgeKind::Contains),
        ];
        let snapshot = GraphSnapshot::new(1, nodes, edges);

        let config = PerformanceConfig {
            lod_thresholds: vec![LodThreshold::new(0.1, 2)],
            ..PerformanceConfig::default()
        };
        let mut engine = deterministic_engine(config);
        let selection = engine.select(&snapshot, 1.0, world_bounds());

        let ids = selection
            .visible_nodes
            .iter()
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["region", "service"]);
        assert_eq!(selection.visible_edges.len(), 1);
        assert_eq!(selection.visible_edges[0].id, "e1");
        assert_eq!(selection.diagnostics.dropped_edges, 1);
        assert_eq!(selection.diagnostics.candidate_nodes, 3);
        assert_eq!(selection.diagnostics.admitted_nodes, 2);
    }

    #[test]
    fn generations_advance_and_cancel_older_passes() {
        let snapshot = GraphSnapshot::new(
            1,
            vec![GraphNode::new("only", NodeKind::Service)],
            Vec::new(),
        );
        let mut engine = deterministic_engine(PerformanceConfig::default());

        let first = engine.select(&snapshot, 1.0, world_bounds());
        let signal = engine.cancel_signal();
        assert!(!signal.is_cancelled());
        assert_eq!(signal.generation(), first.generation);

        let second = engine.select(&snapshot, 1.0, world_bounds());
        assert!(signal.is_cancelled());
        assert!(second.generation > first.generation);
        assert!(!engine.is_current(&first));
        assert!(engine.is_current(&second));
    }

    #[test]
    fn index_rebuilds_on_new_snapshot_version() {
        let mut engine = deterministic_engine(PerformanceConfig::default());
        let first = GraphSnapshot::new(1, vec![GraphNode::new("a", NodeKind::Pod)], Vec::new());
        engine.select(&first, 1.0, world_bounds());
        assert_eq!(engine.index.version(), Some(1));
        assert_eq!(engine.index.len(), 1);

        let second = GraphSnapshot::new(
            2,
            vec![
                GraphNode::new("a", NodeKind::Pod),
                GraphNode::new("b", NodeKind::Pod),
            ],
            Vec::new(),
        );
        let selection = engine.select(&second, 1.0, world_bounds());
        assert_eq!(engine.index.version(), Some(2));
        assert_eq!(selection.visible_nodes.len(), 2);
    }

    #[test]
    fn auto_tune_replaces_active_config() {
        let mut engine = deterministic_engine(PerformanceConfig::default());
        let device = DeviceProfile {
            hardware_concurrency: Some(2),
            device_memory_gb: Some(4.0),
            is_mobile: true,
        };

        assert_eq!(engine.auto_tune(&device), DeviceTier::LowEnd);
        assert_eq!(engine.config().max_visible_nodes, 5_000);
        assert_eq!(engine.lod_budget(5.0), 5_000);

        let report = engine.diagnostic_report();
        assert_eq!(report.environment.hardware_concurrency, Some(2));
        assert!(report.environment.is_mobile);
        assert_eq!(report.config.render_batch_size, 250);
    }

    #[test]
    fn repeated_auto_tune_does_not_compound() {
        let mut engine = deterministic_engine(PerformanceConfig::default());
        let device = DeviceProfile {
            hardware_concurrency: Some(2),
            device_memory_gb: None,
            is_mobile: true,
        };

        engine.auto_tune(&device);
        let first = engine.config().clone();
        engine.auto_tune(&device);
        engine.auto_tune(&device);

        assert_eq!(engine.config(), &first);
        assert_eq!(engine.config().max_visible_nodes, 5_000);
        assert_eq!(engine.config().render_batch_size, 250);

        let workstation = DeviceProfile {
            hardware_concurrency: Some(16),
            ..DeviceProfile::default()
        };
        assert_eq!(engine.auto_tune(&workstation), DeviceTier::HighEnd);
        assert_eq!(engine.config().max_visible_nodes, 15_000);
    }

    #[test]
    fn set_config_becomes_the_tuning_base() {
        let mut engine = deterministic_engine(PerformanceConfig::default());
        let device = DeviceProfile {
            is_mobile: true,
            ..DeviceProfile::default()
        };
        engine.auto_tune(&device);

        let custom = PerformanceConfig {
            max_visible_nodes: 2_000,
            ..PerformanceConfig::default()
        };
        engine.set_config(custom.clone()).expect("valid config");
        assert_eq!(engine.config(), &custom);

        engine.auto_tune(&device);
        assert_eq!(engine.config().max_visible_nodes, 1_000);
    }

    #[test]
    fn set_config_rejects_invalid_budgets() {
        let mut engine = deterministic_engine(PerformanceConfig::default());
        let invalid = PerformanceConfig {
            lod_thresholds: Vec::new(),
            ..PerformanceConfig::default()
        };
        assert_eq!(engine.set_config(invalid), Err(ConfigError::EmptyLodTable));
        assert_eq!(engine.config(), &PerformanceConfig::default());
    }

    #[test]
    fn entities_expose_clusters_before_nodes() {
        let selection = Selection {
            visible_nodes: vec![GraphNode::new("n1", NodeKind::Pod)],
            clusters: cluster_nodes(
                (0..5)
                    .map(|index| GraphNode::new(format!("p{index}"), NodeKind::Pod))
                    .collect(),
                0.01,
                3,
            )
            .clusters,
            ..Selection::default()
        };

        let ids = selection.entities().map(|entity| entity.id().to_owned()).collect::<Vec<_>>();
        assert_eq!(ids, ["cluster:0:0", "n1"]);
        assert_eq!(selection.entity_count(), 2);
    }
}
