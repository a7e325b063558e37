//! Level-of-detail engine for very large topology graphs.
//!
//! Decides which nodes and edges of a snapshot are drawn at a given zoom and
//! viewport, collapses dense regions into clusters, and adapts its budgets to
//! the measured frame rate and the host device.

pub mod engine;
pub mod graph;
pub mod util;

pub use engine::{
    ClusterNode, ConfigError, DeviceProfile, Engine, EngineConfig, EngineSettings,
    PerformanceConfig, PerformanceMetrics, Selection,
};
pub use graph::{GraphEdge, GraphNode, GraphSnapshot, ViewportBounds};
