mod model;
mod parse;
mod snapshot;
mod synthetic;

pub use model::{
    CLUSTER_ID_PREFIX, EdgeKind, GraphEdge, GraphNode, NodeKind, NodeStatus, ViewportBounds,
};
pub use parse::{load_snapshot, parse_snapshot};
pub use snapshot::{GraphSnapshot, IngestReport};
pub use synthetic::generate_topology;
