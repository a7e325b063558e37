use std::path::PathBuf;

use anyhow::Result;
use graph_lod::GraphSnapshot;
use graph_lod::graph::{generate_topology, load_snapshot};
use graph_lod::util::format_count;

#[derive(Clone, Debug)]
pub enum SnapshotSource {
    File(PathBuf),
    Synthetic { node_count: usize, seed: u64 },
}

impl SnapshotSource {
    pub fn load(&self) -> Result<GraphSnapshot> {
        match self {
            Self::File(path) => load_snapshot(path),
            Self::Synthetic { node_count, seed } => Ok(generate_topology(*node_count, *seed)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Synthetic { node_count, seed } => {
                format!("synthetic {} nodes (seed {seed})", format_count(*node_count))
            }
        }
    }
}
