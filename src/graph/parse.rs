use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use super::model::{GraphEdge, GraphNode};
use super::snapshot::GraphSnapshot;

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    version: u64,
    nodes: Vec<GraphNode>,
    #[serde(default)]
    edges: Vec<GraphEdge>,
}

pub fn parse_snapshot(raw: &str) -> Result<GraphSnapshot> {
    let parsed: RawSnapshot = serde_json::from_str(raw).context("invalid graph snapshot JSON")?;

    if parsed.nodes.is_empty() {
        return Err(anyhow!("graph snapshot contains no nodes"));
    }

    Ok(GraphSnapshot::new(parsed.version, parsed.nodes, parsed.edges))
}

pub fn load_snapshot(path: &Path) -> Result<GraphSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph snapshot {}", path.display()))?;
    parse_snapshot(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
