use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ids starting with this prefix belong to synthesized clusters.
pub const CLUSTER_ID_PREFIX: &str = "cluster:";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Region,
    Zone,
    Cluster,
    Namespace,
    Service,
    Database,
    Instance,
    Pod,
    #[serde(untagged)]
    Other(String),
}

impl NodeKind {
    pub fn label(&self) -> &str {
        match self {
            Self::Region => "region",
            Self::Zone => "zone",
            Self::Cluster => "cluster",
            Self::Namespace => "namespace",
            Self::Service => "service",
            Self::Database => "database",
            Self::Instance => "instance",
            Self::Pod => "pod",
            Self::Other(name) => name.as_str(),
        }
    }

    pub fn plural(&self) -> String {
        let label = self.label();
        if label.ends_with('s') {
            format!("{label}es")
        } else {
            format!("{label}s")
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Critical,
    Warning,
    Degraded,
    Healthy,
    #[default]
    #[serde(other)]
    Unknown,
}

impl NodeStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Degraded => "degraded",
            Self::Healthy => "healthy",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Contains,
    DependsOn,
    ConnectsTo,
    Critical,
    #[serde(untagged)]
    Other(String),
}

impl EdgeKind {
    pub fn label(&self) -> &str {
        match self {
            Self::Contains => "contains",
            Self::DependsOn => "depends_on",
            Self::ConnectsTo => "connects_to",
            Self::Critical => "critical",
            Self::Other(name) => name.as_str(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub magnitude: Option<f64>,
    #[serde(default)]
    pub properties: BTreeMap<String, f64>,
    /// Recomputed on every selection pass.
    #[serde(skip)]
    pub priority: f64,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            status: NodeStatus::Unknown,
            magnitude: None,
            properties: BTreeMap::new(),
            priority: 0.0,
        }
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.magnitude = Some(magnitude);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: f64) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    #[serde(default)]
    pub weight: Option<f64>,
}

impl GraphEdge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        kind: EdgeKind,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind,
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl ViewportBounds {
    /// Corners may arrive in any order, e.g. mid-drag.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    pub fn around_point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    pub fn normalized(self) -> Self {
        Self::new(self.x1, self.y1, self.x2, self.y2)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    pub fn include_point(&mut self, x: f64, y: f64) {
        self.x1 = self.x1.min(x);
        self.y1 = self.y1.min(y);
        self.x2 = self.x2.max(x);
        self.y2 = self.y2.max(y);
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) * 0.5, (self.y1 + self.y2) * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_swaps_inverted_corners() {
        let viewport = ViewportBounds::new(40.0, 90.0, 10.0, 20.0);
        assert_eq!(viewport.x1, 10.0);
        assert_eq!(viewport.y1, 20.0);
        assert_eq!(viewport.x2, 40.0);
        assert_eq!(viewport.y2, 90.0);
        assert!(viewport.contains(10.0, 90.0));
        assert!(!viewport.contains(41.0, 50.0));
    }

    #[test]
    fn unknown_tags_deserialize_to_open_variants() {
        let node: GraphNode = serde_json::from_str(
            r#"{"id": "fn-1", "type": "lambda", "status": "on_fire", "properties": {"cost": 4.5}}"#,
        )
        .expect("node parses");
        assert_eq!(node.kind, NodeKind::Other("lambda".to_owned()));
        assert_eq!(node.status, NodeStatus::Unknown);
        assert_eq!(node.properties.get("cost"), Some(&4.5));

        let edge: GraphEdge = serde_json::from_str(
            r#"{"id": "e1", "source": "a", "target": "b", "type": "depends_on"}"#,
        )
        .expect("edge parses");
        assert_eq!(edge.kind, EdgeKind::DependsOn);
        assert_eq!(edge.weight, None);
    }

    #[test]
    fn plural_labels() {
        assert_eq!(NodeKind::Pod.plural(), "pods");
        assert_eq!(NodeKind::Other("bus".to_owned()).plural(), "buses");
    }
}
