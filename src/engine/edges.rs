use std::collections::HashSet;

use crate::graph::{EdgeKind, GraphEdge};

const MAX_EDGE_ZOOM_FACTOR: f64 = 2.0;

pub fn edge_type_weight(kind: &EdgeKind) -> f64 {
    match kind {
        EdgeKind::Critical => 100.0,
        EdgeKind::DependsOn => 80.0,
        EdgeKind::Contains => 70.0,
        EdgeKind::ConnectsTo => 50.0,
        EdgeKind::Other(_) => 50.0,
    }
}

pub fn edge_importance(edge: &GraphEdge) -> f64 {
    let weight = edge.weight.filter(|weight| weight.is_finite()).unwrap_or(1.0);
    edge_type_weight(&edge.kind) * weight
}

/// Grows linearly with zoom up to twice `max_visible_edges`.
pub fn edge_budget(max_visible_edges: usize, zoom: f64) -> usize {
    if zoom.is_nan() || zoom <= 0.0 {
        return 0;
    }
    (max_visible_edges as f64 * zoom.min(MAX_EDGE_ZOOM_FACTOR)).floor() as usize
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeSelection {
    pub edges: Vec<GraphEdge>,
    /// Edges with an endpoint outside the visible set. Never rewired to clusters.
    pub dropped: usize,
    pub capped: usize,
}

pub fn select_edges<'a, I>(
    edges: I,
    visible: &HashSet<&str>,
    zoom: f64,
    max_visible_edges: usize,
) -> EdgeSelection
where
    I: IntoIterator<Item = &'a GraphEdge>,
{
    let mut dropped = 0usize;
    let mut kept = Vec::new();

    for edge in edges {
        if visible.contains(edge.source.as_str()) && visible.contains(edge.target.as_str()) {
            kept.push((edge_importance(edge), edge));
        } else {
            dropped += 1;
        }
    }

    kept.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));

    let budget = edge_budget(max_visible_edges, zoom);
    let capped = kept.len().saturating_sub(budget);
    kept.truncate(budget);

    EdgeSelection {
        edges: kept.into_iter().map(|(_, edge)| edge.clone()).collect(),
        dropped,
        capped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(id: &str, source: &str, target: &str, kind: EdgeKind) -> GraphEdge {
        GraphEdge::new(id, source, target, kind)
    }

    #[test]
    fn importance_uses_type_table_and_weight() {
        assert_eq!(edge_importance(&edge("e", "a", "b", EdgeKind::Critical)), 100.0);
        assert_eq!(
            edge_importance(&edge("e", "a", "b", EdgeKind::ConnectsTo).with_weight(3.0)),
            150.0
        );
        assert_eq!(
            edge_importance(&edge("e", "a", "b", EdgeKind::Other("peers".to_owned()))),
            50.0
        );
        assert_eq!(
            edge_importance(&edge("e", "a", "b", EdgeKind::DependsOn).with_weight(f64::NAN)),
            80.0
        );
    }

    #[test]
    fn budget_grows_with_zoom_up_to_double() {
        assert_eq!(edge_budget(100, 0.5), 50);
        assert_eq!(edge_budget(100, 1.0), 100);
        assert_eq!(edge_budget(100, 2.0), 200);
        assert_eq!(edge_budget(100, 8.0), 200);
        assert_eq!(edge_budget(100, -1.0), 0);

        let mut previous = 0;
        for step in 1..=200 {
            let budget = edge_budget(777, step as f64 * 0.01);
            assert!(budget >= previous);
            previous = budget;
        }
    }

    #[test]
    fn filters_scores_and_caps() {
        let edges = vec![
            edge("e1", "a", "b", EdgeKind::ConnectsTo),
            edge("e2", "a", "c", EdgeKind::Critical),
            edge("e3", "b", "hidden", EdgeKind::Critical),
            edge("e4", "b", "c", EdgeKind::Contains),
            edge("e5", "c", "a", EdgeKind::DependsOn),
        ];
        let visible = HashSet::from(["a", "b", "c"]);

        let selection = select_edges(&edges, &visible, 0.035, 100);
        let ids = selection
            .edges
            .iter()
            .map(|edge| edge.id.as_str())
            .collect::<Vec<_>>();

        assert_eq!(ids, ["e2", "e5", "e4"]);
        assert_eq!(selection.dropped, 1);
        assert_eq!(selection.capped, 1);
    }
}
