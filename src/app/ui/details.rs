use eframe::egui::{self, RichText, Ui};
use graph_lod::engine::VisibleEntity;
use graph_lod::graph::GraphNode;
use graph_lod::util::format_count;
use graph_lod::{ClusterNode, ViewportBounds};

use super::super::ViewModel;

const MEMBER_ROWS: usize = 24;

fn draw_node_details(ui: &mut Ui, node: &GraphNode, visible_edges: Option<usize>) {
    ui.label(RichText::new(&node.id).monospace().strong());
    egui::Grid::new("node_details").show(ui, |ui| {
        ui.label("Type");
        ui.label(node.kind.label());
        ui.end_row();
        ui.label("Status");
        ui.label(node.status.label());
        ui.end_row();
        if let Some(magnitude) = node.magnitude {
            ui.label("Magnitude");
            ui.label(format!("{magnitude:.0}"));
            ui.end_row();
        }
        if let Some(edges) = visible_edges {
            ui.label("Priority");
            ui.label(format!("{:.1}", node.priority));
            ui.end_row();
            ui.label("Visible edges");
            ui.label(edges.to_string());
            ui.end_row();
        }
    });

    if !node.properties.is_empty() {
        ui.add_space(6.0);
        ui.label(RichText::new("Properties").strong());
        egui::Grid::new("node_properties").striped(true).show(ui, |ui| {
            for (key, value) in &node.properties {
                ui.label(key);
                ui.label(format!("{value:.2}"));
                ui.end_row();
            }
        });
    }
}

fn draw_cluster_details(ui: &mut Ui, cluster: &ClusterNode) -> Option<ViewportBounds> {
    let mut focus = None;

    ui.label(RichText::new(&cluster.label).strong());
    ui.label(RichText::new(&cluster.id).monospace());
    ui.label(format!(
        "bounds: ({:.0}, {:.0}) to ({:.0}, {:.0})",
        cluster.bounds.x1, cluster.bounds.y1, cluster.bounds.x2, cluster.bounds.y2
    ));
    if ui.button("Zoom to cluster").clicked() {
        focus = Some(cluster.bounds);
    }

    if !cluster.aggregated_metrics.is_empty() {
        ui.add_space(6.0);
        ui.label(RichText::new("Aggregated metrics").strong());
        egui::Grid::new("cluster_metrics").striped(true).show(ui, |ui| {
            for (key, value) in &cluster.aggregated_metrics {
                ui.label(key);
                ui.label(format!("{value:.2}"));
                ui.end_row();
            }
        });
    }

    ui.add_space(6.0);
    ui.label(RichText::new(format!("Members ({})", format_count(cluster.member_count()))).strong());
    for member in cluster.members.iter().take(MEMBER_ROWS) {
        ui.label(format!(
            "{}  {} / {}",
            member.id,
            member.kind.label(),
            member.status.label()
        ));
    }
    if cluster.member_count() > MEMBER_ROWS {
        ui.label(format!("... and {} more", cluster.member_count() - MEMBER_ROWS));
    }

    focus
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Details");

        let Some(selected) = self.selected.clone() else {
            ui.label("Click a node or cluster to inspect it. Double-click a cluster to zoom in.");
            return;
        };

        let mut focus = None;
        match self.selection.entities().find(|entity| entity.id() == selected) {
            Some(VisibleEntity::Node(node)) => {
                let edges = self
                    .selection
                    .visible_edges
                    .iter()
                    .filter(|edge| edge.source == node.id || edge.target == node.id)
                    .count();
                draw_node_details(ui, node, Some(edges));
            }
            Some(VisibleEntity::Cluster(cluster)) => {
                focus = draw_cluster_details(ui, cluster);
            }
            None => match self.snapshot.node(&selected) {
                Some(node) => {
                    ui.label(RichText::new("Not in the current view.").italics());
                    draw_node_details(ui, node, None);
                }
                None => {
                    ui.label(RichText::new("No longer visible.").italics());
                }
            },
        }

        ui.add_space(8.0);
        if ui.button("Clear selection").clicked() {
            self.selected = None;
        }
        if focus.is_some() {
            self.focus_request = focus;
        }
    }
}
