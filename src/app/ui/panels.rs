use eframe::egui::{self, Align, Context, Layout, Vec2};
use graph_lod::util::format_count;
use graph_lod::{ConfigError, DeviceProfile, Engine, EngineConfig, GraphSnapshot, Selection};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(
        source_label: String,
        snapshot: GraphSnapshot,
        config: EngineConfig,
        device: DeviceProfile,
        auto_tune: bool,
    ) -> Result<Self, ConfigError> {
        let mut engine = Engine::from_config(config)?;
        let tier = auto_tune.then(|| engine.auto_tune(&device));

        Ok(Self {
            source_label,
            snapshot,
            draft: engine.config().clone(),
            engine,
            selection: Selection::default(),
            device,
            tier,
            pan: Vec2::ZERO,
            zoom: 1.0,
            config_revision: 0,
            view_key: None,
            pending_view: None,
            revealed: 0,
            search: String::new(),
            search_match_cache: None,
            selected: None,
            show_fps_bar: true,
            show_edges: true,
            show_cluster_bounds: false,
            continuous_repaint: true,
            focus_request: None,
            status_line: None,
        })
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("graph-lod");
                    ui.separator();
                    ui.label(format!("source: {}", self.source_label));
                    ui.label(format!("snapshot v{}", self.snapshot.version()));
                    ui.label(format!("nodes: {}", format_count(self.snapshot.node_count())));
                    ui.label(format!("edges: {}", format_count(self.snapshot.edge_count())));

                    let report = self.snapshot.report();
                    if !report.is_clean() {
                        ui.colored_label(
                            egui::Color32::from_rgb(240, 170, 60),
                            format!(
                                "ingest: {} rejected, {} dangling",
                                report.rejected_nodes, report.dangling_edges
                            ),
                        );
                    }

                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.visible_graph_text());
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(330.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_details(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading topology snapshot...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }
}
