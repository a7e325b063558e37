use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, Ui};
use graph_lod::engine::Recommendation;
use graph_lod::util::{format_count, format_megabytes, unix_millis};

use super::super::ViewModel;

impl ViewModel {
    fn apply_draft(&mut self) {
        match self.engine.set_config(self.draft.clone()) {
            Ok(()) => {
                self.config_revision += 1;
                self.status_line = Some("Budgets applied.".to_owned());
            }
            Err(error) => {
                self.status_line = Some(format!("Budgets rejected: {error}"));
            }
        }
    }

    fn run_auto_tune(&mut self) {
        let tier = self.engine.auto_tune(&self.device);
        self.tier = Some(tier);
        self.draft = self.engine.config().clone();
        self.config_revision += 1;
        self.status_line = Some(format!(
            "Auto-tuned for a {tier:?} device (x{}).",
            tier.multiplier()
        ));
    }

    fn export_diagnostics(&mut self) {
        let path = PathBuf::from(format!("graph-lod-diagnostics-{}.json", unix_millis()));
        self.status_line = Some(match self.engine.diagnostic_report().write_to(&path) {
            Ok(()) => format!("Diagnostics written to {}", path.display()),
            Err(error) => format!("Export failed: {error:#}"),
        });
    }

    fn draw_budget_controls(&mut self, ui: &mut Ui) {
        ui.add(
            egui::Slider::new(&mut self.draft.max_visible_nodes, 100..=200_000)
                .logarithmic(true)
                .text("Max visible nodes"),
        )
        .on_hover_text("Hard cap on individually drawn nodes at any zoom.");
        ui.add(
            egui::Slider::new(&mut self.draft.max_visible_edges, 100..=400_000)
                .logarithmic(true)
                .text("Max visible edges"),
        )
        .on_hover_text("Edge cap at zoom 1; it grows with zoom up to twice this value.");
        ui.add(
            egui::Slider::new(&mut self.draft.clustering_threshold, 10..=50_000)
                .logarithmic(true)
                .text("Clustering threshold"),
        )
        .on_hover_text("Dense buckets collapse into clusters once more nodes than this are admitted.");
        ui.add(
            egui::Slider::new(&mut self.draft.render_batch_size, 10..=5_000)
                .logarithmic(true)
                .text("Render batch size"),
        )
        .on_hover_text("Entities revealed per frame while a new selection is drawn.");
        ui.add(
            egui::Slider::new(&mut self.draft.update_throttle_ms, 0..=1_000)
                .text("Update throttle (ms)"),
        )
        .on_hover_text("How long the view must settle before selection reruns.");

        let dirty = &self.draft != self.engine.config();
        ui.horizontal(|ui| {
            if ui.add_enabled(dirty, egui::Button::new("Apply")).clicked() {
                self.apply_draft();
            }
            if ui.add_enabled(dirty, egui::Button::new("Revert")).clicked() {
                self.draft = self.engine.config().clone();
            }
        });
    }

    fn draw_lod_table(&self, ui: &mut Ui) {
        let zoom = f64::from(self.zoom);
        let thresholds = &self.engine.config().lod_thresholds;
        let active = thresholds
            .iter()
            .rposition(|threshold| zoom >= threshold.zoom)
            .unwrap_or(0);

        ui.label(format!(
            "zoom {zoom:.2}, budget {}",
            format_count(self.engine.lod_budget(zoom))
        ));
        egui::Grid::new("lod_table").striped(true).show(ui, |ui| {
            ui.label(RichText::new("zoom from").strong());
            ui.label(RichText::new("max nodes").strong());
            ui.end_row();

            for (index, threshold) in thresholds.iter().enumerate() {
                let text = |value: String| {
                    if index == active {
                        RichText::new(value).color(Color32::from_rgb(255, 236, 140))
                    } else {
                        RichText::new(value)
                    }
                };
                ui.label(text(format!("{:.2}", threshold.zoom)));
                ui.label(text(format_count(threshold.max_nodes)));
                ui.end_row();
            }
        });
    }

    fn draw_device_controls(&mut self, ui: &mut Ui) {
        let cores = self
            .device
            .hardware_concurrency
            .map_or_else(|| "unknown".to_owned(), |cores| cores.to_string());
        ui.label(format!("Hardware threads: {cores}"));
        ui.checkbox(&mut self.device.is_mobile, "Mobile device")
            .on_hover_text("Mobile hosts always tune to the low-end tier.");
        ui.label(format!("Detected tier: {:?}", self.device.tier()));

        ui.horizontal(|ui| {
            if ui.button("Auto-tune").clicked() {
                self.run_auto_tune();
            }
            if let Some(tier) = self.tier {
                ui.label(format!("last: {tier:?}"));
            }
        });
    }

    fn draw_performance(&self, ui: &mut Ui) {
        let metrics = self.engine.monitor().metrics();
        egui::Grid::new("performance_metrics").show(ui, |ui| {
            ui.label("Render time");
            ui.label(format!("{:.2} ms", metrics.render_time_ms));
            ui.end_row();
            ui.label("FPS");
            ui.label(
                metrics
                    .fps
                    .map_or_else(|| "measuring".to_owned(), |fps| format!("{fps:.1}")),
            );
            ui.end_row();
            ui.label("Memory estimate");
            ui.label(format_megabytes(metrics.memory_estimate_mb));
            ui.end_row();
        });

        ui.add_space(4.0);
        for recommendation in self.engine.monitor().recommendations() {
            let color = if recommendation == Recommendation::Nominal {
                Color32::from_rgb(70, 180, 120)
            } else {
                Color32::from_rgb(240, 170, 60)
            };
            ui.colored_label(color, recommendation.message());
        }
    }

    fn draw_selection_diagnostics(&self, ui: &mut Ui) {
        let diagnostics = self.selection.diagnostics;
        egui::Grid::new("selection_diagnostics").show(ui, |ui| {
            let rows = [
                ("Pass", diagnostics.generation.to_string()),
                ("Candidates in view", format_count(diagnostics.candidate_nodes)),
                ("Admitted", format_count(diagnostics.admitted_nodes)),
                ("Clustered", format_count(diagnostics.clustered_nodes)),
                ("Edges dropped", format_count(diagnostics.dropped_edges)),
                ("Edges over cap", format_count(diagnostics.capped_edges)),
                ("Dangling edges", format_count(diagnostics.dangling_edges)),
            ];
            for (label, value) in rows {
                ui.label(label);
                ui.label(value);
                ui.end_row();
            }
        });
        ui.label(format!(
            "selection took {:.2} ms",
            self.selection.elapsed.as_secs_f64() * 1000.0
        ));
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Controls");
        ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("Search visible nodes..."),
        );
        if let Some(matches) = self.cached_search_matches() {
            ui.label(format!("{} matching entities", format_count(matches.len())));
        }

        ui.horizontal(|ui| {
            if ui.button("Reset view").clicked() {
                self.reset_view();
            }
            if ui.button("Export diagnostics").clicked() {
                self.export_diagnostics();
            }
        });

        ui.checkbox(&mut self.show_edges, "Show edges");
        ui.checkbox(&mut self.show_cluster_bounds, "Show cluster bounds");
        ui.checkbox(&mut self.show_fps_bar, "FPS display");
        let repaint_toggle = ui
            .checkbox(&mut self.continuous_repaint, "Continuous repaint")
            .on_hover_text("Repaint every frame so the frame rate can be measured.");
        if repaint_toggle.changed() {
            self.engine.reset_frame_window();
        }

        if let Some(status) = &self.status_line {
            ui.add_space(4.0);
            ui.label(RichText::new(status).italics());
        }

        ui.separator();
        ui.collapsing("Budgets", |ui| self.draw_budget_controls(ui));
        ui.collapsing("Level of detail", |ui| self.draw_lod_table(ui));
        ui.collapsing("Device", |ui| self.draw_device_controls(ui));

        egui::CollapsingHeader::new("Performance")
            .default_open(true)
            .show(ui, |ui| self.draw_performance(ui));
        egui::CollapsingHeader::new("Last selection")
            .default_open(true)
            .show(ui, |ui| self.draw_selection_diagnostics(ui));
    }
}
