use std::time::Instant;

use graph_lod::util::format_count;

use super::super::ViewModel;

impl ViewModel {
    /// Frames only count while the canvas repaints continuously; idle gaps are not slow frames.
    pub(in crate::app) fn update_fps_counter(&mut self) {
        if self.continuous_repaint {
            self.engine.record_frame(Instant::now());
        }
    }

    pub(in crate::app) fn fps_display_text(&self) -> Option<String> {
        if !self.show_fps_bar {
            return None;
        }

        Some(
            self.engine
                .monitor()
                .fps_summary()
                .map_or_else(|| "FPS measuring...".to_owned(), |summary| summary.display_text()),
        )
    }

    pub(in crate::app) fn visible_graph_text(&self) -> String {
        format!(
            "visible: {} nodes / {} clusters / {} edges",
            format_count(self.selection.visible_nodes.len()),
            format_count(self.selection.clusters.len()),
            format_count(self.selection.visible_edges.len())
        )
    }
}
