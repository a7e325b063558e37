use eframe::egui::{self, Pos2, Rect, Ui, Vec2};
use graph_lod::ViewportBounds;
use graph_lod::engine::WORLD_EXTENT;

use super::super::ViewModel;
use super::super::render_utils::{centered, screen_to_world, uncentered, world_scale};

const MIN_ZOOM: f32 = 0.05;
const MAX_ZOOM: f32 = 6.0;
const FOCUS_FILL: f64 = 0.8;
const FOCUS_MIN_EXTENT: f64 = 20.0;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, world_scale(rect, self.zoom), pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = pointer - rect.center() - (world_before * world_scale(rect, self.zoom));
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged() {
            self.pan += response.drag_delta();
        }
    }

    /// The world rectangle currently covered by the canvas.
    pub(in crate::app) fn world_viewport(&self, rect: Rect) -> ViewportBounds {
        let scale = world_scale(rect, self.zoom);
        let (x1, y1) = uncentered(screen_to_world(rect, self.pan, scale, rect.left_top()));
        let (x2, y2) = uncentered(screen_to_world(rect, self.pan, scale, rect.right_bottom()));
        ViewportBounds::new(x1, y1, x2, y2)
    }

    pub(in crate::app) fn apply_focus_request(&mut self, rect: Rect) {
        let Some(bounds) = self.focus_request.take() else {
            return;
        };

        let extent = bounds.width().max(bounds.height()).max(FOCUS_MIN_EXTENT);
        self.zoom = ((WORLD_EXTENT / extent) * FOCUS_FILL).clamp(MIN_ZOOM as f64, MAX_ZOOM as f64)
            as f32;

        let (x, y) = bounds.center();
        self.pan = -(centered(x, y) * world_scale(rect, self.zoom));
    }

    pub(in crate::app) fn reset_view(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
    }

    pub(in crate::app) fn hovered_entity(
        ui: &Ui,
        hits: &[(usize, Pos2, f32)],
    ) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        hits.iter()
            .filter_map(|&(index, position, radius)| {
                let distance = position.distance(pointer);
                (distance <= radius).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}
