use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, vec2};
use graph_lod::engine::WORLD_EXTENT;
use graph_lod::graph::{EdgeKind, NodeStatus};

pub(super) const CLUSTER_COLOR: Color32 = Color32::from_rgb(92, 140, 230);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, scale: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    // Grid lines follow world units so panning and zooming stay readable.
    let step = (100.0 * scale).max(8.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

/// Pixels per world unit: at zoom 1 the whole world fits the canvas.
pub(super) fn world_scale(rect: Rect, zoom: f32) -> f32 {
    (rect.width().min(rect.height()) / WORLD_EXTENT as f32).max(f32::EPSILON) * zoom
}

/// World coordinates relative to the world centre, in the canvas' f32 space.
pub(super) fn centered(x: f64, y: f64) -> Vec2 {
    let half = WORLD_EXTENT / 2.0;
    vec2((x - half) as f32, (y - half) as f32)
}

pub(super) fn uncentered(world: Vec2) -> (f64, f64) {
    let half = WORLD_EXTENT / 2.0;
    (f64::from(world.x) + half, f64::from(world.y) + half)
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, scale: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * scale
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, scale: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / scale
}

pub(super) fn status_color(status: NodeStatus) -> Color32 {
    match status {
        NodeStatus::Critical => Color32::from_rgb(229, 72, 77),
        NodeStatus::Warning => Color32::from_rgb(240, 170, 60),
        NodeStatus::Degraded => Color32::from_rgb(222, 122, 58),
        NodeStatus::Healthy => Color32::from_rgb(70, 180, 120),
        NodeStatus::Unknown => Color32::from_rgb(130, 140, 150),
    }
}

pub(super) fn edge_color(kind: &EdgeKind) -> Color32 {
    match kind {
        EdgeKind::Critical => Color32::from_rgba_unmultiplied(229, 72, 77, 150),
        EdgeKind::DependsOn => Color32::from_rgba_unmultiplied(170, 130, 230, 110),
        EdgeKind::ConnectsTo => Color32::from_rgba_unmultiplied(80, 190, 200, 100),
        EdgeKind::Contains | EdgeKind::Other(_) => {
            Color32::from_rgba_unmultiplied(140, 150, 165, 70)
        }
    }
}

/// Higher-priority nodes are drawn larger.
pub(super) fn node_radius(priority: f64, zoom: f32) -> f32 {
    let weight = (priority / 100.0).clamp(0.0, 1.0) as f32;
    ((3.0 + weight * 7.0) * zoom.powf(0.4)).clamp(2.5, 24.0)
}

pub(super) fn cluster_radius(member_count: usize, zoom: f32) -> f32 {
    let size = 6.0 + (member_count.max(1) as f32).ln() * 3.0;
    (size * zoom.powf(0.3)).clamp(5.0, 40.0)
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn screen_and_world_mappings_invert() {
        let rect = Rect::from_min_size(pos2(10.0, 20.0), vec2(800.0, 600.0));
        let pan = vec2(35.0, -12.0);
        let scale = world_scale(rect, 2.5);

        let world = centered(730.0, 125.0);
        let screen = world_to_screen(rect, pan, scale, world);
        let (x, y) = uncentered(screen_to_world(rect, pan, scale, screen));

        assert!((x - 730.0).abs() < 1e-3);
        assert!((y - 125.0).abs() < 1e-3);
    }

    #[test]
    fn unit_zoom_fits_world_into_short_side() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(1200.0, 500.0));
        assert!((world_scale(rect, 1.0) - 0.5).abs() < f32::EPSILON);
    }
}
