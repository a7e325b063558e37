use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{self, Align2, Color32, Context, FontId, Rect, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use graph_lod::engine::{VisibleEntity, pseudo_position};
use graph_lod::graph::EdgeKind;

use super::super::render_utils::{
    CLUSTER_COLOR, blend_color, centered, cluster_radius, dim_color, draw_background, edge_color,
    node_radius, status_color, world_scale, world_to_screen,
};
use super::super::{SearchMatchCache, ViewKey, ViewModel};

const NODE_LABEL_ZOOM: f32 = 2.5;
const NODE_LABEL_LIMIT: usize = 400;
const CLUSTER_LABEL_LIMIT: usize = 250;
const HIGHLIGHT: Color32 = Color32::from_rgb(255, 236, 140);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    /// Reruns selection once the view has been stable for the configured throttle.
    fn refresh_selection(&mut self, ctx: &Context, key: ViewKey) {
        if self.view_key == Some(key) {
            self.pending_view = None;
            return;
        }

        let now = Instant::now();
        let since = match self.pending_view {
            Some((pending, since)) if pending == key => since,
            _ => {
                self.pending_view = Some((key, now));
                now
            }
        };

        let throttle = self.engine.config().update_throttle();
        let waited = now.saturating_duration_since(since);
        if self.view_key.is_some() && waited < throttle {
            ctx.request_repaint_after(throttle - waited);
            return;
        }

        self.selection = self.engine.select(&self.snapshot, key.zoom, key.viewport);
        self.view_key = Some(key);
        self.pending_view = None;
        self.revealed = 0;
    }

    /// Ids of visible entities matching the search box; clusters match through their members.
    pub(in crate::app) fn cached_search_matches(&mut self) -> Option<Arc<HashSet<String>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.generation == self.selection.generation
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let mut matches = HashSet::new();
        for node in &self.selection.visible_nodes {
            if fuzzy_match_score(&matcher, &node.id, query).is_some() {
                matches.insert(node.id.clone());
            }
        }
        for cluster in &self.selection.clusters {
            if cluster
                .members
                .iter()
                .any(|member| fuzzy_match_score(&matcher, &member.id, query).is_some())
            {
                matches.insert(cluster.id.clone());
            }
        }
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            generation: self.selection.generation,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    fn draw_edges(&self, painter: &egui::Painter, rect: Rect, scale: f32, dimmed: bool) {
        for edge in &self.selection.visible_edges {
            let (sx, sy) = pseudo_position(&edge.source);
            let (tx, ty) = pseudo_position(&edge.target);
            let start = world_to_screen(rect, self.pan, scale, centered(sx, sy));
            let end = world_to_screen(rect, self.pan, scale, centered(tx, ty));

            let mut color = edge_color(&edge.kind);
            if dimmed {
                color = dim_color(color, 0.35);
            }
            let width = if edge.kind == EdgeKind::Critical { 1.6 } else { 1.0 };
            painter.line_segment([start, end], Stroke::new(width, color));
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.apply_focus_request(rect);
        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        let scale = world_scale(rect, self.zoom);
        draw_background(&painter, rect, self.pan, scale);

        let key = ViewKey {
            viewport: self.world_viewport(rect),
            zoom: f64::from(self.zoom),
            config_revision: self.config_revision,
        };
        self.refresh_selection(ui.ctx(), key);

        let started = Instant::now();
        let search_matches = self.cached_search_matches();
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        // Large selections are revealed one render batch per frame.
        let total = self.selection.entity_count();
        let batch = self.engine.config().render_batch_size.max(1);
        self.revealed = (self.revealed + batch).min(total);
        if self.revealed < total {
            ui.ctx().request_repaint();
        }

        if self.show_edges && self.revealed == total {
            self.draw_edges(&painter, rect, scale, search_active);
        }

        let zoom = self.zoom;
        let label_nodes = zoom >= NODE_LABEL_ZOOM && total <= NODE_LABEL_LIMIT;
        let label_clusters = self.selection.clusters.len() <= CLUSTER_LABEL_LIMIT;
        let mut hits = Vec::with_capacity(self.revealed);

        for (index, entity) in self.selection.entities().take(self.revealed).enumerate() {
            let (x, y) = entity.position();
            let position = world_to_screen(rect, self.pan, scale, centered(x, y));
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(entity.id()));
            let is_selected = self.selected.as_deref() == Some(entity.id());

            let radius = match entity {
                VisibleEntity::Node(node) => {
                    let radius = node_radius(node.priority, zoom);
                    let mut fill = status_color(node.status);
                    if search_active && !is_match {
                        fill = dim_color(fill, 0.3);
                    }
                    painter.circle_filled(position, radius, fill);

                    if label_nodes {
                        painter.text(
                            position + vec2(radius + 4.0, 0.0),
                            Align2::LEFT_CENTER,
                            &node.id,
                            FontId::proportional(11.0),
                            Color32::from_gray(200),
                        );
                    }
                    radius
                }
                VisibleEntity::Cluster(cluster) => {
                    let radius = cluster_radius(cluster.member_count(), zoom);

                    if self.show_cluster_bounds {
                        let min = world_to_screen(
                            rect,
                            self.pan,
                            scale,
                            centered(cluster.bounds.x1, cluster.bounds.y1),
                        );
                        let max = world_to_screen(
                            rect,
                            self.pan,
                            scale,
                            centered(cluster.bounds.x2, cluster.bounds.y2),
                        );
                        painter.rect_stroke(
                            Rect::from_two_pos(min, max),
                            2.0,
                            Stroke::new(1.0, CLUSTER_COLOR.gamma_multiply(0.5)),
                            egui::StrokeKind::Inside,
                        );
                    }

                    let mut fill = blend_color(CLUSTER_COLOR, Color32::from_rgb(19, 23, 29), 0.55);
                    if search_active && !is_match {
                        fill = dim_color(fill, 0.3);
                    }
                    painter.circle_filled(position, radius, fill);
                    painter.circle_stroke(position, radius, Stroke::new(1.5, CLUSTER_COLOR));

                    if label_clusters {
                        painter.text(
                            position + vec2(radius + 4.0, 0.0),
                            Align2::LEFT_CENTER,
                            &cluster.label,
                            FontId::proportional(12.0),
                            Color32::from_gray(215),
                        );
                    }
                    radius
                }
            };

            if is_match || is_selected {
                painter.circle_stroke(position, radius + 2.5, Stroke::new(2.0, HIGHLIGHT));
            }
            hits.push((index, position, radius));
        }

        let hovered = Self::hovered_entity(ui, &hits);
        if let Some(index) = hovered {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
            if let Some(entity) = self.selection.entities().nth(index)
                && let Some(pointer) = ui.input(|input| input.pointer.hover_pos())
            {
                painter.text(
                    pointer + vec2(12.0, -12.0),
                    Align2::LEFT_BOTTOM,
                    entity.id(),
                    FontId::monospace(12.0),
                    HIGHLIGHT,
                );
            }
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            self.selected = hovered
                .and_then(|index| self.selection.entities().nth(index))
                .map(|entity| entity.id().to_owned());
        }
        if response.double_clicked()
            && let Some(VisibleEntity::Cluster(cluster)) =
                hovered.and_then(|index| self.selection.entities().nth(index))
        {
            self.focus_request = Some(cluster.bounds);
        }

        self.engine
            .record_render(started.elapsed(), &self.selection);

        if response.dragged() || self.continuous_repaint {
            ui.ctx().request_repaint();
        }
    }
}
