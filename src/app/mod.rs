use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Instant;

use eframe::egui::{self, Context, Vec2};
use graph_lod::engine::DeviceTier;
use graph_lod::{
    DeviceProfile, Engine, EngineConfig, GraphSnapshot, PerformanceConfig, Selection,
    ViewportBounds,
};

use crate::source::SnapshotSource;

mod graph;
mod render_utils;
mod ui;

pub struct GraphLodApp {
    source: SnapshotSource,
    config: EngineConfig,
    device: DeviceProfile,
    auto_tune: bool,
    state: AppState,
    reload_rx: Option<Receiver<Result<GraphSnapshot, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<GraphSnapshot, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    source_label: String,
    snapshot: GraphSnapshot,
    engine: Engine,
    selection: Selection,
    draft: PerformanceConfig,
    device: DeviceProfile,
    tier: Option<DeviceTier>,
    pan: Vec2,
    zoom: f32,
    config_revision: u64,
    view_key: Option<ViewKey>,
    pending_view: Option<(ViewKey, Instant)>,
    revealed: usize,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    selected: Option<String>,
    show_fps_bar: bool,
    show_edges: bool,
    show_cluster_bounds: bool,
    continuous_repaint: bool,
    focus_request: Option<ViewportBounds>,
    status_line: Option<String>,
}

/// Everything a selection pass depends on besides the snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ViewKey {
    viewport: ViewportBounds,
    zoom: f64,
    config_revision: u64,
}

struct SearchMatchCache {
    query: String,
    generation: u64,
    matches: Arc<HashSet<String>>,
}

impl GraphLodApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: SnapshotSource,
        config: EngineConfig,
        device: DeviceProfile,
        auto_tune: bool,
    ) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            config,
            device,
            auto_tune,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: SnapshotSource) -> Receiver<Result<GraphSnapshot, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = source.load().map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: SnapshotSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready_state(&self, snapshot: GraphSnapshot) -> AppState {
        match ViewModel::new(
            self.source.describe(),
            snapshot,
            self.config.clone(),
            self.device.clone(),
            self.auto_tune,
        ) {
            Ok(model) => AppState::Ready(Box::new(model)),
            Err(error) => AppState::Error(format!("Invalid engine configuration: {error}")),
        }
    }

    fn loaded_state(&self, result: Result<GraphSnapshot, String>) -> AppState {
        match result {
            Ok(snapshot) => self.ready_state(snapshot),
            Err(error) => AppState::Error(error),
        }
    }
}

impl eframe::App for GraphLodApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut loaded = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    loaded = Some(result);
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading topology snapshot...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load topology snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.source.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => loaded = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(result) = loaded {
            transition = Some(self.loaded_state(result));
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
            ctx.request_repaint();
        }
    }
}
