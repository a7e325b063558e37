use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use graph_lod::engine::{BatchOutcome, Throttle, render_in_batches, world_bounds};
use graph_lod::util::{format_count, format_megabytes};
use graph_lod::{DeviceProfile, Engine, EngineConfig, GraphSnapshot, Selection, ViewportBounds};
use log::{info, warn};
use tokio::sync::mpsc;

const PAN_BURST_STEPS: usize = 12;
const PAN_BURST_FRAME: Duration = Duration::from_millis(16);
const PAN_WINDOW: f64 = 400.0;

pub struct HeadlessOptions {
    pub source: crate::source::SnapshotSource,
    pub config: EngineConfig,
    pub device: DeviceProfile,
    pub auto_tune: bool,
    pub zooms: Vec<f64>,
    pub report: Option<PathBuf>,
}

pub fn run(options: HeadlessOptions) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(sweep(options))
}

struct PassSummary {
    batches: usize,
    drawn: usize,
    cancelled: bool,
    render_time: Duration,
}

/// Draws a selection in scheduler-sized batches against a counting sink.
async fn render_pass(engine: &mut Engine, selection: &Selection) -> PassSummary {
    let cancel = engine.cancel_signal();
    let batch_size = engine.config().render_batch_size;
    let started = Instant::now();

    let entities = selection.entities().collect::<Vec<_>>();
    let mut drawn = 0usize;
    let nodes = render_in_batches(&entities, batch_size, &cancel, |batch| {
        drawn += batch.len();
        std::future::ready(())
    })
    .await;

    let edges = if nodes.is_cancelled() {
        BatchOutcome::Cancelled {
            batches: 0,
            items: 0,
        }
    } else {
        render_in_batches(&selection.visible_edges, batch_size, &cancel, |batch| {
            drawn += batch.len();
            std::future::ready(())
        })
        .await
    };

    let render_time = selection.elapsed + started.elapsed();
    engine.record_render(render_time, selection);
    engine.record_frame(Instant::now());

    PassSummary {
        batches: nodes.batches() + edges.batches(),
        drawn,
        cancelled: nodes.is_cancelled() || edges.is_cancelled(),
        render_time,
    }
}

/// Replays a burst of pan events through the debounce; only the final viewport is selected.
async fn replay_pan_burst(
    engine: &mut Engine,
    snapshot: &GraphSnapshot,
    zoom: f64,
) -> Result<Selection> {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let mut throttle = Throttle::new(engine.config().update_throttle());

    for step in 0..PAN_BURST_STEPS {
        let offset = step as f64 * 25.0;
        let viewport = ViewportBounds::new(offset, offset, offset + PAN_WINDOW, offset + PAN_WINDOW);
        let sender = sender.clone();
        throttle.request(move || {
            let _ = sender.send(viewport);
        });
        tokio::time::sleep(PAN_BURST_FRAME).await;
    }
    drop(sender);

    let mut viewport = receiver
        .recv()
        .await
        .context("pan burst produced no viewport update")?;
    let mut coalesced = 1usize;
    while let Ok(later) = receiver.try_recv() {
        viewport = later;
        coalesced += 1;
    }
    info!(
        "{PAN_BURST_STEPS} pan events coalesced into {coalesced} selection pass(es) with a {} ms throttle",
        throttle.interval().as_millis()
    );

    Ok(engine.select(snapshot, zoom, viewport))
}

async fn sweep(options: HeadlessOptions) -> Result<()> {
    let started = Instant::now();
    let snapshot = options.source.load()?;
    info!(
        "loaded {} nodes and {} edges from {} in {:.1} ms",
        format_count(snapshot.node_count()),
        format_count(snapshot.edge_count()),
        options.source.describe(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    if !snapshot.report().is_clean() {
        warn!("ingestion issues: {:?}", snapshot.report());
    }

    let mut engine = Engine::from_config(options.config)?;
    if options.auto_tune {
        engine.auto_tune(&options.device);
    }

    println!(
        "{:>7} {:>8} {:>9} {:>8} {:>8} {:>8} {:>8} {:>7} {:>8} {:>9}",
        "zoom", "budget", "admitted", "nodes", "clusters", "edges", "dropped", "capped", "batches",
        "time"
    );

    for &zoom in &options.zooms {
        let selection = engine.select(&snapshot, zoom, world_bounds());
        let pass = render_pass(&mut engine, &selection).await;
        if pass.cancelled {
            warn!("pass #{} was superseded after {} items", selection.generation, pass.drawn);
        }

        let diagnostics = selection.diagnostics;
        println!(
            "{:>7.2} {:>8} {:>9} {:>8} {:>8} {:>8} {:>8} {:>7} {:>8} {:>6.1} ms",
            zoom,
            format_count(engine.lod_budget(zoom)),
            format_count(diagnostics.admitted_nodes),
            format_count(selection.visible_nodes.len()),
            selection.clusters.len(),
            format_count(selection.visible_edges.len()),
            format_count(diagnostics.dropped_edges),
            format_count(diagnostics.capped_edges),
            pass.batches,
            pass.render_time.as_secs_f64() * 1000.0
        );
    }

    if let Some(&zoom) = options.zooms.last() {
        let selection = replay_pan_burst(&mut engine, &snapshot, zoom).await?;
        render_pass(&mut engine, &selection).await;
    }

    let report = engine.diagnostic_report();
    println!();
    println!(
        "memory estimate: {}",
        format_megabytes(report.metrics.memory_estimate_mb)
    );
    for recommendation in &report.recommendations {
        println!("- {recommendation}");
    }

    if let Some(path) = &options.report {
        report.write_to(path)?;
        info!("diagnostic report written to {}", path.display());
    }

    Ok(())
}
