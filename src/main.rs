mod app;
mod headless;
mod source;

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use graph_lod::{DeviceProfile, EngineConfig};
use log::info;

use crate::headless::HeadlessOptions;
use crate::source::SnapshotSource;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Topology snapshot (JSON). Without it a synthetic topology is generated.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Node count of the synthetic topology.
    #[arg(long, default_value_t = 50_000)]
    synthetic: usize,

    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Engine configuration (JSON). Missing fields fall back to defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Treat the host as a mobile device when auto-tuning.
    #[arg(long)]
    mobile: bool,

    /// Scale budgets to this host before the first selection.
    #[arg(long)]
    auto_tune: bool,

    /// Run a zoom sweep without opening a window.
    #[arg(long)]
    headless: bool,

    #[arg(long, value_delimiter = ',', default_values_t = [0.05, 0.2, 0.5, 1.0, 2.0, 4.0])]
    zoom: Vec<f64>,

    /// Where the headless run writes its diagnostic report.
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Args {
    fn source(&self) -> SnapshotSource {
        match &self.snapshot {
            Some(path) => SnapshotSource::File(path.clone()),
            None => SnapshotSource::Synthetic {
                node_count: self.synthetic,
                seed: self.seed,
            },
        }
    }

    fn engine_config(&self) -> Result<EngineConfig> {
        match &self.config {
            Some(path) => EngineConfig::load(path),
            None => Ok(EngineConfig::default()),
        }
    }

    fn device(&self) -> DeviceProfile {
        DeviceProfile {
            hardware_concurrency: std::thread::available_parallelism()
                .ok()
                .map(NonZeroUsize::get),
            device_memory_gb: None,
            is_mobile: self.mobile,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let source = args.source();
    let config = args.engine_config()?;
    let device = args.device();
    info!("source: {}, device: {:?}", source.describe(), device);

    if args.headless {
        return headless::run(HeadlessOptions {
            source,
            config,
            device,
            auto_tune: args.auto_tune,
            zooms: args.zoom,
            report: args.report,
        });
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };
    let auto_tune = args.auto_tune;

    eframe::run_native(
        "graph-lod",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::GraphLodApp::new(
                cc, source, config, device, auto_tune,
            )))
        }),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
