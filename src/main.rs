mod app;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use eframe::egui::vec2;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use force_graph_editor::graph::{GraphData, demo_graph};
use force_graph_editor::physics::SimulationConfig;
use force_graph_editor::workspace::Workspace;

const DEFAULT_WIDTH: f32 = 1440.0;
const DEFAULT_HEIGHT: f32 = 920.0;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log filter, e.g. `debug` or `force_graph_editor=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Open the interactive editor window.
    View(LayoutArgs),
    /// Run the layout headless until it settles and print the final snapshot as JSON.
    Settle(LayoutArgs),
}

#[derive(Debug, Args)]
struct LayoutArgs {
    /// Graph document (`{"nodes": [...], "links": [...]}`). Defaults to the demo graph.
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Full simulation config as JSON; flags below override single fields.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<f32>,

    #[arg(long)]
    height: Option<f32>,

    #[arg(long, allow_negative_numbers = true)]
    charge: Option<f32>,

    #[arg(long)]
    link_distance: Option<f32>,

    #[arg(long)]
    velocity_decay: Option<f32>,

    #[arg(long, default_value_t = 10_000)]
    max_ticks: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.mode {
        Mode::View(layout) => view(&layout),
        Mode::Settle(layout) => settle(&layout),
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn load_graph(path: Option<&Path>) -> Result<GraphData> {
    let Some(path) = path else {
        return Ok(demo_graph());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid graph JSON in {}", path.display()))
}

fn load_config(layout: &LayoutArgs) -> Result<SimulationConfig> {
    let mut config = match &layout.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            serde_json::from_str::<SimulationConfig>(&raw)
                .with_context(|| format!("invalid config JSON in {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };

    if layout.width.is_some() || layout.height.is_some() {
        let (width, height) = window_size(layout);
        config = config.with_center(vec2(width * 0.5, height * 0.5));
    }
    if let Some(charge) = layout.charge {
        config.charge_strength = charge;
    }
    if let Some(distance) = layout.link_distance {
        config.link_distance = distance;
    }
    if let Some(decay) = layout.velocity_decay {
        config.velocity_decay = decay;
    }

    Ok(config.sanitized())
}

fn window_size(layout: &LayoutArgs) -> (f32, f32) {
    (
        layout.width.unwrap_or(DEFAULT_WIDTH),
        layout.height.unwrap_or(DEFAULT_HEIGHT),
    )
}

fn build_workspace(layout: &LayoutArgs) -> Result<(Workspace, SimulationConfig)> {
    let data = load_graph(layout.graph.as_deref())?;
    let config = load_config(layout)?;
    let workspace = Workspace::from_data(&data, config).context("graph document rejected")?;
    Ok((workspace, config))
}

fn settle(layout: &LayoutArgs) -> Result<()> {
    let (mut workspace, _) = build_workspace(layout)?;
    let ticks = workspace.simulation_mut().run_to_settle(layout.max_ticks);
    info!(
        ticks,
        state = ?workspace.simulation().state(),
        alpha = workspace.simulation().alpha(),
        "layout finished"
    );

    let output = serde_json::to_string_pretty(workspace.frame().snapshot)
        .context("failed to serialize snapshot")?;
    println!("{output}");
    Ok(())
}

fn view(layout: &LayoutArgs) -> Result<()> {
    let (workspace, config) = build_workspace(layout)?;
    let (width, height) = window_size(layout);
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([width, height]),
        ..Default::default()
    };

    eframe::run_native(
        "Force graph editor",
        options,
        Box::new(move |cc| Ok(Box::new(app::EditorApp::new(cc, workspace, config)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
