#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Tower Siege game.

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use tower_siege_core::{CellCoord, GameConfig, TowerKind, WaveState, WELCOME_BANNER};
use tower_siege_simulation::{config, Simulation};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Headless Tower Siege runner.
#[derive(Parser, Debug)]
#[command(name = "tower-siege")]
#[command(about = "Runs a Tower Siege game without rendering and logs the outcome")]
struct Args {
    /// TOML file overriding the default stat tables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for dodge and critical rolls.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of waves in the run.
    #[arg(long)]
    waves: Option<u32>,

    /// Tower placed before the first wave, as `kind@column,row`.
    #[arg(long = "tower", value_parser = parse_tower)]
    towers: Vec<TowerPlacement>,

    /// Length of one simulation frame in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Simulated time after which the run is abandoned.
    #[arg(long, default_value_t = 1_800)]
    max_seconds: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TowerPlacement {
    kind: TowerKind,
    cell: CellCoord,
}

fn parse_tower(value: &str) -> Result<TowerPlacement> {
    let (kind, cell) = value
        .split_once('@')
        .with_context(|| format!("tower `{value}` must look like kind@column,row"))?;
    let (column, row) = cell
        .split_once(',')
        .with_context(|| format!("cell `{cell}` must look like column,row"))?;
    let kind: TowerKind = kind.parse()?;
    let column = column
        .trim()
        .parse()
        .with_context(|| format!("invalid column `{column}`"))?;
    let row = row
        .trim()
        .parse()
        .with_context(|| format!("invalid row `{row}`"))?;
    Ok(TowerPlacement {
        kind,
        cell: CellCoord::new(column, row),
    })
}

fn build_config(args: &Args) -> Result<GameConfig> {
    let mut game_config = match &args.config {
        Some(path) => config::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        game_config.seed = seed;
    }
    if let Some(waves) = args.waves {
        game_config.waves.total_waves = waves;
    }
    Ok(game_config)
}

fn run(args: &Args) -> Result<()> {
    ensure!(args.frame_ms > 0, "--frame-ms must be positive");

    let mut simulation =
        Simulation::new(build_config(args)?).context("failed to initialise the simulation")?;
    info!("{WELCOME_BANNER}");

    for placement in &args.towers {
        let tower = simulation
            .place_tower(placement.kind, placement.cell)
            .with_context(|| {
                format!(
                    "failed to place {} at {},{}",
                    placement.kind.name(),
                    placement.cell.column(),
                    placement.cell.row()
                )
            })?;
        info!(tower = tower.get(), kind = placement.kind.name(), "tower placed");
    }

    let frame = Duration::from_millis(args.frame_ms);
    let limit = Duration::from_secs(args.max_seconds);
    let mut elapsed = Duration::ZERO;
    while !simulation.is_over() {
        if elapsed >= limit {
            warn!(seconds = args.max_seconds, "time limit reached before the run ended");
            break;
        }
        let progress = simulation.wave_progress();
        let idle = matches!(progress.state, WaveState::Waiting | WaveState::Completed);
        if idle && progress.wave < progress.total_waves {
            let wave = simulation
                .start_next_wave()
                .context("failed to start the next wave")?;
            info!(wave = wave.get(), "starting wave");
        }
        simulation.advance(frame);
        elapsed += frame;
    }

    let resources = simulation.resources();
    let progress = simulation.wave_progress();
    info!(
        outcome = ?simulation.outcome(),
        wave = progress.wave,
        total_waves = progress.total_waves,
        money = resources.money,
        life = resources.life,
        score = resources.score,
        seconds = elapsed.as_secs_f32(),
        "run finished"
    );
    if simulation.is_over() {
        Ok(())
    } else {
        bail!("run did not finish within {} simulated seconds", args.max_seconds)
    }
}

/// Entry point for the Tower Siege command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    run(&args)
}
