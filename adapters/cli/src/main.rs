#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Devour arena.

mod scenario;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scenario::Scenario;
use simulation::Simulation;

/// Headless Devour simulation.
#[derive(Debug, Parser)]
#[command(name = "devour")]
#[command(about = "Runs a headless Devour arena and logs what happened", long_about = None)]
#[command(version)]
struct Cli {
    /// Scenario file; the bundled arena is used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Frame length in milliseconds.
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,

    /// Overrides the scenario's random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Holds the sprint control for every player.
    #[arg(long)]
    sprint: bool,
}

/// Entry point for the Devour command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    ensure!(cli.dt_ms > 0, "--dt-ms must be greater than zero");

    let mut scenario = Scenario::load(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        scenario.world.rng_seed = seed;
    }

    info!(
        ticks = cli.ticks,
        dt_ms = cli.dt_ms,
        seed = scenario.world.rng_seed,
        "starting simulation"
    );

    let dt = Duration::from_millis(cli.dt_ms);
    let mut simulation = Simulation::new(scenario, cli.sprint);
    for _ in 0..cli.ticks {
        simulation.step(dt);
    }
    simulation.report();

    let summary = simulation.summary();
    println!(
        "{} ticks: {} absorptions, {} respawns, {} level ups, {} eliminations",
        devour_world::query::tick_index(simulation.world()),
        summary.absorptions,
        summary.respawns,
        summary.level_ups,
        summary.eliminations
    );
    Ok(())
}
