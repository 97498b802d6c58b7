#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless runner that plays Poly Defence waves in simulated time.

mod config;
mod fortify;

use std::{fmt, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use poly_defence_core::Difficulty;
use poly_defence_simulation::{Simulation, WaveReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{Overrides, RunConfig},
    fortify::Fortification,
};

/// Command-line arguments of the headless runner.
#[derive(Debug, Parser)]
#[command(name = "poly-defence", about = "Plays Poly Defence waves headlessly")]
struct Cli {
    /// TOML run file describing the session.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(flatten)]
    overrides: Overrides,
}

/// Outcome of a headless run.
#[derive(Clone, Debug, PartialEq, Eq)]
struct RunSummary {
    seed: u64,
    difficulty: Difficulty,
    waves: Vec<WaveReport>,
    units: usize,
    health: i32,
    money: u32,
    game_over: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cleared = self.waves.iter().filter(|report| report.cleared).count();
        let killed: u32 = self.waves.iter().map(|report| report.killed).sum();
        let escaped: u32 = self.waves.iter().map(|report| report.escaped).sum();
        write!(
            f,
            "seed={} difficulty={:?} waves={} cleared={} killed={} escaped={} units={} health={} money={} game_over={}",
            self.seed,
            self.difficulty,
            self.waves.len(),
            cleared,
            killed,
            escaped,
            self.units,
            self.health,
            self.money,
            self.game_over,
        )
    }
}

fn play(config: &RunConfig) -> RunSummary {
    let mut simulation = Simulation::new(config.simulation());
    let mut fortification = Fortification::plan(simulation.track(), &config.units);
    let mut events = Vec::new();
    let mut waves = Vec::new();

    for _ in 0..config.waves {
        let placed = fortification.build(&mut simulation, &mut events);
        if placed > 0 {
            info!(placed, pending = fortification.remaining(), "fortified");
        }

        events.clear();
        match simulation.run_wave(config.tick(), config.max_ticks, &mut events) {
            Ok(report) => waves.push(report),
            Err(reason) => {
                info!(%reason, "no further waves");
                break;
            }
        }
        if simulation.is_game_over() {
            break;
        }
    }

    let economy = simulation.economy();
    RunSummary {
        seed: config.seed,
        difficulty: economy.difficulty,
        waves,
        units: simulation.units().len(),
        health: economy.health,
        money: economy.money,
        game_over: economy.game_over,
    }
}

/// Entry point for the Poly Defence headless runner.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = RunConfig::resolve(cli.config.as_deref(), &cli.overrides)?;
    info!(seed = config.seed, waves = config.waves, "starting run");

    println!("{}", play(&config));
    Ok(())
}
