#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-step control loop that drives the world and its systems.
//!
//! [`Simulation`] owns the authoritative [`World`] together with the spawn
//! timer, the targeting system and the combat system. Every call to
//! [`Simulation::step`] advances the clock and moves adversaries, lets the
//! spawn timer release the wave, then assigns targets and fires loaded units,
//! so movement and deaths always settle before targeting reads the field.

use std::time::Duration;

use poly_defence_core::{
    AdversaryView, Command, CommandError, Difficulty, EconomySnapshot, Event, TileIndex,
    TrackPath, UnitSnapshot, UnitTarget, UnitView, WavePhase,
};
use poly_defence_system_spawning::Spawning;
use poly_defence_system_tower_combat::TowerCombat;
use poly_defence_system_tower_targeting::TowerTargeting;
use poly_defence_world::{self as world, query, World};
use tracing::{debug, info, trace};

/// Seed used when no explicit seed is configured.
pub const DEFAULT_SEED: u64 = 0x5eed_cafe;

/// Nominal duration of one simulation tick (60 Hz).
pub const NOMINAL_TICK: Duration = Duration::from_micros(16_667);

/// Run settings applied when the simulation is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Seed for path generation.
    pub seed: u64,
    /// Difficulty active from the first wave.
    pub difficulty: Difficulty,
    /// Whether the run starts in hardcore mode.
    pub hardcore: bool,
}

impl SimulationConfig {
    /// Creates a configuration for a regular run with the provided seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            seed,
            difficulty: Difficulty::Easy,
            hardcore: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

/// Tally of what happened while a single wave ran.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaveReport {
    /// Wave number that was started.
    pub wave: u32,
    /// Ticks stepped before the wave ended or the tick cap was reached.
    pub ticks: u64,
    /// Adversaries that entered the path.
    pub spawned: u32,
    /// Adversaries killed by units.
    pub killed: u32,
    /// Adversaries that reached the exit.
    pub escaped: u32,
    /// Whether every adversary of the wave was removed.
    pub cleared: bool,
    /// Whether the run ended during the wave.
    pub game_over: bool,
}

impl WaveReport {
    fn tally(wave: u32, ticks: u64, events: &[Event]) -> Self {
        let mut report = Self {
            wave,
            ticks,
            ..Self::default()
        };
        for event in events {
            match event {
                Event::AdversarySpawned { .. } => report.spawned += 1,
                Event::AdversaryDied { .. } => report.killed += 1,
                Event::AdversaryEscaped { .. } => report.escaped += 1,
                Event::WaveCleared { wave: cleared } if *cleared == wave => report.cleared = true,
                Event::GameOver { .. } => report.game_over = true,
                _ => {}
            }
        }
        report
    }
}

/// World plus systems, advanced one fixed step at a time.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    spawning: Spawning,
    targeting: TowerTargeting,
    combat: TowerCombat,
    commands: Vec<Command>,
    targets: Vec<UnitTarget>,
}

impl Simulation {
    /// Creates a simulation with a freshly generated path.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let mut world = World::new(config.seed);
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::SetDifficulty {
                difficulty: config.difficulty,
            },
            &mut events,
        );
        if config.hardcore {
            world::apply(&mut world, Command::ToggleHardcore, &mut events);
        }
        info!(
            seed = config.seed,
            difficulty = ?config.difficulty,
            hardcore = config.hardcore,
            path_tiles = query::track(&world).len(),
            "simulation created"
        );

        Self {
            world,
            spawning: Spawning::new(),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            commands: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Advances the simulation by one tick of `dt` simulated time.
    pub fn step(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let start = out_events.len();
        world::apply(&mut self.world, Command::Tick { dt }, out_events);
        self.pump_spawning(start, out_events);

        if query::is_game_over(&self.world) {
            return;
        }

        self.targeting.handle(
            &query::unit_view(&self.world),
            &query::adversary_view(&self.world),
            &mut self.targets,
        );
        world::apply(
            &mut self.world,
            Command::AssignTargets {
                targets: self.targets.clone(),
            },
            out_events,
        );

        self.commands.clear();
        self.combat
            .handle(query::unit_view(&self.world), &self.targets, &mut self.commands);
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, out_events);
        }

        trace!(emitted = out_events.len() - start, "tick processed");
    }

    /// Applies a player command and lets the spawn timer observe the result.
    pub fn execute(&mut self, command: Command, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
        let start = out_events.len();
        world::try_apply(&mut self.world, command, out_events)?;
        self.pump_spawning(start, out_events);
        Ok(())
    }

    fn pump_spawning(&mut self, from: usize, out_events: &mut Vec<Event>) {
        self.commands.clear();
        self.spawning.handle(&out_events[from..], &mut self.commands);
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, out_events);
        }
    }

    /// Toggles a tile in the placement selection and reports whether it is now selected.
    pub fn select_tile(&mut self, tile: TileIndex, out_events: &mut Vec<Event>) -> Result<bool, CommandError> {
        self.execute(Command::SelectTile { tile }, out_events)?;
        Ok(query::selected_tiles(&self.world).contains(&tile))
    }

    /// Places a unit on the tile and returns its snapshot.
    pub fn place_unit(
        &mut self,
        tile: TileIndex,
        out_events: &mut Vec<Event>,
    ) -> Result<UnitSnapshot, CommandError> {
        self.execute(Command::PlaceUnit { tile }, out_events)?;
        query::unit_at(&self.world, tile).ok_or(CommandError::UnknownUnit)
    }

    /// Places units on every selected tile as money allows and returns how many were placed.
    pub fn place_selected_units(&mut self, out_events: &mut Vec<Event>) -> Result<usize, CommandError> {
        let before = query::unit_view(&self.world).len();
        let tiles = query::selected_tiles(&self.world);
        self.execute(Command::PlaceUnits { tiles }, out_events)?;
        Ok(query::unit_view(&self.world).len() - before)
    }

    /// Toggles selection of the unit on the tile and returns the total upgrade cost of the selection.
    pub fn select_unit(&mut self, tile: TileIndex, out_events: &mut Vec<Event>) -> Result<u32, CommandError> {
        self.execute(Command::SelectUnit { tile }, out_events)?;
        Ok(query::selected_upgrade_cost(&self.world))
    }

    /// Upgrades every affordable selected unit once and returns the money spent.
    pub fn upgrade_selected(&mut self, out_events: &mut Vec<Event>) -> Result<u32, CommandError> {
        let before = query::economy(&self.world).money;
        self.execute(Command::UpgradeSelected, out_events)?;
        let spent = before.saturating_sub(query::economy(&self.world).money);
        debug!(spent, "upgrade requested");
        Ok(spent)
    }

    /// Starts the next wave and returns its number.
    pub fn start_wave(&mut self, out_events: &mut Vec<Event>) -> Result<u32, CommandError> {
        self.execute(Command::StartWave, out_events)?;
        Ok(query::economy(&self.world).wave)
    }

    /// Selects the difficulty used from the first wave on.
    pub fn set_difficulty(
        &mut self,
        difficulty: Difficulty,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        self.execute(Command::SetDifficulty { difficulty }, out_events)
    }

    /// Flips hardcore mode and reports whether it is now enabled.
    pub fn toggle_hardcore(&mut self, out_events: &mut Vec<Event>) -> Result<bool, CommandError> {
        self.execute(Command::ToggleHardcore, out_events)?;
        Ok(query::economy(&self.world).hardcore)
    }

    /// Draws a new path before the run starts.
    pub fn regenerate_track(&mut self, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
        self.execute(Command::RegenerateTrack, out_events)
    }

    /// Restores the starting state on a freshly drawn path.
    pub fn reset(&mut self, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
        self.execute(Command::Reset, out_events)
    }

    /// Starts a wave and steps until it ends, the run ends or `max_ticks` elapse.
    pub fn run_wave(
        &mut self,
        dt: Duration,
        max_ticks: u64,
        out_events: &mut Vec<Event>,
    ) -> Result<WaveReport, CommandError> {
        let start = out_events.len();
        let wave = self.start_wave(out_events)?;

        let mut ticks = 0;
        while ticks < max_ticks && query::wave_phase(&self.world) != WavePhase::Idle {
            self.step(dt, out_events);
            ticks += 1;
        }

        let report = WaveReport::tally(wave, ticks, &out_events[start..]);
        info!(
            wave,
            ticks,
            killed = report.killed,
            escaped = report.escaped,
            cleared = report.cleared,
            "wave finished"
        );
        Ok(report)
    }

    /// Provides read-only access to the underlying world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current path.
    #[must_use]
    pub fn track(&self) -> &TrackPath {
        query::track(&self.world)
    }

    /// Player resources and run settings.
    #[must_use]
    pub fn economy(&self) -> EconomySnapshot {
        query::economy(&self.world)
    }

    /// Lifecycle phase of the current wave.
    #[must_use]
    pub fn wave_phase(&self) -> WavePhase {
        query::wave_phase(&self.world)
    }

    /// Snapshot of every unit.
    #[must_use]
    pub fn units(&self) -> UnitView {
        query::unit_view(&self.world)
    }

    /// Snapshot of every adversary.
    #[must_use]
    pub fn adversaries(&self) -> AdversaryView {
        query::adversary_view(&self.world)
    }

    /// Reports whether the spawn timer is still releasing the current wave.
    #[must_use]
    pub fn is_spawning(&self) -> bool {
        self.spawning.is_active()
    }

    /// Reports whether the run has ended.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        query::is_game_over(&self.world)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}
