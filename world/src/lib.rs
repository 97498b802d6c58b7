#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Poly Defence.

mod adversaries;
mod economy;
mod towers;

use std::{collections::BTreeSet, time::Duration};

use poly_defence_core::{
    AdversaryId, Command, CommandError, Event, ShotGeometry, TileIndex, TrackPath, UnitId,
    UnitTarget, WavePhase, ESCAPE_PENALTY, KILL_REWARD, SHOT_LIFETIME, UNIT_COST,
};
use poly_defence_system_path_generation::PathGeneration;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::{
    adversaries::{AdversaryRegistry, Stride},
    economy::Economy,
    towers::UnitRegistry,
};

#[derive(Clone, Copy, Debug)]
struct ShotEffect {
    shot: ShotGeometry,
    expires_at: Duration,
}

/// Represents the authoritative Poly Defence world state.
#[derive(Debug)]
pub struct World {
    rng: ChaCha8Rng,
    path_generation: PathGeneration,
    path: TrackPath,
    economy: Economy,
    units: UnitRegistry,
    adversaries: AdversaryRegistry,
    selected_tiles: BTreeSet<TileIndex>,
    phase: WavePhase,
    shots: Vec<ShotEffect>,
    clock: Duration,
}

impl World {
    /// Creates a new world whose paths are drawn from the provided seed.
    ///
    /// Two worlds created from the same seed and fed the same commands emit
    /// identical event streams.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let path_generation = PathGeneration::default();
        let path = path_generation.generate(&mut rng);
        Self {
            rng,
            path_generation,
            path,
            economy: Economy::new(),
            units: UnitRegistry::new(),
            adversaries: AdversaryRegistry::new(),
            selected_tiles: BTreeSet::new(),
            phase: WavePhase::Idle,
            shots: Vec::new(),
            clock: Duration::ZERO,
        }
    }

    fn draw_path(&mut self, out_events: &mut Vec<Event>) {
        self.path = self.path_generation.generate(&mut self.rng);
        debug!(tiles = self.path.len(), "track generated");
        out_events.push(Event::TrackGenerated {
            path: self.path.clone(),
        });
    }

    fn ensure_buildable(&self, tile: TileIndex) -> Result<(), CommandError> {
        if !tile.in_bounds() || self.path.contains(tile) || self.units.is_occupied(tile) {
            return Err(CommandError::InvalidTile { tile });
        }
        Ok(())
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        if self.economy.is_game_over() {
            return;
        }

        let now = self.clock;
        for unit in self.units.iter_mut() {
            unit.reload(now);
        }
        self.shots.retain(|effect| effect.expires_at > now);

        let mut escaped = Vec::new();
        for (id, adversary) in self.adversaries.iter_mut() {
            if let Stride::Walked { from, to } = adversary.step(&self.path) {
                out_events.push(Event::AdversaryMoved {
                    adversary: id,
                    from,
                    to,
                });
            }
            if adversary.is_leaving() {
                escaped.push(id);
            }
        }
        for id in escaped {
            self.escape(id, out_events);
        }

        self.settle_wave(out_events);
    }

    fn escape(&mut self, id: AdversaryId, out_events: &mut Vec<Event>) {
        if self.adversaries.remove(id).is_none() {
            return;
        }
        self.release_targets(id);
        out_events.push(Event::AdversaryEscaped { adversary: id });

        let ended = self.economy.damage(ESCAPE_PENALTY);
        out_events.push(Event::HealthChanged {
            health: self.economy.health(),
        });
        if ended {
            let wave = self.economy.wave();
            self.phase = WavePhase::Idle;
            info!(wave, "game over");
            out_events.push(Event::GameOver { wave });
        }
    }

    fn reward_kill(&mut self, id: AdversaryId, out_events: &mut Vec<Event>) {
        if self.adversaries.remove(id).is_none() {
            return;
        }
        self.release_targets(id);
        self.economy.credit(KILL_REWARD);
        out_events.push(Event::AdversaryDied {
            adversary: id,
            reward: KILL_REWARD,
        });
        out_events.push(Event::MoneyChanged {
            money: self.economy.money(),
        });
    }

    fn release_targets(&mut self, id: AdversaryId) {
        for unit in self.units.iter_mut() {
            if unit.target == Some(id) {
                unit.target = None;
            }
        }
    }

    fn settle_wave(&mut self, out_events: &mut Vec<Event>) {
        if self.phase == WavePhase::Draining && self.adversaries.is_empty() {
            self.phase = WavePhase::Idle;
            let wave = self.economy.wave();
            info!(wave, "wave cleared");
            out_events.push(Event::WaveCleared { wave });
        }
    }

    fn toggle_tile(&mut self, tile: TileIndex, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
        self.ensure_buildable(tile)?;
        let selected = !self.selected_tiles.remove(&tile) && self.selected_tiles.insert(tile);
        out_events.push(Event::TileSelectionChanged { tile, selected });
        Ok(())
    }

    fn deselect_tiles(&mut self, out_events: &mut Vec<Event>) {
        for tile in std::mem::take(&mut self.selected_tiles) {
            out_events.push(Event::TileSelectionChanged {
                tile,
                selected: false,
            });
        }
    }

    fn place_unit(&mut self, tile: TileIndex, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
        self.ensure_buildable(tile)?;
        self.economy.debit(UNIT_COST)?;

        let unit = self.units.insert(tile);
        if self.selected_tiles.remove(&tile) {
            out_events.push(Event::TileSelectionChanged {
                tile,
                selected: false,
            });
        }
        out_events.push(Event::UnitPlaced {
            unit,
            tile,
            position: tile.center(),
        });
        out_events.push(Event::MoneyChanged {
            money: self.economy.money(),
        });
        Ok(())
    }

    fn place_units(&mut self, tiles: &[TileIndex], out_events: &mut Vec<Event>) {
        for &tile in tiles {
            if let Err(reason) = self.place_unit(tile, out_events) {
                debug!(tile = tile.get(), %reason, "placement skipped");
                out_events.push(Event::CommandRejected { reason });
            }
        }
        self.deselect_tiles(out_events);
    }

    fn toggle_unit(&mut self, tile: TileIndex, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
        let unit = self
            .units
            .at_tile_mut(tile)
            .ok_or(CommandError::UnknownUnit)?;
        unit.selected = !unit.selected;
        let (id, selected) = (unit.id(), unit.selected);
        out_events.push(Event::UnitSelectionChanged {
            unit: id,
            selected,
            upgrade_cost: self.units.selected_upgrade_cost(),
        });
        Ok(())
    }

    fn upgrade_selected(&mut self, out_events: &mut Vec<Event>) {
        let mut spent: u32 = 0;
        for unit in self.units.iter_mut() {
            if !unit.selected || unit.level().is_max() {
                continue;
            }
            let cost = unit.level().upgrade_cost();
            if self.economy.debit(cost).is_err() {
                continue;
            }
            if let Some(level) = unit.upgrade() {
                spent = spent.saturating_add(cost);
                out_events.push(Event::UnitUpgraded {
                    unit: unit.id(),
                    level,
                    stats: unit.stats(),
                    cost,
                });
            }
        }

        if spent > 0 {
            debug!(spent, "selected units upgraded");
            out_events.push(Event::MoneyChanged {
                money: self.economy.money(),
            });
        }
    }

    fn start_wave(&mut self, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
        if self.economy.is_game_over() {
            return Err(CommandError::GameOver);
        }
        if self.phase != WavePhase::Idle {
            return Err(CommandError::WaveInProgress);
        }

        let wave = self.economy.advance_wave();
        let profile = self.economy.difficulty().profile();
        let spawn_count = profile.spawn_count(wave);
        let spawn_interval = profile.spawn_interval_for(wave);
        self.phase = WavePhase::Spawning;

        info!(wave, spawn_count, ?spawn_interval, "wave started");
        out_events.push(Event::WaveChanged { wave });
        out_events.push(Event::WaveStarted {
            wave,
            spawn_count,
            spawn_interval,
        });
        Ok(())
    }

    fn spawn_adversary(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != WavePhase::Spawning || self.economy.is_game_over() {
            debug!(phase = ?self.phase, "spawn request ignored");
            return;
        }

        let profile = self.economy.difficulty().profile();
        let health = profile.adversary_health_for(self.economy.wave());
        if let Some(adversary) = self
            .adversaries
            .spawn(&self.path, health, profile.adversary_speed)
        {
            let snapshot = adversary.snapshot();
            out_events.push(Event::AdversarySpawned {
                adversary: snapshot.id,
                position: snapshot.position,
                health: snapshot.health,
            });
        }
    }

    fn finish_spawning(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != WavePhase::Spawning {
            return;
        }
        self.phase = WavePhase::Draining;
        out_events.push(Event::SpawningFinished {
            wave: self.economy.wave(),
        });
        self.settle_wave(out_events);
    }

    fn assign_targets(&mut self, targets: &[UnitTarget]) {
        for unit in self.units.iter_mut() {
            unit.target = None;
        }
        for assignment in targets {
            if self.adversaries.get(assignment.adversary).is_none() {
                continue;
            }
            if let Some(unit) = self.units.get_mut(assignment.unit) {
                unit.target = Some(assignment.adversary);
                unit.barrel_tip = assignment.barrel_tip;
            }
        }
    }

    fn fire_unit(
        &mut self,
        unit_id: UnitId,
        target: AdversaryId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let now = self.clock;
        let unit = self.units.get_mut(unit_id).ok_or(CommandError::UnknownUnit)?;
        if !unit.is_loaded() || self.economy.is_game_over() {
            return Ok(());
        }
        let Some(adversary) = self.adversaries.get_mut(target) else {
            return Ok(());
        };

        let shot = ShotGeometry {
            from: unit.barrel_tip,
            to: adversary.position(),
        };
        adversary.hit(unit.stats().damage);
        let killed = adversary.is_dead();
        unit.discharge(now);

        self.shots.push(ShotEffect {
            shot,
            expires_at: now.saturating_add(SHOT_LIFETIME),
        });
        out_events.push(Event::UnitFired {
            unit: unit_id,
            target,
            shot,
            lifetime: SHOT_LIFETIME,
        });

        if killed {
            self.reward_kill(target, out_events);
            self.settle_wave(out_events);
        }
        Ok(())
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        self.units.clear();
        self.adversaries.clear();
        self.selected_tiles.clear();
        self.shots.clear();
        self.phase = WavePhase::Idle;
        self.economy.reset();

        info!("world reset");
        out_events.push(Event::GameReset);
        self.draw_path(out_events);
        out_events.push(Event::HealthChanged {
            health: self.economy.health(),
        });
        out_events.push(Event::MoneyChanged {
            money: self.economy.money(),
        });
        out_events.push(Event::WaveChanged { wave: 0 });
    }

    fn regenerate_track(&mut self, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
        if self.economy.run_started() || !self.units.is_empty() {
            return Err(CommandError::RunInProgress);
        }
        self.deselect_tiles(out_events);
        self.draw_path(out_events);
        Ok(())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Refused commands leave the world untouched and are reported through
/// [`Event::CommandRejected`].
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if let Err(reason) = try_apply(world, command, out_events) {
        debug!(%reason, "command rejected");
        out_events.push(Event::CommandRejected { reason });
    }
}

/// Applies the provided command, returning the refusal reason instead of
/// broadcasting it.
///
/// A refused command emits no events and does not change the world.
pub fn try_apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), CommandError> {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SelectTile { tile } => world.toggle_tile(tile, out_events)?,
        Command::PlaceUnit { tile } => world.place_unit(tile, out_events)?,
        Command::PlaceUnits { tiles } => world.place_units(&tiles, out_events),
        Command::SelectUnit { tile } => world.toggle_unit(tile, out_events)?,
        Command::UpgradeSelected => world.upgrade_selected(out_events),
        Command::StartWave => world.start_wave(out_events)?,
        Command::SetDifficulty { difficulty } => {
            world.economy.set_difficulty(difficulty)?;
            info!(?difficulty, "difficulty changed");
            out_events.push(Event::DifficultyChanged { difficulty });
        }
        Command::ToggleHardcore => {
            let enabled = world.economy.toggle_hardcore()?;
            let health = world.economy.health();
            info!(enabled, "hardcore toggled");
            out_events.push(Event::HardcoreChanged { enabled, health });
            out_events.push(Event::HealthChanged { health });
        }
        Command::Reset => world.reset(out_events),
        Command::RegenerateTrack => world.regenerate_track(out_events)?,
        Command::SpawnAdversary => world.spawn_adversary(out_events),
        Command::FinishSpawning => world.finish_spawning(out_events),
        Command::AssignTargets { targets } => world.assign_targets(&targets),
        Command::FireUnit { unit, target } => world.fire_unit(unit, target, out_events)?,
    }
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use poly_defence_core::{
        AdversaryView, EconomySnapshot, ShotGeometry, TileIndex, TrackPath, UnitId,
        UnitSnapshot, UnitView, WavePhase,
    };

    /// Classification of a single grid tile.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum TileState {
        /// Free tile that may be selected or built on.
        Open,
        /// Free tile currently in the placement selection.
        Selected,
        /// Tile that belongs to the adversary path.
        Path,
        /// Tile occupied by the contained unit.
        Occupied(UnitId),
    }

    /// Provides read-only access to the current path.
    #[must_use]
    pub fn track(world: &World) -> &TrackPath {
        &world.path
    }

    /// Classifies a tile, or returns `None` for indices outside the grid.
    #[must_use]
    pub fn tile_state(world: &World, tile: TileIndex) -> Option<TileState> {
        if !tile.in_bounds() {
            return None;
        }
        if world.path.contains(tile) {
            return Some(TileState::Path);
        }
        if let Some(unit) = world.units.at_tile(tile) {
            return Some(TileState::Occupied(unit.id()));
        }
        if world.selected_tiles.contains(&tile) {
            return Some(TileState::Selected);
        }
        Some(TileState::Open)
    }

    /// Tiles currently in the placement selection, in ascending order.
    #[must_use]
    pub fn selected_tiles(world: &World) -> Vec<TileIndex> {
        world.selected_tiles.iter().copied().collect()
    }

    /// Captures a read-only view of the units on the grid.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().map(|unit| unit.snapshot()).collect())
    }

    /// Snapshot of the unit standing on the provided tile, if any.
    #[must_use]
    pub fn unit_at(world: &World, tile: TileIndex) -> Option<UnitSnapshot> {
        world.units.at_tile(tile).map(|unit| unit.snapshot())
    }

    /// Combined price of upgrading every selected unit below the level cap.
    #[must_use]
    pub fn selected_upgrade_cost(world: &World) -> u32 {
        world.units.selected_upgrade_cost()
    }

    /// Captures a read-only view of the adversaries on the path.
    #[must_use]
    pub fn adversary_view(world: &World) -> AdversaryView {
        AdversaryView::from_snapshots(
            world
                .adversaries
                .iter()
                .map(|(_, adversary)| adversary.snapshot())
                .collect(),
        )
    }

    /// Captures the player's resources and run settings.
    #[must_use]
    pub fn economy(world: &World) -> EconomySnapshot {
        world.economy.snapshot()
    }

    /// Reports the lifecycle phase of the current wave.
    #[must_use]
    pub fn wave_phase(world: &World) -> WavePhase {
        world.phase
    }

    /// Reports whether the player's health has run out.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.economy.is_game_over()
    }

    /// Shot lines that are still visible.
    #[must_use]
    pub fn active_shots(world: &World) -> Vec<ShotGeometry> {
        world.shots.iter().map(|effect| effect.shot).collect()
    }

    /// Total simulated time the world has advanced through.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }
}
