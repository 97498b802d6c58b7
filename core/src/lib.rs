#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Poly Defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation layers to react to. Systems consume event streams, query
//! immutable snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of tile columns in the playing field.
pub const GRID_COLUMNS: u32 = 10;
/// Number of tile rows in the playing field.
pub const GRID_ROWS: u32 = 10;
/// Side length of a square tile measured in pixels.
pub const TILE_LENGTH: f32 = 50.0;

/// Health granted at the start of a regular run.
pub const STARTING_HEALTH: i32 = 10;
/// Health granted at the start of a hardcore run.
pub const HARDCORE_HEALTH: i32 = 1;
/// Money available at the start of every run.
pub const STARTING_MONEY: u32 = 20;
/// Price of placing a single unit.
pub const UNIT_COST: u32 = 10;
/// Money credited for every adversary eliminated by a unit.
pub const KILL_REWARD: u32 = 10;
/// Health lost whenever an adversary walks off the end of the path.
pub const ESCAPE_PENALTY: i32 = 1;

/// Highest level a unit can be upgraded to.
pub const MAX_UNIT_LEVEL: u8 = 9;
/// Upgrade price charged per current unit level.
pub const UPGRADE_COST_PER_LEVEL: u32 = 5;
/// Lower bound applied to a unit's firing interval after upgrades.
pub const MIN_FIRE_INTERVAL: Duration = Duration::from_millis(100);

/// Distance between a unit's centre and the tip of its barrel in pixels.
pub const BARREL_LENGTH: f32 = 25.0;
/// Per-axis distance under which an adversary counts as having reached a waypoint.
pub const ARRIVAL_TOLERANCE: f32 = 2.0;
/// Time a shot effect stays visible after a unit fires.
pub const SHOT_LIFETIME: Duration = Duration::from_millis(50);
/// Wave number at which the spawn interval would reach zero before flooring.
pub const SPAWN_RAMP_WAVES: u32 = 30;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time and runs one
    /// movement step for every adversary.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Toggles a tile in the pending placement selection.
    SelectTile {
        /// Tile to add to or remove from the selection.
        tile: TileIndex,
    },
    /// Requests placement of a single unit on the provided tile.
    PlaceUnit {
        /// Tile the unit should occupy.
        tile: TileIndex,
    },
    /// Requests placement of units on every listed tile while money allows.
    PlaceUnits {
        /// Tiles to fortify, processed in order.
        tiles: Vec<TileIndex>,
    },
    /// Toggles the selection flag of the unit standing on the provided tile.
    SelectUnit {
        /// Tile occupied by the unit.
        tile: TileIndex,
    },
    /// Upgrades every selected unit once, as far as money permits.
    UpgradeSelected,
    /// Starts the next wave of adversaries.
    StartWave,
    /// Replaces the active difficulty profile.
    SetDifficulty {
        /// Difficulty that should become active.
        difficulty: Difficulty,
    },
    /// Flips hardcore mode on or off.
    ToggleHardcore,
    /// Restores the starting state and draws a fresh path.
    Reset,
    /// Draws a fresh path before the run starts.
    RegenerateTrack,
    /// Requests that a new adversary enter the path at its start tile.
    SpawnAdversary,
    /// Signals that the active wave has no adversaries left to spawn.
    FinishSpawning,
    /// Replaces every unit's target with the provided assignments.
    ///
    /// Units absent from the list lose their target.
    AssignTargets {
        /// Target assignments computed for the current tick.
        targets: Vec<UnitTarget>,
    },
    /// Requests that a loaded unit fire at the provided adversary.
    FireUnit {
        /// Unit pulling the trigger.
        unit: UnitId,
        /// Adversary receiving the shot.
        target: AdversaryId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a new path was generated.
    TrackGenerated {
        /// Path adversaries will follow from now on.
        path: TrackPath,
    },
    /// Reports that a tile entered or left the placement selection.
    TileSelectionChanged {
        /// Tile whose selection flag flipped.
        tile: TileIndex,
        /// Whether the tile is now selected.
        selected: bool,
    },
    /// Confirms that a unit was placed into the world.
    UnitPlaced {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Tile occupied by the unit.
        tile: TileIndex,
        /// Pixel centre of the unit.
        position: PixelPoint,
    },
    /// Reports that a unit's selection flag flipped.
    UnitSelectionChanged {
        /// Unit whose selection changed.
        unit: UnitId,
        /// Whether the unit is now selected.
        selected: bool,
        /// Total upgrade price of all selected units below the level cap.
        upgrade_cost: u32,
    },
    /// Confirms that a unit gained a level.
    UnitUpgraded {
        /// Unit that was upgraded.
        unit: UnitId,
        /// Level reached by the upgrade.
        level: UnitLevel,
        /// Combat statistics after the upgrade.
        stats: UnitStats,
        /// Money spent on the upgrade.
        cost: u32,
    },
    /// Reports that a unit fired a shot.
    UnitFired {
        /// Unit that fired.
        unit: UnitId,
        /// Adversary that was hit.
        target: AdversaryId,
        /// Transient line drawn from the barrel tip to the adversary.
        shot: ShotGeometry,
        /// Time the shot effect stays visible.
        lifetime: Duration,
    },
    /// Confirms that an adversary entered the path.
    AdversarySpawned {
        /// Identifier assigned to the adversary.
        adversary: AdversaryId,
        /// Pixel position of the spawn tile centre.
        position: PixelPoint,
        /// Starting health of the adversary.
        health: i32,
    },
    /// Reports that an adversary moved during a tick.
    AdversaryMoved {
        /// Adversary that moved.
        adversary: AdversaryId,
        /// Position before the movement step.
        from: PixelPoint,
        /// Position after the movement step.
        to: PixelPoint,
    },
    /// Reports that an adversary ran out of health and was removed.
    AdversaryDied {
        /// Adversary that died.
        adversary: AdversaryId,
        /// Money credited for the kill.
        reward: u32,
    },
    /// Reports that an adversary reached the end of the path and was removed.
    AdversaryEscaped {
        /// Adversary that escaped.
        adversary: AdversaryId,
    },
    /// Reports the player's health after a change.
    HealthChanged {
        /// Current health; may drop below zero.
        health: i32,
    },
    /// Reports the player's money after a change.
    MoneyChanged {
        /// Current money.
        money: u32,
    },
    /// Reports the wave counter after a change.
    WaveChanged {
        /// Current wave number; zero before the first wave.
        wave: u32,
    },
    /// Announces the parameters of a wave that just started spawning.
    WaveStarted {
        /// Wave number that started.
        wave: u32,
        /// Number of adversaries the wave will spawn.
        spawn_count: u32,
        /// Simulated time between consecutive spawns.
        spawn_interval: Duration,
    },
    /// Announces that the active wave spawned all of its adversaries.
    SpawningFinished {
        /// Wave that finished spawning.
        wave: u32,
    },
    /// Announces that every adversary of the wave has been removed.
    WaveCleared {
        /// Wave that was cleared.
        wave: u32,
    },
    /// Announces that the player's health dropped to zero or below.
    GameOver {
        /// Wave during which the run ended.
        wave: u32,
    },
    /// Announces that the world returned to its starting state.
    GameReset,
    /// Announces that a new difficulty profile became active.
    DifficultyChanged {
        /// Difficulty that became active.
        difficulty: Difficulty,
    },
    /// Announces that hardcore mode was toggled.
    HardcoreChanged {
        /// Whether hardcore mode is now enabled.
        enabled: bool,
        /// Health after the toggle.
        health: i32,
    },
    /// Reports that a command was refused without changing state.
    CommandRejected {
        /// Specific reason the command failed.
        reason: CommandError,
    },
}

/// Reasons a command may be refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum CommandError {
    /// The player cannot afford the requested purchase.
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds {
        /// Price of the purchase.
        required: u32,
        /// Money the player holds.
        available: u32,
    },
    /// The tile is out of range, part of the path, or already occupied.
    #[error("tile {} cannot be used", .tile.get())]
    InvalidTile {
        /// Tile named by the command.
        tile: TileIndex,
    },
    /// A wave is still spawning or draining.
    #[error("a wave is already in progress")]
    WaveInProgress,
    /// The run has started, so pre-run settings are locked until reset.
    #[error("settings are locked once the run has started")]
    RunInProgress,
    /// The player's health ran out; only a reset is accepted for new waves.
    #[error("the game is over")]
    GameOver,
    /// No unit exists at the requested location.
    #[error("no unit stands on the requested tile")]
    UnknownUnit,
}

/// Identifier of a single cell in the tile grid.
///
/// Cells are numbered column-major: `column * GRID_ROWS + row`, so the left
/// column holds indices `0..GRID_ROWS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex(u32);

impl TileIndex {
    /// Wraps a raw tile index. The value is not validated.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Builds the index of the tile at the provided column and row.
    #[must_use]
    pub const fn from_coords(column: u32, row: u32) -> Option<Self> {
        if column < GRID_COLUMNS && row < GRID_ROWS {
            Some(Self(column * GRID_ROWS + row))
        } else {
            None
        }
    }

    /// Retrieves the raw index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Zero-based column (x axis) of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.0 / GRID_ROWS
    }

    /// Zero-based row (y axis) of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.0 % GRID_ROWS
    }

    /// Reports whether the index names a cell inside the grid.
    #[must_use]
    pub const fn in_bounds(&self) -> bool {
        self.0 < GRID_COLUMNS * GRID_ROWS
    }

    /// Pixel coordinates of the tile centre.
    #[must_use]
    pub fn center(&self) -> PixelPoint {
        let half = TILE_LENGTH / 2.0;
        PixelPoint::new(
            self.column() as f32 * TILE_LENGTH + half,
            self.row() as f32 * TILE_LENGTH + half,
        )
    }

    /// Reports whether two tiles share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: TileIndex) -> bool {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row()) == 1
    }
}

/// Position on the playing field measured in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    x: f32,
    y: f32,
}

impl PixelPoint {
    /// Creates a new pixel position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: PixelPoint) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Reports whether both axes lie strictly within `tolerance` of `other`.
    #[must_use]
    pub fn is_near(self, other: PixelPoint, tolerance: f32) -> bool {
        (self.x - other.x).abs() < tolerance && (self.y - other.y).abs() < tolerance
    }
}

/// Destination an adversary walks toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Waypoint {
    /// Centre of a path tile.
    Tile(TileIndex),
    /// Terminal marker past the last path tile; reaching it costs health.
    Exit,
}

impl Waypoint {
    /// Pixel position of the waypoint, if it lies on the grid.
    #[must_use]
    pub fn position(&self) -> Option<PixelPoint> {
        match self {
            Self::Tile(tile) => Some(tile.center()),
            Self::Exit => None,
        }
    }
}

/// Ordered sequence of tiles adversaries walk from spawn to exit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPath {
    tiles: Vec<TileIndex>,
}

impl TrackPath {
    /// Creates a path from the provided tiles.
    #[must_use]
    pub fn new(tiles: Vec<TileIndex>) -> Self {
        Self { tiles }
    }

    /// Tiles that make up the path, in walking order.
    #[must_use]
    pub fn tiles(&self) -> &[TileIndex] {
        &self.tiles
    }

    /// Number of tiles on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether the path holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tile where adversaries spawn.
    #[must_use]
    pub fn start(&self) -> Option<TileIndex> {
        self.tiles.first().copied()
    }

    /// Waypoint stored at the provided position, or [`Waypoint::Exit`] past the end.
    #[must_use]
    pub fn waypoint(&self, index: usize) -> Waypoint {
        self.tiles
            .get(index)
            .copied()
            .map_or(Waypoint::Exit, Waypoint::Tile)
    }

    /// Reports whether the tile is part of the path.
    #[must_use]
    pub fn contains(&self, tile: TileIndex) -> bool {
        self.tiles.contains(&tile)
    }
}

/// Selectable difficulty levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Slow, fragile adversaries spawning one per wave number.
    #[default]
    Easy,
    /// Twice the adversaries of easy, faster and sturdier.
    Medium,
    /// Three times the adversaries of easy with the tightest spawn cadence.
    Hard,
}

impl Difficulty {
    /// Every difficulty in ascending order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Tuning values associated with the difficulty.
    #[must_use]
    pub const fn profile(self) -> DifficultyProfile {
        match self {
            Self::Easy => DifficultyProfile {
                adversary_speed: 0.5,
                adversary_health: 65,
                spawn_interval: Duration::from_millis(1500),
                spawn_interval_floor: Duration::from_millis(1000),
                count_multiplier: 1,
            },
            Self::Medium => DifficultyProfile {
                adversary_speed: 0.75,
                adversary_health: 85,
                spawn_interval: Duration::from_millis(1250),
                spawn_interval_floor: Duration::from_millis(500),
                count_multiplier: 2,
            },
            Self::Hard => DifficultyProfile {
                adversary_speed: 1.0,
                adversary_health: 100,
                spawn_interval: Duration::from_millis(1000),
                spawn_interval_floor: Duration::from_millis(100),
                count_multiplier: 3,
            },
        }
    }
}

/// Adversary and wave tuning for a difficulty level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Pixels an adversary travels per tick.
    pub adversary_speed: f32,
    /// Health of a wave-zero adversary; each wave adds one point.
    pub adversary_health: i32,
    /// Spawn interval before wave scaling.
    pub spawn_interval: Duration,
    /// Shortest spawn interval wave scaling may produce.
    pub spawn_interval_floor: Duration,
    /// Adversaries spawned per wave number.
    pub count_multiplier: u32,
}

impl DifficultyProfile {
    /// Number of adversaries spawned by the provided wave.
    #[must_use]
    pub const fn spawn_count(&self, wave: u32) -> u32 {
        wave.saturating_mul(self.count_multiplier)
    }

    /// Time between spawns for the provided wave.
    ///
    /// The base interval shrinks linearly, reaching zero at
    /// [`SPAWN_RAMP_WAVES`], and never drops below the profile's floor.
    #[must_use]
    pub fn spawn_interval_for(&self, wave: u32) -> Duration {
        let remaining = u128::from(SPAWN_RAMP_WAVES.saturating_sub(wave));
        let scaled = self.spawn_interval.as_nanos() * remaining / u128::from(SPAWN_RAMP_WAVES);
        let scaled = Duration::from_nanos(u64::try_from(scaled).unwrap_or(u64::MAX));
        scaled.max(self.spawn_interval_floor)
    }

    /// Starting health of adversaries spawned by the provided wave.
    #[must_use]
    pub fn adversary_health_for(&self, wave: u32) -> i32 {
        let bonus = i32::try_from(wave).unwrap_or(i32::MAX);
        self.adversary_health.saturating_add(bonus)
    }
}

/// Lifecycle of the active wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// No wave is running; the next one may start.
    #[default]
    Idle,
    /// The spawn timer is still releasing adversaries.
    Spawning,
    /// Every adversary spawned; waiting for the survivors to die or escape.
    Draining,
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an adversary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdversaryId(u32);

impl AdversaryId {
    /// Creates a new adversary identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Upgrade level of a unit, between 1 and [`MAX_UNIT_LEVEL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitLevel(u8);

impl UnitLevel {
    /// Level of a freshly placed unit.
    pub const BASE: Self = Self(1);
    /// Highest reachable level.
    pub const MAX: Self = Self(MAX_UNIT_LEVEL);

    /// Creates a level, clamping the value into the valid range.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        if value < 1 {
            Self::BASE
        } else if value > MAX_UNIT_LEVEL {
            Self::MAX
        } else {
            Self(value)
        }
    }

    /// Retrieves the numeric level.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Reports whether the level cap has been reached.
    #[must_use]
    pub const fn is_max(&self) -> bool {
        self.0 >= MAX_UNIT_LEVEL
    }

    /// Level reached by the next upgrade, if any.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        if self.is_max() {
            None
        } else {
            Some(Self(self.0 + 1))
        }
    }

    /// Price of upgrading from this level to the next.
    #[must_use]
    pub const fn upgrade_cost(&self) -> u32 {
        UPGRADE_COST_PER_LEVEL * self.0 as u32
    }

    /// Name of the colour presentation layers paint a unit of this level.
    #[must_use]
    pub const fn palette_name(&self) -> &'static str {
        match self.0 {
            1 => "saddlebrown",
            2 => "grey",
            3 => "greenyellow",
            4 => "blue",
            5 => "purple",
            6 => "orange",
            7 => "firebrick",
            8 => "deeppink",
            _ => "gold",
        }
    }
}

/// Combat statistics of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Health removed from the target per shot.
    pub damage: i32,
    /// Reload time between shots.
    pub fire_interval: Duration,
    /// Targeting radius in pixels.
    pub range: f32,
}

impl UnitStats {
    /// Statistics of a freshly placed unit.
    pub const BASE: Self = Self {
        damage: 12,
        fire_interval: Duration::from_millis(1000),
        range: 150.0,
    };

    /// Statistics after a single upgrade.
    #[must_use]
    pub fn upgraded(self) -> Self {
        Self {
            damage: self.damage.saturating_add(3),
            fire_interval: self
                .fire_interval
                .saturating_sub(Duration::from_millis(100))
                .max(MIN_FIRE_INTERVAL),
            range: self.range + 25.0,
        }
    }
}

/// Straight line drawn for a shot between two pixel positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotGeometry {
    /// Start of the line at the firing unit's barrel tip.
    pub from: PixelPoint,
    /// End of the line at the adversary's position.
    pub to: PixelPoint,
}

/// Target chosen for a unit during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitTarget {
    /// Unit that acquired the target.
    pub unit: UnitId,
    /// Adversary selected as the target.
    pub adversary: AdversaryId,
    /// Position of the adversary when the target was chosen.
    pub adversary_position: PixelPoint,
    /// Point the unit's barrel tip turns to face the target.
    pub barrel_tip: PixelPoint,
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Identifier allocated to the unit by the world.
    pub id: UnitId,
    /// Tile occupied by the unit.
    pub tile: TileIndex,
    /// Pixel centre of the unit.
    pub position: PixelPoint,
    /// Current upgrade level.
    pub level: UnitLevel,
    /// Current combat statistics.
    pub stats: UnitStats,
    /// Whether the unit can fire this tick.
    pub loaded: bool,
    /// Whether the player selected the unit for upgrading.
    pub selected: bool,
    /// Adversary the unit tracked on the last tick, if any.
    pub target: Option<AdversaryId>,
    /// End of the unit's barrel.
    pub barrel_tip: PixelPoint,
}

impl UnitSnapshot {
    /// Price of the unit's next upgrade, or `None` at the level cap.
    #[must_use]
    pub fn upgrade_cost(&self) -> Option<u32> {
        if self.level.is_max() {
            None
        } else {
            Some(self.level.upgrade_cost())
        }
    }
}

/// Read-only snapshot describing all units placed on the grid.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Number of units captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Coarse health bracket presentation layers use to tint adversaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HealthBand {
    /// At least half of the maximum health remains.
    Healthy,
    /// Below half of the maximum health.
    Wounded,
    /// Below a quarter of the maximum health.
    Critical,
}

/// Immutable representation of a single adversary's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdversarySnapshot {
    /// Unique identifier assigned to the adversary.
    pub id: AdversaryId,
    /// Current pixel position.
    pub position: PixelPoint,
    /// Index of the last path tile the adversary reached.
    pub path_index: usize,
    /// Remaining health; may be negative for a killed adversary awaiting removal.
    pub health: i32,
    /// Health the adversary spawned with.
    pub max_health: i32,
    /// Pixels travelled per tick.
    pub speed: f32,
}

impl AdversarySnapshot {
    /// Remaining health as a fraction of the maximum, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        (self.health as f32 / self.max_health as f32).clamp(0.0, 1.0)
    }

    /// Health bracket derived from the remaining health.
    #[must_use]
    pub fn health_band(&self) -> HealthBand {
        let fraction = self.health_fraction();
        if fraction < 0.25 {
            HealthBand::Critical
        } else if fraction < 0.5 {
            HealthBand::Wounded
        } else {
            HealthBand::Healthy
        }
    }
}

/// Read-only snapshot describing all adversaries on the path.
#[derive(Clone, Debug, Default)]
pub struct AdversaryView {
    snapshots: Vec<AdversarySnapshot>,
}

impl AdversaryView {
    /// Creates a new adversary view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AdversarySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured adversary snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AdversarySnapshot> {
        self.snapshots.iter()
    }

    /// Number of adversaries captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no adversaries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AdversarySnapshot> {
        self.snapshots
    }
}

/// Player resources and run settings captured at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EconomySnapshot {
    /// Remaining health; may be negative after the run ended.
    pub health: i32,
    /// Money available for placement and upgrades.
    pub money: u32,
    /// Number of the latest wave; zero before the first wave.
    pub wave: u32,
    /// Whether hardcore mode is enabled.
    pub hardcore: bool,
    /// Active difficulty.
    pub difficulty: Difficulty,
    /// Whether the run has ended.
    pub game_over: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn tile_index_encodes_column_major() {
        let tile = TileIndex::from_coords(4, 2).expect("inside grid");
        assert_eq!(tile.get(), 42);
        assert_eq!(tile.column(), 4);
        assert_eq!(tile.row(), 2);
        assert_eq!(tile.center(), PixelPoint::new(225.0, 125.0));
    }

    #[test]
    fn tile_index_rejects_coordinates_outside_grid() {
        assert!(TileIndex::from_coords(GRID_COLUMNS, 0).is_none());
        assert!(TileIndex::from_coords(0, GRID_ROWS).is_none());
        assert!(!TileIndex::new(100).in_bounds());
        assert!(TileIndex::new(99).in_bounds());
    }

    #[test]
    fn adjacency_ignores_diagonals() {
        let origin = TileIndex::new(42);
        assert!(origin.is_adjacent(TileIndex::new(52)));
        assert!(origin.is_adjacent(TileIndex::new(43)));
        assert!(!origin.is_adjacent(TileIndex::new(53)));
        assert!(!origin.is_adjacent(origin));
    }

    #[test]
    fn path_waypoints_end_in_exit() {
        let path = TrackPath::new(vec![TileIndex::new(3), TileIndex::new(13)]);
        assert_eq!(path.waypoint(1), Waypoint::Tile(TileIndex::new(13)));
        assert_eq!(path.waypoint(2), Waypoint::Exit);
        assert_eq!(Waypoint::Exit.position(), None);
    }

    #[test]
    fn spawn_interval_scales_with_wave_and_respects_floor() {
        let easy = Difficulty::Easy.profile();
        assert_eq!(easy.spawn_interval_for(1), Duration::from_millis(1450));
        assert_eq!(easy.spawn_interval_for(15), Duration::from_millis(1000));
        assert_eq!(easy.spawn_interval_for(45), Duration::from_millis(1000));

        let hard = Difficulty::Hard.profile();
        assert_eq!(hard.spawn_interval_for(3), Duration::from_millis(900));
        assert_eq!(hard.spawn_interval_for(30), Duration::from_millis(100));
    }

    #[test]
    fn spawn_count_and_health_scale_with_wave() {
        let medium = Difficulty::Medium.profile();
        assert_eq!(medium.spawn_count(4), 8);
        assert_eq!(medium.adversary_health_for(4), 89);
    }

    #[test]
    fn upgrade_cost_tracks_current_level() {
        assert_eq!(UnitLevel::BASE.upgrade_cost(), 5);
        assert_eq!(UnitLevel::new(4).upgrade_cost(), 20);
        assert_eq!(UnitLevel::MAX.next(), None);
        assert_eq!(UnitLevel::new(0), UnitLevel::BASE);
        assert_eq!(UnitLevel::new(12), UnitLevel::MAX);
    }

    #[test]
    fn upgraded_stats_follow_fixed_increments() {
        let stats = UnitStats::BASE.upgraded();
        assert_eq!(stats.damage, 15);
        assert_eq!(stats.fire_interval, Duration::from_millis(900));
        assert!((stats.range - 175.0).abs() < f32::EPSILON);
    }

    #[test]
    fn fire_interval_never_drops_below_floor() {
        let mut stats = UnitStats::BASE;
        for _ in 0..20 {
            stats = stats.upgraded();
        }
        assert_eq!(stats.fire_interval, MIN_FIRE_INTERVAL);
    }

    #[test]
    fn health_band_uses_half_and_quarter_thresholds() {
        let mut snapshot = AdversarySnapshot {
            id: AdversaryId::new(1),
            position: PixelPoint::default(),
            path_index: 0,
            health: 100,
            max_health: 100,
            speed: 1.0,
        };
        assert_eq!(snapshot.health_band(), HealthBand::Healthy);
        snapshot.health = 40;
        assert_eq!(snapshot.health_band(), HealthBand::Wounded);
        snapshot.health = 20;
        assert_eq!(snapshot.health_band(), HealthBand::Critical);
        snapshot.health = -5;
        assert_eq!(snapshot.health_fraction(), 0.0);
    }

    #[test]
    fn command_round_trips_through_bincode() {
        assert_round_trip(&Command::PlaceUnits {
            tiles: vec![TileIndex::new(42), TileIndex::new(7)],
        });
        assert_round_trip(&Command::SetDifficulty {
            difficulty: Difficulty::Hard,
        });
    }

    #[test]
    fn rejection_event_round_trips_through_bincode() {
        assert_round_trip(&Event::CommandRejected {
            reason: CommandError::InsufficientFunds {
                required: 10,
                available: 4,
            },
        });
    }

    #[test]
    fn command_error_messages_name_the_problem() {
        let error = CommandError::InvalidTile {
            tile: TileIndex::new(42),
        };
        assert_eq!(error.to_string(), "tile 42 cannot be used");
    }
}
