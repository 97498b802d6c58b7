//! Run file loading and command-line overrides for the headless runner.

use std::{fs, path::Path, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Args;
use poly_defence_core::{Difficulty, TileIndex};
use poly_defence_simulation::{SimulationConfig, DEFAULT_SEED};
use serde::Deserialize;

const DEFAULT_TICK_HZ: u32 = 60;
const DEFAULT_WAVES: u32 = 5;
const DEFAULT_MAX_TICKS: u64 = 60 * 60 * 10;

/// Settings of a headless run, as read from a TOML run file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RunConfig {
    pub(crate) seed: u64,
    pub(crate) difficulty: Difficulty,
    pub(crate) hardcore: bool,
    /// Simulated ticks per second.
    pub(crate) tick_hz: u32,
    pub(crate) waves: u32,
    /// Tick cap per wave.
    pub(crate) max_ticks: u64,
    /// Tiles to fortify; empty means tiles bordering the path.
    pub(crate) units: Vec<TileIndex>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            difficulty: Difficulty::Easy,
            hardcore: false,
            tick_hz: DEFAULT_TICK_HZ,
            waves: DEFAULT_WAVES,
            max_ticks: DEFAULT_MAX_TICKS,
            units: Vec::new(),
        }
    }
}

/// Command-line flags that replace individual run file fields.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct Overrides {
    /// Seed for path generation.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Difficulty: easy, medium or hard.
    #[arg(long, value_parser = parse_difficulty)]
    pub(crate) difficulty: Option<Difficulty>,
    /// Start with a single point of health.
    #[arg(long)]
    pub(crate) hardcore: bool,
    /// Simulated ticks per second.
    #[arg(long)]
    pub(crate) tick_hz: Option<u32>,
    /// Number of waves to play.
    #[arg(long)]
    pub(crate) waves: Option<u32>,
    /// Tick cap per wave.
    #[arg(long)]
    pub(crate) max_ticks: Option<u64>,
    /// Tile to fortify. May be repeated.
    #[arg(long = "unit", value_name = "TILE")]
    pub(crate) units: Vec<u32>,
}

fn parse_difficulty(value: &str) -> Result<Difficulty, String> {
    match value.to_ascii_lowercase().as_str() {
        "easy" => Ok(Difficulty::Easy),
        "medium" => Ok(Difficulty::Medium),
        "hard" => Ok(Difficulty::Hard),
        other => Err(format!("unknown difficulty `{other}`")),
    }
}

impl RunConfig {
    /// Reads the run file, if any, and layers the command-line overrides on top.
    pub(crate) fn resolve(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.merge(overrides);
        config.validate()?;
        Ok(config)
    }

    fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read run file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid run file {}", path.display()))
    }

    fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse run configuration")
    }

    fn merge(&mut self, overrides: &Overrides) {
        if let Some(seed) = overrides.seed {
            self.seed = seed;
        }
        if let Some(difficulty) = overrides.difficulty {
            self.difficulty = difficulty;
        }
        self.hardcore |= overrides.hardcore;
        if let Some(tick_hz) = overrides.tick_hz {
            self.tick_hz = tick_hz;
        }
        if let Some(waves) = overrides.waves {
            self.waves = waves;
        }
        if let Some(max_ticks) = overrides.max_ticks {
            self.max_ticks = max_ticks;
        }
        if !overrides.units.is_empty() {
            self.units = overrides.units.iter().copied().map(TileIndex::new).collect();
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.tick_hz > 0, "tick_hz must be positive");
        ensure!(self.max_ticks > 0, "max_ticks must be positive");
        if let Some(tile) = self.units.iter().find(|tile| !tile.in_bounds()) {
            anyhow::bail!("unit tile {} lies outside the grid", tile.get());
        }
        Ok(())
    }

    /// Simulated duration of one tick.
    pub(crate) fn tick(&self) -> Duration {
        Duration::from_secs(1) / self.tick_hz
    }

    pub(crate) fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            seed: self.seed,
            difficulty: self.difficulty,
            hardcore: self.hardcore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = RunConfig::from_toml("").expect("empty file parses");
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.tick(), Duration::from_nanos(16_666_666));
    }

    #[test]
    fn run_file_fields_are_read() {
        let config = RunConfig::from_toml(
            r#"
            seed = 99
            difficulty = "hard"
            hardcore = true
            tick_hz = 20
            waves = 3
            max_ticks = 5000
            units = [41, 42, 57]
            "#,
        )
        .expect("run file parses");

        assert_eq!(config.seed, 99);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert!(config.hardcore);
        assert_eq!(config.tick(), Duration::from_millis(50));
        assert_eq!(config.waves, 3);
        assert_eq!(config.max_ticks, 5000);
        assert_eq!(
            config.units,
            vec![TileIndex::new(41), TileIndex::new(42), TileIndex::new(57)]
        );
    }

    #[test]
    fn unknown_fields_and_difficulties_are_rejected() {
        assert!(RunConfig::from_toml("speed = 3").is_err());
        assert!(RunConfig::from_toml("difficulty = \"nightmare\"").is_err());
        assert!(parse_difficulty("Nightmare").is_err());
        assert_eq!(parse_difficulty("Medium"), Ok(Difficulty::Medium));
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = RunConfig::from_toml("seed = 1\nwaves = 2\nunits = [5]").expect("parses");
        config.merge(&Overrides {
            seed: Some(7),
            difficulty: Some(Difficulty::Medium),
            units: vec![11, 12],
            ..Overrides::default()
        });

        assert_eq!(config.seed, 7);
        assert_eq!(config.waves, 2);
        assert_eq!(config.difficulty, Difficulty::Medium);
        assert_eq!(config.units, vec![TileIndex::new(11), TileIndex::new(12)]);
        assert_eq!(config.simulation().seed, 7);
    }

    #[test]
    fn invalid_settings_fail_validation() {
        let mut config = RunConfig::default();
        config.merge(&Overrides {
            tick_hz: Some(0),
            ..Overrides::default()
        });
        assert!(config.validate().is_err());

        let config = RunConfig {
            units: vec![TileIndex::new(100)],
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_run_file_is_reported() {
        let error = RunConfig::resolve(Some(Path::new("/nonexistent/run.toml")), &Overrides::default())
            .expect_err("missing file");
        assert!(error.to_string().contains("failed to read run file"));
    }
}
