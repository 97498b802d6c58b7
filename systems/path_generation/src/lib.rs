#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Randomised track generation that carves a rightward path across the grid.
//!
//! Paths start on a random row of the leftmost column and walk tile by tile
//! toward the right edge. A vertical step is always followed by a horizontal
//! one, so every path reaches the right edge in a bounded number of steps.

use poly_defence_core::{TileIndex, TrackPath, GRID_COLUMNS, GRID_ROWS};
use rand::Rng;

/// Dimensions of the area the generator may carve the path through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    columns: u32,
    rows: u32,
}

impl Config {
    /// Creates a configuration for the provided dimensions.
    ///
    /// Dimensions larger than the tile grid are clamped to it.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns: columns.min(GRID_COLUMNS),
            rows: rows.min(GRID_ROWS),
        }
    }

    /// Number of columns the path crosses.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows the path may wander through.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(GRID_COLUMNS, GRID_ROWS)
    }
}

/// Generator producing monotonic left-to-right paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct PathGeneration {
    config: Config,
}

impl PathGeneration {
    /// Creates a generator for the provided area.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Draws a new path using the supplied random source.
    ///
    /// Returns an empty path only when the configured area has no cells.
    pub fn generate<R>(&self, rng: &mut R) -> TrackPath
    where
        R: Rng + ?Sized,
    {
        let columns = self.config.columns;
        let rows = self.config.rows;
        if columns == 0 || rows == 0 {
            return TrackPath::default();
        }

        let mut column = 0;
        let mut row = rng.gen_range(0..rows);
        let mut previous: Option<Step> = None;
        let mut tiles = Vec::new();

        loop {
            if let Some(tile) = TileIndex::from_coords(column, row) {
                tiles.push(tile);
            }

            let step = choose_step(rng, previous, row, rows);
            match step {
                Step::Right => {
                    column += 1;
                    if column >= columns {
                        break;
                    }
                }
                Step::Up => row = row.saturating_sub(1),
                Step::Down => row += 1,
            }
            previous = Some(step);
        }

        TrackPath::new(tiles)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Right,
    Up,
    Down,
}

impl Step {
    fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

fn choose_step<R>(rng: &mut R, previous: Option<Step>, row: u32, rows: u32) -> Step
where
    R: Rng + ?Sized,
{
    if rows < 2 || previous.is_some_and(Step::is_vertical) {
        return Step::Right;
    }

    if rng.gen_bool(0.5) {
        return Step::Right;
    }

    let upward = rng.gen_bool(0.5);
    match (upward, row) {
        (true, 0) => Step::Down,
        (false, last) if last + 1 >= rows => Step::Up,
        (true, _) => Step::Up,
        (false, _) => Step::Down,
    }
}
