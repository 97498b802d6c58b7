//! Unit placement plan the runner follows between waves.

use std::collections::{BTreeSet, VecDeque};

use poly_defence_core::{CommandError, Event, TileIndex, TrackPath};
use poly_defence_simulation::Simulation;
use tracing::{info, warn};

/// Tiles the runner builds on, in order, as money becomes available.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Fortification {
    pending: VecDeque<TileIndex>,
}

impl Fortification {
    /// Uses the requested tiles, or every free tile bordering the path walked from its start.
    pub(crate) fn plan(track: &TrackPath, requested: &[TileIndex]) -> Self {
        let mut seen = BTreeSet::new();
        let pending = if requested.is_empty() {
            track
                .tiles()
                .iter()
                .flat_map(|&step| neighbours(step))
                .filter(|tile| !track.contains(*tile))
                .filter(|tile| seen.insert(*tile))
                .collect()
        } else {
            requested
                .iter()
                .copied()
                .filter(|tile| seen.insert(*tile))
                .collect()
        };
        Self { pending }
    }

    /// Tiles not yet built on.
    pub(crate) fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Builds on pending tiles until money runs out, then spends the rest on upgrades.
    ///
    /// Returns the number of units placed.
    pub(crate) fn build(&mut self, simulation: &mut Simulation, out_events: &mut Vec<Event>) -> usize {
        let mut placed = 0;
        while let Some(&tile) = self.pending.front() {
            match simulation.place_unit(tile, out_events) {
                Ok(unit) => {
                    info!(tile = tile.get(), unit = unit.id.get(), "unit placed");
                    if let Err(reason) = simulation.select_unit(tile, out_events) {
                        warn!(tile = tile.get(), %reason, "unit could not be selected");
                    }
                    placed += 1;
                }
                Err(CommandError::InsufficientFunds { .. }) => break,
                Err(reason) => warn!(tile = tile.get(), %reason, "tile skipped"),
            }
            let _ = self.pending.pop_front();
        }

        if self.pending.is_empty() {
            match simulation.upgrade_selected(out_events) {
                Ok(spent) if spent > 0 => info!(spent, "units upgraded"),
                Ok(_) => {}
                Err(reason) => warn!(%reason, "upgrade refused"),
            }
        }
        placed
    }
}

fn neighbours(tile: TileIndex) -> impl Iterator<Item = TileIndex> {
    let (column, row) = (tile.column(), tile.row());
    [
        (column.checked_sub(1), Some(row)),
        (Some(column + 1), Some(row)),
        (Some(column), row.checked_sub(1)),
        (Some(column), Some(row + 1)),
    ]
    .into_iter()
    .filter_map(|(column, row)| TileIndex::from_coords(column?, row?))
}
