#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits firing commands from targeting data.

use poly_defence_core::{Command, UnitId, UnitSnapshot, UnitTarget, UnitView};

/// Unit combat system that queues firing commands for loaded units.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireUnit` entries for targeted units that are loaded.
    pub fn handle(&mut self, units: UnitView, unit_targets: &[UnitTarget], out: &mut Vec<Command>) {
        if unit_targets.is_empty() {
            return;
        }

        let units = units.into_vec();
        if units.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in unit_targets {
            if let Some(snapshot) = find_unit(&units, target.unit) {
                if snapshot.loaded {
                    self.scratch.push(Command::FireUnit {
                        unit: target.unit,
                        target: target.adversary,
                    });
                }
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

fn find_unit(units: &[UnitSnapshot], unit: UnitId) -> Option<&UnitSnapshot> {
    units
        .binary_search_by_key(&unit, |snapshot| snapshot.id)
        .ok()
        .map(|index| &units[index])
}
