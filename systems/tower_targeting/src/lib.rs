#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic unit targets from world snapshots.

use glam::Vec2;
use poly_defence_core::{
    AdversaryId, AdversaryView, PixelPoint, UnitId, UnitTarget, UnitView, BARREL_LENGTH,
};

/// Unit targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    adversary_workspace: Vec<AdversaryCandidate>,
}

impl TowerTargeting {
    /// Creates a new targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes unit targets for the provided world snapshot.
    ///
    /// Every unit picks the nearest adversary strictly inside its range, with
    /// ties going to the lower adversary identifier. The output buffer is
    /// cleared before populating it with the latest assignments.
    pub fn handle(&mut self, units: &UnitView, adversaries: &AdversaryView, out: &mut Vec<UnitTarget>) {
        out.clear();

        if units.is_empty() || adversaries.is_empty() {
            return;
        }

        self.prepare_adversary_workspace(adversaries);

        for unit in units.iter() {
            let center = to_vec(unit.position);
            let max_distance_sq = unit.stats.range * unit.stats.range;

            let mut best: Option<BestCandidate> = None;
            for candidate in &self.adversary_workspace {
                let distance_sq = candidate.position.distance_squared(center);
                if distance_sq >= max_distance_sq {
                    continue;
                }

                let current = BestCandidate {
                    distance_sq,
                    adversary: candidate.id,
                    position: candidate.position,
                };
                match &mut best {
                    Some(existing) => {
                        if current.precedes(existing) {
                            *existing = current;
                        }
                    }
                    None => best = Some(current),
                }
            }

            if let Some(best_candidate) = best {
                out.push(assignment(unit.id, center, best_candidate.adversary, best_candidate.position));
            }
        }
    }

    fn prepare_adversary_workspace(&mut self, adversaries: &AdversaryView) {
        self.adversary_workspace.clear();
        self.adversary_workspace.reserve(adversaries.len());

        for snapshot in adversaries.iter() {
            if snapshot.health <= 0 {
                continue;
            }
            self.adversary_workspace.push(AdversaryCandidate {
                id: snapshot.id,
                position: to_vec(snapshot.position),
            });
        }
    }
}

fn assignment(unit: UnitId, center: Vec2, adversary: AdversaryId, position: Vec2) -> UnitTarget {
    let tip = center + (position - center).normalize_or_zero() * BARREL_LENGTH;
    UnitTarget {
        unit,
        adversary,
        adversary_position: to_point(position),
        barrel_tip: to_point(tip),
    }
}

fn to_vec(point: PixelPoint) -> Vec2 {
    Vec2::new(point.x(), point.y())
}

fn to_point(vector: Vec2) -> PixelPoint {
    PixelPoint::new(vector.x, vector.y)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct AdversaryCandidate {
    id: AdversaryId,
    position: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    distance_sq: f32,
    adversary: AdversaryId,
    position: Vec2,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.distance_sq != other.distance_sq {
            return self.distance_sq < other.distance_sq;
        }

        self.adversary < other.adversary
    }
}

#[cfg(test)]
mod tests {
    use super::TowerTargeting;
    use poly_defence_core::{
        AdversaryId, AdversarySnapshot, AdversaryView, PixelPoint, TileIndex, UnitId, UnitLevel,
        UnitSnapshot, UnitStats, UnitTarget, UnitView,
    };

    fn unit_snapshot(id: u32, tile: u32) -> UnitSnapshot {
        let tile = TileIndex::new(tile);
        UnitSnapshot {
            id: UnitId::new(id),
            tile,
            position: tile.center(),
            level: UnitLevel::BASE,
            stats: UnitStats::BASE,
            loaded: true,
            selected: false,
            target: None,
            barrel_tip: tile.center(),
        }
    }

    fn adversary_snapshot(id: u32, x: f32, y: f32) -> AdversarySnapshot {
        AdversarySnapshot {
            id: AdversaryId::new(id),
            position: PixelPoint::new(x, y),
            path_index: 0,
            health: 66,
            max_health: 66,
            speed: 0.5,
        }
    }

    #[test]
    fn targets_adversary_within_range_and_turns_barrel() {
        let mut system = TowerTargeting::new();
        // Tile 42 is centred on (225, 125).
        let units = UnitView::from_snapshots(vec![unit_snapshot(1, 42)]);
        let adversaries = AdversaryView::from_snapshots(vec![adversary_snapshot(2, 325.0, 125.0)]);

        let mut out = Vec::new();
        system.handle(&units, &adversaries, &mut out);

        assert_eq!(
            out,
            vec![UnitTarget {
                unit: UnitId::new(1),
                adversary: AdversaryId::new(2),
                adversary_position: PixelPoint::new(325.0, 125.0),
                barrel_tip: PixelPoint::new(250.0, 125.0),
            }]
        );
    }

    #[test]
    fn range_boundary_is_exclusive() {
        let mut system = TowerTargeting::new();
        let units = UnitView::from_snapshots(vec![unit_snapshot(1, 42)]);
        let at_edge = AdversaryView::from_snapshots(vec![adversary_snapshot(2, 375.0, 125.0)]);
        let inside = AdversaryView::from_snapshots(vec![adversary_snapshot(2, 374.5, 125.0)]);

        let mut out = Vec::new();
        system.handle(&units, &at_edge, &mut out);
        assert!(out.is_empty());
        system.handle(&units, &inside, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn nearest_adversary_wins() {
        let mut system = TowerTargeting::new();
        let units = UnitView::from_snapshots(vec![unit_snapshot(1, 42)]);
        let adversaries = AdversaryView::from_snapshots(vec![
            adversary_snapshot(1, 325.0, 125.0),
            adversary_snapshot(2, 225.0, 175.0),
        ]);

        let mut out = Vec::new();
        system.handle(&units, &adversaries, &mut out);
        assert_eq!(out[0].adversary, AdversaryId::new(2));
        assert_eq!(out[0].barrel_tip, PixelPoint::new(225.0, 150.0));
    }

    #[test]
    fn smaller_adversary_id_is_preferred_when_distances_match() {
        let mut system = TowerTargeting::new();
        let units = UnitView::from_snapshots(vec![unit_snapshot(1, 42)]);
        let adversaries = AdversaryView::from_snapshots(vec![
            adversary_snapshot(20, 275.0, 125.0),
            adversary_snapshot(10, 175.0, 125.0),
        ]);

        let mut out = Vec::new();
        system.handle(&units, &adversaries, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].adversary, AdversaryId::new(10));
    }

    #[test]
    fn upgraded_range_reaches_further() {
        let mut system = TowerTargeting::new();
        let mut unit = unit_snapshot(1, 42);
        let adversaries = AdversaryView::from_snapshots(vec![adversary_snapshot(3, 385.0, 125.0)]);

        let mut out = Vec::new();
        system.handle(&UnitView::from_snapshots(vec![unit]), &adversaries, &mut out);
        assert!(out.is_empty());

        unit.stats = unit.stats.upgraded();
        system.handle(&UnitView::from_snapshots(vec![unit]), &adversaries, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn dead_adversaries_are_never_targeted() {
        let mut system = TowerTargeting::new();
        let units = UnitView::from_snapshots(vec![unit_snapshot(1, 42)]);
        let mut corpse = adversary_snapshot(1, 235.0, 125.0);
        corpse.health = 0;
        let adversaries = AdversaryView::from_snapshots(vec![corpse]);

        let mut out = Vec::new();
        system.handle(&units, &adversaries, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn empty_collections_produce_no_targets() {
        let mut system = TowerTargeting::new();
        let mut out = vec![UnitTarget {
            unit: UnitId::new(9),
            adversary: AdversaryId::new(9),
            adversary_position: PixelPoint::default(),
            barrel_tip: PixelPoint::default(),
        }];

        system.handle(
            &UnitView::default(),
            &AdversaryView::from_snapshots(vec![adversary_snapshot(1, 0.0, 0.0)]),
            &mut out,
        );
        assert!(out.is_empty());

        system.handle(
            &UnitView::from_snapshots(vec![unit_snapshot(1, 42)]),
            &AdversaryView::default(),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn each_unit_receives_its_own_assignment() {
        let mut system = TowerTargeting::new();
        let units = UnitView::from_snapshots(vec![unit_snapshot(2, 0), unit_snapshot(1, 99)]);
        let adversaries = AdversaryView::from_snapshots(vec![
            adversary_snapshot(1, 25.0, 75.0),
            adversary_snapshot(2, 475.0, 425.0),
        ]);

        let mut out = Vec::new();
        system.handle(&units, &adversaries, &mut out);
        let pairs: Vec<(UnitId, AdversaryId)> =
            out.iter().map(|target| (target.unit, target.adversary)).collect();
        assert_eq!(
            pairs,
            vec![
                (UnitId::new(1), AdversaryId::new(2)),
                (UnitId::new(2), AdversaryId::new(1)),
            ]
        );
    }
}
