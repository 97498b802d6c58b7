//! Authoritative unit state management utilities.

use std::{collections::BTreeMap, time::Duration};

use poly_defence_core::{
    AdversaryId, PixelPoint, TileIndex, UnitId, UnitLevel, UnitSnapshot, UnitStats,
};

/// State of a unit stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Unit {
    id: UnitId,
    tile: TileIndex,
    level: UnitLevel,
    stats: UnitStats,
    reload_at: Option<Duration>,
    pub(crate) selected: bool,
    pub(crate) target: Option<AdversaryId>,
    pub(crate) barrel_tip: PixelPoint,
}

impl Unit {
    fn new(id: UnitId, tile: TileIndex) -> Self {
        Self {
            id,
            tile,
            level: UnitLevel::BASE,
            stats: UnitStats::BASE,
            reload_at: None,
            selected: false,
            target: None,
            barrel_tip: tile.center(),
        }
    }

    pub(crate) fn id(&self) -> UnitId {
        self.id
    }

    pub(crate) fn level(&self) -> UnitLevel {
        self.level
    }

    pub(crate) fn stats(&self) -> UnitStats {
        self.stats
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.reload_at.is_none()
    }

    /// Marks the unit as reloading until `now` plus its fire interval.
    pub(crate) fn discharge(&mut self, now: Duration) {
        self.reload_at = Some(now.saturating_add(self.stats.fire_interval));
    }

    /// Finishes reloading when the deadline has passed.
    pub(crate) fn reload(&mut self, now: Duration) {
        if self.reload_at.is_some_and(|deadline| deadline <= now) {
            self.reload_at = None;
        }
    }

    /// Raises the level by one and returns the new level, or `None` at the cap.
    pub(crate) fn upgrade(&mut self) -> Option<UnitLevel> {
        let next = self.level.next()?;
        self.level = next;
        self.stats = self.stats.upgraded();
        Some(next)
    }

    pub(crate) fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            tile: self.tile,
            position: self.tile.center(),
            level: self.level,
            stats: self.stats,
            loaded: self.is_loaded(),
            selected: self.selected,
            target: self.target,
            barrel_tip: self.barrel_tip,
        }
    }
}

/// Registry that stores units and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct UnitRegistry {
    entries: BTreeMap<UnitId, Unit>,
    tiles: BTreeMap<TileIndex, UnitId>,
    next_unit_id: UnitId,
}

impl UnitRegistry {
    /// Creates an empty unit registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            tiles: BTreeMap::new(),
            next_unit_id: UnitId::new(0),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.tiles.clear();
        self.next_unit_id = UnitId::new(0);
    }

    /// Stores a fresh unit on the tile and returns its identifier.
    pub(crate) fn insert(&mut self, tile: TileIndex) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id = UnitId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, Unit::new(id, tile));
        let _ = self.tiles.insert(tile, id);
        id
    }

    pub(crate) fn is_occupied(&self, tile: TileIndex) -> bool {
        self.tiles.contains_key(&tile)
    }

    pub(crate) fn at_tile_mut(&mut self, tile: TileIndex) -> Option<&mut Unit> {
        let id = self.tiles.get(&tile)?;
        self.entries.get_mut(id)
    }

    pub(crate) fn at_tile(&self, tile: TileIndex) -> Option<&Unit> {
        let id = self.tiles.get(&tile)?;
        self.entries.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.entries.values_mut()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Combined price of upgrading every selected unit below the level cap.
    pub(crate) fn selected_upgrade_cost(&self) -> u32 {
        self.entries
            .values()
            .filter(|unit| unit.selected && !unit.level.is_max())
            .map(|unit| unit.level.upgrade_cost())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_allocates_sequential_identifiers() {
        let mut registry = UnitRegistry::new();
        assert!(registry.is_empty());
        let first = registry.insert(TileIndex::new(12));
        let second = registry.insert(TileIndex::new(13));
        assert_eq!(first, UnitId::new(0));
        assert_eq!(second, UnitId::new(1));
        assert!(registry.is_occupied(TileIndex::new(13)));
        assert!(!registry.is_occupied(TileIndex::new(14)));

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.insert(TileIndex::new(40)), UnitId::new(0));
    }

    #[test]
    fn discharge_and_reload_follow_fire_interval() {
        let mut registry = UnitRegistry::new();
        let id = registry.insert(TileIndex::new(42));
        let unit = registry.get_mut(id).expect("unit exists");
        assert!(unit.is_loaded());

        unit.discharge(Duration::from_millis(200));
        assert!(!unit.is_loaded());
        unit.reload(Duration::from_millis(1199));
        assert!(!unit.is_loaded());
        unit.reload(Duration::from_millis(1200));
        assert!(unit.is_loaded());
    }

    #[test]
    fn upgrade_stops_at_level_cap() {
        let mut registry = UnitRegistry::new();
        let id = registry.insert(TileIndex::new(42));
        let unit = registry.get_mut(id).expect("unit exists");
        for expected in 2..=9 {
            assert_eq!(unit.upgrade(), Some(UnitLevel::new(expected)));
        }
        assert_eq!(unit.upgrade(), None);
        assert_eq!(unit.stats().damage, 12 + 8 * 3);
    }

    #[test]
    fn selected_upgrade_cost_skips_capped_units() {
        let mut registry = UnitRegistry::new();
        let low = registry.insert(TileIndex::new(1));
        let capped = registry.insert(TileIndex::new(2));
        let idle = registry.insert(TileIndex::new(3));

        registry.get_mut(low).expect("unit").selected = true;
        let unit = registry.get_mut(capped).expect("unit");
        unit.selected = true;
        while unit.upgrade().is_some() {}
        assert!(!registry.get_mut(idle).expect("unit").selected);

        assert_eq!(registry.selected_upgrade_cost(), 5);
    }

    #[test]
    fn snapshot_centres_unit_on_tile() {
        let mut registry = UnitRegistry::new();
        let _ = registry.insert(TileIndex::new(42));
        let unit = registry.at_tile(TileIndex::new(42)).expect("unit");
        let snapshot = unit.snapshot();
        assert_eq!(snapshot.position, PixelPoint::new(225.0, 125.0));
        assert_eq!(snapshot.barrel_tip, snapshot.position);
        assert!(snapshot.loaded);
        assert_eq!(snapshot.upgrade_cost(), Some(5));
    }
}
