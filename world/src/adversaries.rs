//! Adversary storage and path following.

use std::collections::BTreeMap;

use poly_defence_core::{
    AdversaryId, AdversarySnapshot, PixelPoint, TrackPath, Waypoint, ARRIVAL_TOLERANCE,
};

/// Outcome of a single movement step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Stride {
    /// The adversary walked from one position to another.
    Walked { from: PixelPoint, to: PixelPoint },
    /// The adversary passed the last waypoint and must leave the field.
    Escaped,
}

/// State of an adversary walking the path.
#[derive(Clone, Debug)]
pub(crate) struct Adversary {
    id: AdversaryId,
    position: PixelPoint,
    path_index: usize,
    target: Waypoint,
    health: i32,
    max_health: i32,
    speed: f32,
}

impl Adversary {
    pub(crate) fn position(&self) -> PixelPoint {
        self.position
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub(crate) fn hit(&mut self, damage: i32) {
        self.health = self.health.saturating_sub(damage);
    }

    /// Walks toward the current waypoint, finishing the horizontal leg before
    /// the vertical one, then retargets once the waypoint is within tolerance.
    pub(crate) fn step(&mut self, path: &TrackPath) -> Stride {
        let Some(goal) = self.target.position() else {
            return Stride::Escaped;
        };

        let from = self.position;
        let to = if from.x() != goal.x() {
            PixelPoint::new(approach(from.x(), goal.x(), self.speed), from.y())
        } else {
            PixelPoint::new(from.x(), approach(from.y(), goal.y(), self.speed))
        };
        self.position = to;

        if to.is_near(goal, ARRIVAL_TOLERANCE) {
            self.path_index += 1;
            self.target = path.waypoint(self.path_index + 1);
        }

        Stride::Walked { from, to }
    }

    /// Reports whether the adversary has no waypoint left to walk to.
    pub(crate) fn is_leaving(&self) -> bool {
        self.target == Waypoint::Exit
    }

    pub(crate) fn snapshot(&self) -> AdversarySnapshot {
        AdversarySnapshot {
            id: self.id,
            position: self.position,
            path_index: self.path_index,
            health: self.health,
            max_health: self.max_health,
            speed: self.speed,
        }
    }
}

fn approach(current: f32, goal: f32, speed: f32) -> f32 {
    let delta = goal - current;
    if delta.abs() <= speed {
        goal
    } else {
        current + speed.copysign(delta)
    }
}

/// Registry that stores adversaries and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct AdversaryRegistry {
    entries: BTreeMap<AdversaryId, Adversary>,
    next_adversary_id: AdversaryId,
}

impl AdversaryRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_adversary_id: AdversaryId::new(0),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_adversary_id = AdversaryId::new(0);
    }

    /// Places a new adversary on the centre of the first path tile, heading
    /// for the second. Returns `None` when the path is empty.
    pub(crate) fn spawn(&mut self, path: &TrackPath, health: i32, speed: f32) -> Option<&Adversary> {
        let start = path.start()?;
        let id = self.next_adversary_id;
        self.next_adversary_id = AdversaryId::new(id.get().saturating_add(1));
        let adversary = Adversary {
            id,
            position: start.center(),
            path_index: 0,
            target: path.waypoint(1),
            health,
            max_health: health,
            speed,
        };
        Some(self.entries.entry(id).or_insert(adversary))
    }

    pub(crate) fn get(&self, id: AdversaryId) -> Option<&Adversary> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: AdversaryId) -> Option<&mut Adversary> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: AdversaryId) -> Option<Adversary> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (AdversaryId, &Adversary)> {
        self.entries.iter().map(|(id, adversary)| (*id, adversary))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (AdversaryId, &mut Adversary)> {
        self.entries.iter_mut().map(|(id, adversary)| (*id, adversary))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
