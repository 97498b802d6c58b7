#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn timer that releases the adversaries of a wave at a fixed cadence.
//!
//! The timer arms when the world announces [`Event::WaveStarted`] and fires
//! once per spawn interval of simulated time. Each firing requests one
//! adversary until the wave's quota is spent; the firing after that reports
//! [`Command::FinishSpawning`] and disarms the timer.

use std::time::Duration;

use poly_defence_core::{Command, Event};

/// Pure system that converts elapsed time into spawn commands.
#[derive(Debug, Default)]
pub struct Spawning {
    timer: Option<SpawnTimer>,
}

#[derive(Clone, Copy, Debug)]
struct SpawnTimer {
    interval: Duration,
    remaining: u32,
    accumulator: Duration,
}

impl Spawning {
    /// Creates a disarmed spawning system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports whether a wave is still being released.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Number of adversaries the active wave has yet to release.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.timer.map_or(0, |timer| timer.remaining)
    }

    /// Consumes world events in order and emits spawn commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::WaveStarted {
                    spawn_count,
                    spawn_interval,
                    ..
                } => {
                    self.timer = Some(SpawnTimer {
                        interval: *spawn_interval,
                        remaining: *spawn_count,
                        accumulator: Duration::ZERO,
                    });
                }
                Event::TimeAdvanced { dt } => self.advance(*dt, out),
                Event::GameReset | Event::GameOver { .. } => self.timer = None,
                _ => {}
            }
        }
    }

    fn advance(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let Some(timer) = self.timer.as_mut() else {
            return;
        };
        timer.accumulator = timer.accumulator.saturating_add(dt);

        while timer.accumulator >= timer.interval {
            timer.accumulator -= timer.interval;
            if timer.remaining == 0 {
                out.push(Command::FinishSpawning);
                self.timer = None;
                return;
            }
            timer.remaining -= 1;
            out.push(Command::SpawnAdversary);
        }
    }
}
