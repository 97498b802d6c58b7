use std::time::Duration;

use poly_defence_core::{Command, Event, WavePhase};
use poly_defence_system_spawning::Spawning;
use poly_defence_world::{self as world, query, World};

fn tick(ms: u64) -> Event {
    Event::TimeAdvanced {
        dt: Duration::from_millis(ms),
    }
}

fn wave(count: u32, interval_ms: u64) -> Event {
    Event::WaveStarted {
        wave: 1,
        spawn_count: count,
        spawn_interval: Duration::from_millis(interval_ms),
    }
}

#[test]
fn first_spawn_waits_one_full_interval() {
    let mut spawning = Spawning::new();
    let mut commands = Vec::new();

    spawning.handle(&[wave(2, 1000), tick(999)], &mut commands);
    assert!(commands.is_empty(), "no spawn before the first interval");

    spawning.handle(&[tick(1)], &mut commands);
    assert_eq!(commands, vec![Command::SpawnAdversary]);
    assert_eq!(spawning.remaining(), 1);
}

#[test]
fn quota_is_followed_by_finish_on_next_firing() {
    let mut spawning = Spawning::new();
    let mut commands = Vec::new();
    spawning.handle(&[wave(2, 500)], &mut commands);

    spawning.handle(&[tick(1000)], &mut commands);
    assert_eq!(
        commands,
        vec![Command::SpawnAdversary, Command::SpawnAdversary]
    );
    assert!(spawning.is_active());

    commands.clear();
    spawning.handle(&[tick(499)], &mut commands);
    assert!(commands.is_empty());
    spawning.handle(&[tick(1)], &mut commands);
    assert_eq!(commands, vec![Command::FinishSpawning]);
    assert!(!spawning.is_active());

    commands.clear();
    spawning.handle(&[tick(10_000)], &mut commands);
    assert!(commands.is_empty(), "disarmed timer stays quiet");
}

#[test]
fn large_step_emits_one_spawn_per_interval() {
    let mut spawning = Spawning::new();
    let mut commands = Vec::new();
    spawning.handle(&[wave(10, 250), tick(1000)], &mut commands);
    assert_eq!(commands.len(), 4);
    assert_eq!(spawning.remaining(), 6);
}

#[test]
fn reset_and_game_over_cancel_the_timer() {
    for cancel in [Event::GameReset, Event::GameOver { wave: 1 }] {
        let mut spawning = Spawning::new();
        let mut commands = Vec::new();
        spawning.handle(&[wave(5, 100), tick(100), cancel], &mut commands);
        assert_eq!(commands, vec![Command::SpawnAdversary]);
        assert!(!spawning.is_active());

        spawning.handle(&[tick(1000)], &mut commands);
        assert_eq!(commands.len(), 1);
    }
}

#[test]
fn easy_first_wave_releases_one_adversary_through_world() {
    let mut world = World::new(42);
    let mut spawning = Spawning::new();
    let mut events = Vec::new();
    let mut commands = Vec::new();

    world::apply(&mut world, Command::StartWave, &mut events);

    let dt = Duration::from_millis(50);
    let mut elapsed = Duration::ZERO;
    while query::wave_phase(&world) == WavePhase::Spawning && elapsed < Duration::from_secs(10) {
        world::apply(&mut world, Command::Tick { dt }, &mut events);
        spawning.handle(&events, &mut commands);
        events.clear();
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events);
        }
        elapsed += dt;
    }

    assert_eq!(query::wave_phase(&world), WavePhase::Draining);
    // 1450 ms until the spawn, another 1450 ms until the timer reports done.
    assert_eq!(elapsed, Duration::from_millis(2900));

    let view = query::adversary_view(&world);
    assert_eq!(view.len(), 1);
    let adversary = view.iter().next().expect("one adversary");
    assert_eq!(adversary.health, 66);
}
