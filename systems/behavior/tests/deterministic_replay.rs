use std::time::Duration;

use devour_core::{
    config::{BotPoolConfig, FoodPlacement, WorldConfig},
    Command, DVec2, Event,
};
use devour_system_behavior::{Behavior, BehaviorState};
use devour_world::{self as world, contacts, query, World};

#[test]
fn deterministic_replay_produces_identical_runs() {
    let first = replay(0x00c0_ffee);
    let second = replay(0x00c0_ffee);

    assert_eq!(first, second, "replay diverged between runs");
    assert!(
        first
            .events
            .iter()
            .any(|event| matches!(event, Event::AbsorptionStarted { .. })),
        "expected the scripted arena to produce absorptions"
    );
}

#[test]
fn different_seeds_place_bots_differently() {
    let first = replay(1);
    let second = replay(2);

    assert_ne!(first.positions, second.positions);
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
    positions: Vec<DVec2>,
    states: Vec<Option<BehaviorState>>,
}

fn scenario(seed: u64) -> WorldConfig {
    let mut food_placements = Vec::new();
    for row in -4..=4 {
        for column in -4..=4 {
            let template = if (row + column) % 3 == 0 { "snack" } else { "crumb" };
            food_placements.push(FoodPlacement {
                template: template.to_owned(),
                position: DVec2::new(f64::from(column) * 5.0, f64::from(row) * 5.0),
            });
        }
    }

    WorldConfig {
        rng_seed: seed,
        food_placements,
        bots: BotPoolConfig {
            capacity: 8,
            initial: 6,
            ..BotPoolConfig::default()
        },
        players: Vec::new(),
        ..WorldConfig::default()
    }
}

fn replay(seed: u64) -> ReplayOutcome {
    let mut world = World::new(scenario(seed));
    let mut behavior = Behavior::default();
    let mut pending = Vec::new();
    let mut log = Vec::new();

    for step in 0..300 {
        let mut events = Vec::new();
        for command in std::mem::take(&mut pending) {
            world::apply(&mut world, command, &mut events);
        }
        if step % 100 == 50 {
            world::apply(&mut world, Command::SpawnBot, &mut events);
        }
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(50),
            },
            &mut events,
        );
        let mut touching = Vec::new();
        contacts::detect(&query::world_view(&world), &mut touching);
        for contact in touching {
            world::apply(&mut world, contact, &mut events);
        }

        behavior.handle(&events, &query::world_view(&world), &mut pending);
        log.extend(events);
    }

    let bots = query::bots(&world);
    let positions = bots
        .iter()
        .filter_map(|bot| query::agent_status(&world, *bot))
        .map(|status| status.position)
        .collect();
    let states = bots.iter().map(|bot| behavior.state(*bot)).collect();

    ReplayOutcome {
        events: log,
        positions,
        states,
    }
}

