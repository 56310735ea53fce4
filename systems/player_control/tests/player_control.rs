use std::time::Duration;

use devour_core::{
    config::{BotPoolConfig, PlayerSpawn, WorldConfig},
    Command, DVec2, Event, Region,
};
use devour_system_player_control::{PlayerControl, PlayerInput};
use devour_world::{self as world, query, World};

fn tick(world: &mut World, millis: u64) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(millis),
        },
        &mut events,
    );
    events
}

#[test]
fn sprinting_player_moves_at_sprint_speed() {
    let config = WorldConfig {
        bots: BotPoolConfig {
            capacity: 0,
            initial: 0,
            ..BotPoolConfig::default()
        },
        ..WorldConfig::default()
    };
    let mut world = World::new(config);
    let player = query::players(&world)[0];
    let mut control = PlayerControl::default();
    let inputs = [(player, PlayerInput::new(DVec2::Y, true))];

    let events = tick(&mut world, 100);
    let mut commands = Vec::new();
    control.handle(&events, &query::world_view(&world), &inputs, &mut commands);
    for command in commands {
        let mut events = Vec::new();
        world::apply(&mut world, command, &mut events);
    }
    let _ = tick(&mut world, 500);

    let status = query::agent_status(&world, player).expect("player active");
    assert!((status.position - DVec2::new(0.0, 5.0)).length() < 1e-9);
    assert!((control.stamina(player) - 97.0).abs() < 1e-9);
}

#[test]
fn eliminated_player_receives_no_commands() {
    let config = WorldConfig {
        bots: BotPoolConfig {
            capacity: 1,
            initial: 1,
            spawn_region: Region::new(DVec2::new(1.0, 0.0), DVec2::ZERO),
            start_level: 3,
            ..BotPoolConfig::default()
        },
        players: vec![PlayerSpawn::default()],
        ..WorldConfig::default()
    };
    let mut world = World::new(config);
    let player = query::players(&world)[0];
    let bot = query::bots(&world)[0];
    let mut control = PlayerControl::default();
    let inputs = [(player, PlayerInput::new(DVec2::X, false))];

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ReportContact {
            actor: bot,
            target: player,
        },
        &mut events,
    );

    let mut eliminated = false;
    for _ in 0..10 {
        let events = tick(&mut world, 100);
        eliminated |= events.contains(&Event::PlayerEliminated { player });
        let mut commands = Vec::new();
        control.handle(&events, &query::world_view(&world), &inputs, &mut commands);
        assert!(commands.is_empty(), "claimed or eliminated player was steered");
    }

    assert!(eliminated);
    assert!(query::players(&world).is_empty());
}
