//! Host loop wiring the world, the systems and the contact detector together.

use std::time::Duration;

use devour_core::{Command, DVec2, EntityId, Event};
use devour_system_behavior::Behavior;
use devour_system_player_control::{PlayerControl, PlayerInput};
use devour_world::{self as world, contacts, query, World};
use tracing::info;

use crate::scenario::Scenario;

/// Angular speed of the scripted player input, in radians per second.
const INPUT_TURN_RATE: f64 = 0.4;

/// Running tallies of notable events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) absorptions: usize,
    pub(crate) aborted: usize,
    pub(crate) respawns: usize,
    pub(crate) level_ups: usize,
    pub(crate) eliminations: usize,
    pub(crate) popups: usize,
    pub(crate) rejected_spawns: usize,
}

impl Summary {
    fn record(&mut self, event: &Event) {
        match event {
            Event::AbsorptionCompleted { .. } => self.absorptions += 1,
            Event::AbsorptionAborted { .. } => self.aborted += 1,
            Event::EntityRespawned { .. } => self.respawns += 1,
            Event::LevelAdvanced { .. } => self.level_ups += 1,
            Event::PlayerEliminated { .. } => self.eliminations += 1,
            Event::PopupShown { .. } => self.popups += 1,
            Event::SpawnRejected { .. } => self.rejected_spawns += 1,
            _ => {}
        }
    }
}

/// Headless simulation driven one frame at a time.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    behavior: Behavior,
    player_control: PlayerControl,
    pending: Vec<Command>,
    sprint: bool,
    elapsed: Duration,
    summary: Summary,
}

impl Simulation {
    pub(crate) fn new(scenario: Scenario, sprint: bool) -> Self {
        Self {
            world: World::new(scenario.world),
            behavior: Behavior::new(scenario.behavior),
            player_control: PlayerControl::new(scenario.player),
            pending: Vec::new(),
            sprint,
            elapsed: Duration::ZERO,
            summary: Summary::default(),
        }
    }

    /// Runs one frame: steering, tick, contacts, then the systems.
    pub(crate) fn step(&mut self, dt: Duration) {
        let mut events = Vec::new();
        for command in self.pending.drain(..) {
            world::apply(&mut self.world, command, &mut events);
        }

        world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        self.elapsed = self.elapsed.saturating_add(dt);

        let mut touching = Vec::new();
        contacts::detect(&query::world_view(&self.world), &mut touching);
        for contact in touching {
            world::apply(&mut self.world, contact, &mut events);
        }

        let view = query::world_view(&self.world);
        let inputs = self.scripted_inputs();
        self.behavior.handle(&events, &view, &mut self.pending);
        self.player_control
            .handle(&events, &view, &inputs, &mut self.pending);

        for event in &events {
            self.summary.record(event);
        }
    }

    /// Players walk in a slow circle, standing in for an input device.
    fn scripted_inputs(&self) -> Vec<(EntityId, PlayerInput)> {
        let angle = self.elapsed.as_secs_f64() * INPUT_TURN_RATE;
        let direction = DVec2::from_angle(angle);
        query::players(&self.world)
            .into_iter()
            .map(|player| (player, PlayerInput::new(direction, self.sprint)))
            .collect()
    }

    pub(crate) fn summary(&self) -> Summary {
        self.summary
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Logs the final state of every agent.
    pub(crate) fn report(&self) {
        let world = &self.world;
        let agents = query::players(world)
            .into_iter()
            .chain(query::bots(world))
            .filter_map(|id| query::agent_status(world, id));
        for status in agents {
            info!(
                agent = %status.id,
                level = status.level,
                score = status.total_score,
                size = status.size,
                x = status.position.x,
                y = status.position.y,
                "final agent state"
            );
        }
        info!(
            ticks = query::tick_index(world),
            absorptions = self.summary.absorptions,
            aborted = self.summary.aborted,
            respawns = self.summary.respawns,
            level_ups = self.summary.level_ups,
            eliminations = self.summary.eliminations,
            popups = self.summary.popups,
            rejected_spawns = self.summary.rejected_spawns,
            "simulation finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_scenario_produces_absorptions() {
        let scenario = Scenario::load(None).expect("bundled scenario");
        let mut simulation = Simulation::new(scenario, false);

        for _ in 0..600 {
            simulation.step(Duration::from_millis(50));
        }

        assert_eq!(query::tick_index(simulation.world()), 600);
        assert!(simulation.summary().absorptions > 0);
    }

    #[test]
    fn runs_with_equal_seeds_match() {
        let run = || {
            let scenario = Scenario::load(None).expect("bundled scenario");
            let mut simulation = Simulation::new(scenario, true);
            for _ in 0..200 {
                simulation.step(Duration::from_millis(16));
            }
            let world = simulation.world();
            let bots: Vec<_> = query::bots(world)
                .into_iter()
                .filter_map(|id| query::agent_status(world, id))
                .collect();
            (simulation.summary(), bots)
        };

        assert_eq!(run(), run());
    }
}
