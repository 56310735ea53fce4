#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns input-device intent into player steering commands.

use std::{collections::BTreeMap, time::Duration};

use devour_core::{config::PlayerTuning, Category, Command, DVec2, EntityId, Event, WorldView};
use tracing::trace;

/// Input magnitude below which a player counts as standing still.
const MOVING_THRESHOLD_SQUARED: f64 = 0.01;

/// Movement intent reported by an input device for one player.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerInput {
    /// Desired direction; magnitudes above one are clamped.
    pub direction: DVec2,
    /// Whether the sprint control is held.
    pub sprint: bool,
}

impl PlayerInput {
    /// Creates a new input sample.
    #[must_use]
    pub const fn new(direction: DVec2, sprint: bool) -> Self {
        Self { direction, sprint }
    }
}

/// Player control system tracking the stamina of every player.
#[derive(Debug)]
pub struct PlayerControl {
    tuning: PlayerTuning,
    stamina: BTreeMap<EntityId, f64>,
}

impl PlayerControl {
    /// Creates a player control system using the provided tuning.
    #[must_use]
    pub fn new(tuning: PlayerTuning) -> Self {
        Self {
            tuning,
            stamina: BTreeMap::new(),
        }
    }

    /// Remaining stamina of `player`; untracked players have full stamina.
    #[must_use]
    pub fn stamina(&self, player: EntityId) -> f64 {
        self.stamina
            .get(&player)
            .copied()
            .unwrap_or(self.tuning.max_stamina)
    }

    /// Consumes world events and input samples to emit steering commands.
    ///
    /// Players missing from the view, eliminated or being absorbed, receive no
    /// command.
    pub fn handle(
        &mut self,
        events: &[Event],
        view: &WorldView,
        inputs: &[(EntityId, PlayerInput)],
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::PlayerEliminated { player } => {
                    let _ = self.stamina.remove(player);
                }
                _ => {}
            }
        }

        if elapsed.is_zero() {
            return;
        }

        let seconds = elapsed.as_secs_f64();
        for (player, input) in inputs {
            if player.category() != Category::Player {
                continue;
            }
            let Some(snapshot) = view.agent(*player) else {
                continue;
            };

            let direction = if input.direction.is_finite() {
                input.direction.clamp_length_max(1.0)
            } else {
                DVec2::ZERO
            };
            let moving = direction.length_squared() > MOVING_THRESHOLD_SQUARED;

            let max = self.tuning.max_stamina;
            let stamina = self.stamina.entry(*player).or_insert(max);
            let sprinting = input.sprint && moving && *stamina > 0.0;
            let (speed, delta) = if sprinting {
                (
                    self.tuning.sprint_speed,
                    -self.tuning.stamina_drain_rate * seconds,
                )
            } else {
                (
                    self.tuning.walk_speed,
                    self.tuning.stamina_regen_rate * seconds,
                )
            };
            *stamina = (*stamina + delta).clamp(0.0, max);
            trace!(%player, sprinting, stamina = *stamina, "player input applied");

            let velocity = direction * speed;
            if velocity != snapshot.velocity {
                out.push(Command::SteerAgent {
                    agent: *player,
                    velocity,
                });
            }
        }
    }
}

impl Default for PlayerControl {
    fn default() -> Self {
        Self::new(PlayerTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devour_core::AgentSnapshot;

    const PLAYER: EntityId = EntityId::new(Category::Player, 0, 0);

    fn view() -> WorldView {
        WorldView::from_snapshots(
            vec![AgentSnapshot {
                id: PLAYER,
                position: DVec2::ZERO,
                velocity: DVec2::ZERO,
                size: 1.0,
            }],
            Vec::new(),
        )
    }

    fn step(control: &mut PlayerControl, input: PlayerInput, millis: u64) -> Vec<Command> {
        let mut commands = Vec::new();
        control.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(millis),
            }],
            &view(),
            &[(PLAYER, input)],
            &mut commands,
        );
        commands
    }

    #[test]
    fn walking_uses_walk_speed_and_clamps_input() {
        let mut control = PlayerControl::default();

        let commands = step(
            &mut control,
            PlayerInput::new(DVec2::new(3.0, 4.0), false),
            100,
        );

        assert_eq!(
            commands,
            vec![Command::SteerAgent {
                agent: PLAYER,
                velocity: DVec2::new(3.0, 4.0),
            }]
        );
        assert_eq!(control.stamina(PLAYER), 100.0);
    }

    #[test]
    fn sprint_drains_stamina_until_walk_speed_resumes() {
        let tuning = PlayerTuning {
            max_stamina: 30.0,
            ..PlayerTuning::default()
        };
        let mut control = PlayerControl::new(tuning);
        let input = PlayerInput::new(DVec2::X, true);

        let commands = step(&mut control, input, 500);
        assert_eq!(
            commands,
            vec![Command::SteerAgent {
                agent: PLAYER,
                velocity: DVec2::new(10.0, 0.0),
            }]
        );
        assert_eq!(control.stamina(PLAYER), 15.0);

        let _ = step(&mut control, input, 500);
        assert_eq!(control.stamina(PLAYER), 0.0);

        let commands = step(&mut control, input, 500);
        assert_eq!(
            commands,
            vec![Command::SteerAgent {
                agent: PLAYER,
                velocity: DVec2::new(5.0, 0.0),
            }]
        );
        assert_eq!(control.stamina(PLAYER), 5.0);
    }

    #[test]
    fn standing_still_never_sprints() {
        let mut control = PlayerControl::default();

        let commands = step(&mut control, PlayerInput::new(DVec2::ZERO, true), 1_000);

        assert!(commands.is_empty());
        assert_eq!(control.stamina(PLAYER), 100.0);
    }

    #[test]
    fn players_absent_from_view_are_skipped() {
        let mut control = PlayerControl::default();
        let mut commands = Vec::new();

        control.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(100),
            }],
            &WorldView::default(),
            &[(PLAYER, PlayerInput::new(DVec2::X, false))],
            &mut commands,
        );

        assert!(commands.is_empty());
    }
}
