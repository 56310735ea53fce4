//! Contact eligibility and the shrink-and-pull consumption protocol.

use std::time::Duration;

use devour_core::{
    can_absorb,
    config::{AbsorptionConfig, BotPoolConfig},
    Category, DVec2, EntityId, Event, LevelTable,
};
use tracing::{debug, info};

use crate::registry::Registry;

/// Active consumptions, each advanced once per tick.
#[derive(Debug)]
pub(crate) struct AbsorptionResolver {
    config: AbsorptionConfig,
    animations: Vec<ShrinkAnimation>,
}

/// Multi-tick pull of a target toward its absorber.
#[derive(Clone, Copy, Debug)]
struct ShrinkAnimation {
    absorber: EntityId,
    target: EntityId,
    elapsed: Duration,
    start_scale: f64,
    pull_point: DVec2,
}

/// Successful start of a consumption.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Consumption {
    pub(crate) worth: f64,
    pub(crate) absorber_position: DVec2,
}

impl AbsorptionResolver {
    pub(crate) fn new(config: AbsorptionConfig) -> Self {
        Self {
            config,
            animations: Vec::new(),
        }
    }

    /// Reports whether `id` is the target of a running consumption.
    pub(crate) fn is_claimed(&self, id: EntityId) -> bool {
        self.animations.iter().any(|animation| animation.target == id)
    }

    /// Reports whether `id` is consuming at least one entity.
    pub(crate) fn is_absorbing(&self, id: EntityId) -> bool {
        self.animations
            .iter()
            .any(|animation| animation.absorber == id)
    }

    /// Decides a contact and, when eligible, credits the actor and starts the animation.
    ///
    /// Rejections are silent apart from debug logging: stale references,
    /// entities already being consumed, and targets that are not strictly
    /// smaller than the actor.
    pub(crate) fn begin(
        &mut self,
        actor: EntityId,
        target: EntityId,
        registry: &mut Registry,
        levels: &LevelTable,
        out: &mut Vec<Event>,
    ) -> Option<Consumption> {
        debug_assert_ne!(actor, target, "contacts are reported between distinct entities");

        if !actor.category().is_agent() {
            debug!(%actor, %target, "contact ignored: actor cannot absorb");
            return None;
        }

        if self.is_claimed(actor) || self.is_claimed(target) {
            debug!(%actor, %target, "contact ignored: entity already being absorbed");
            return None;
        }

        let (Some(attacker), Some(defender)) = (registry.sized(actor), registry.sized(target))
        else {
            debug!(%actor, %target, "contact ignored: stale reference");
            return None;
        };

        if !can_absorb(attacker, defender) {
            debug!(
                %actor,
                %target,
                actor_size = attacker.size(),
                target_size = defender.size(),
                "contact ignored: target is not smaller"
            );
            return None;
        }

        let worth = self.worth_of(target, registry)?;
        let start_scale = registry.transform(target)?.scale;

        let absorber = registry.agent_mut(actor)?;
        if actor.category() == Category::Bot {
            absorber.velocity = DVec2::ZERO;
        }
        let mut advanced = Vec::new();
        absorber.add_score(worth, levels, &mut advanced);
        let absorber_position = absorber.transform.position;
        let total_score = absorber.score().total_score();

        debug!(%actor, %target, worth, total_score, "absorption started");
        out.push(Event::AbsorptionStarted {
            absorber: actor,
            target,
            worth,
        });
        out.push(Event::ScoreChanged {
            agent: actor,
            total_score,
        });
        for level in advanced {
            info!(%actor, level = level.level, size = level.size, "level advanced");
            out.push(Event::LevelAdvanced {
                agent: actor,
                level: level.level,
                size: level.size,
            });
        }

        self.animations.push(ShrinkAnimation {
            absorber: actor,
            target,
            elapsed: Duration::ZERO,
            start_scale,
            pull_point: absorber_position,
        });

        Some(Consumption {
            worth,
            absorber_position,
        })
    }

    /// Samples every running animation once and dispatches the finished ones.
    ///
    /// Each sample pulls the target toward the absorber's current position and
    /// scales it toward zero. A target that is no longer active aborts its
    /// animation without being dispatched. An absorber that disappeared
    /// finishes its animations immediately, since their worth is already paid.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        registry: &mut Registry,
        bots: &BotPoolConfig,
        out: &mut Vec<Event>,
    ) {
        if self.animations.is_empty() {
            return;
        }

        let duration = self.config.animation;
        let animations = std::mem::take(&mut self.animations);
        let mut running = Vec::with_capacity(animations.len());

        for mut animation in animations {
            if !registry.is_active(animation.target) {
                debug!(
                    absorber = %animation.absorber,
                    target = %animation.target,
                    "absorption aborted: target vanished"
                );
                out.push(Event::AbsorptionAborted {
                    absorber: animation.absorber,
                    target: animation.target,
                });
                continue;
            }

            let absorber_present = match registry.transform(animation.absorber) {
                Some(transform) => {
                    animation.pull_point = transform.position;
                    true
                }
                None => false,
            };

            animation.elapsed = animation.elapsed.saturating_add(dt);
            let progress = if !absorber_present || duration.is_zero() {
                1.0
            } else {
                (animation.elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
            };

            if let Some(transform) = registry.transform_mut(animation.target) {
                transform.position = transform.position.lerp(animation.pull_point, progress);
                transform.scale = animation.start_scale * (1.0 - progress);
            }

            if progress >= 1.0 {
                dispatch(animation, registry, bots, out);
            } else {
                running.push(animation);
            }
        }

        self.animations = running;
    }

    fn worth_of(&self, target: EntityId, registry: &Registry) -> Option<f64> {
        match target.category() {
            Category::Food(_) => registry.food(target).map(|food| food.worth()),
            Category::Bot | Category::Player => registry.agent(target).map(|agent| {
                (agent.score().total_score() * self.config.agent_worth_ratio)
                    .max(self.config.agent_min_worth)
            }),
            Category::Popup => None,
        }
    }
}

fn dispatch(
    animation: ShrinkAnimation,
    registry: &mut Registry,
    bots: &BotPoolConfig,
    out: &mut Vec<Event>,
) {
    let ShrinkAnimation {
        absorber, target, ..
    } = animation;

    if let Err(error) = registry.release(target, bots) {
        debug!(%absorber, %target, %error, "absorption aborted at dispatch");
        out.push(Event::AbsorptionAborted { absorber, target });
        return;
    }

    out.push(Event::EntityDeactivated { entity: target });
    if target.category() == Category::Player {
        info!(player = %target, by = %absorber, "player eliminated");
        out.push(Event::PlayerEliminated { player: target });
    }
    debug!(%absorber, %target, "absorption completed");
    out.push(Event::AbsorptionCompleted { absorber, target });
}
