#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that drives every bot through its seek, chase and flee decisions.
//!
//! Each tick the system reads a [`WorldView`] snapshot, re-evaluates threats
//! before opportunities for every bot, and answers with `SteerAgent` commands
//! carrying the desired velocity. Absorption progress is learned from world
//! events, so the system never touches world state directly.

use std::{collections::BTreeMap, time::Duration};

use devour_core::{
    can_absorb, config::BotTuning, AgentSnapshot, Category, Command, DVec2, EntityId, Event,
    WorldView,
};
use tracing::{debug, trace};

/// Mode of a bot's decision machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BehaviorMode {
    /// Standing still until the next scan finds something.
    Idle,
    /// Moving toward a food object.
    SeekingFood,
    /// Moving toward a smaller agent.
    ChasingPrey,
    /// Moving away from a larger agent.
    FleeingDanger,
    /// Consuming an entity; movement is suppressed.
    Absorbing,
}

/// Observable decision state of a single bot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BehaviorState {
    /// Current mode.
    pub mode: BehaviorMode,
    /// Entity the bot moves toward, or away from while fleeing.
    pub target: Option<EntityId>,
    /// Whether the target is an agent being chased.
    pub is_chasing: bool,
    /// Whether a threat is currently tracked.
    pub is_dangerous: bool,
    /// Remaining stamina.
    pub stamina: f64,
}

/// Bot decision system holding one brain per active bot.
#[derive(Debug)]
pub struct Behavior {
    tuning: BotTuning,
    brains: BTreeMap<EntityId, Brain>,
}

impl Behavior {
    /// Creates a behavior system using the provided tuning.
    #[must_use]
    pub fn new(tuning: BotTuning) -> Self {
        Self {
            tuning,
            brains: BTreeMap::new(),
        }
    }

    /// Decision state of `bot`, if the system tracks it.
    #[must_use]
    pub fn state(&self, bot: EntityId) -> Option<BehaviorState> {
        self.brains.get(&bot).map(|brain| brain.state)
    }

    /// Consumes world events and the current view to emit steering commands.
    ///
    /// Bots are only re-evaluated when the events contain elapsed time. A
    /// command is emitted only for bots whose desired velocity differs from
    /// the velocity they currently move with.
    pub fn handle(&mut self, events: &[Event], view: &WorldView, out: &mut Vec<Command>) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::EntitySpawned { entity, .. } | Event::EntityRespawned { entity, .. }
                    if entity.category() == Category::Bot =>
                {
                    let _ = self.brains.insert(*entity, Brain::new(&self.tuning));
                }
                Event::EntityDeactivated { entity } => {
                    let _ = self.brains.remove(entity);
                }
                Event::AbsorptionStarted { absorber, .. }
                    if absorber.category() == Category::Bot =>
                {
                    self.brain_mut(*absorber).begin_absorbing(*absorber);
                }
                Event::AbsorptionCompleted { absorber, .. }
                | Event::AbsorptionAborted { absorber, .. }
                    if absorber.category() == Category::Bot =>
                {
                    let delay = self.tuning.post_action_delay;
                    if let Some(brain) = self.brains.get_mut(absorber) {
                        brain.finish_absorbing(*absorber, delay);
                    }
                }
                _ => {}
            }
        }

        if elapsed.is_zero() {
            return;
        }

        self.brains.retain(|id, _| view.agent(*id).is_some());

        for me in view.bots() {
            let brain = self
                .brains
                .entry(me.id)
                .or_insert_with(|| Brain::new(&self.tuning));
            let velocity = brain.think(me, view, elapsed, &self.tuning);
            if velocity != me.velocity {
                out.push(Command::SteerAgent {
                    agent: me.id,
                    velocity,
                });
            }
        }
    }

    fn brain_mut(&mut self, bot: EntityId) -> &mut Brain {
        let tuning = &self.tuning;
        self.brains
            .entry(bot)
            .or_insert_with(|| Brain::new(tuning))
    }
}

impl Default for Behavior {
    fn default() -> Self {
        Self::new(BotTuning::default())
    }
}

#[derive(Clone, Debug)]
struct Brain {
    state: BehaviorState,
    danger: Option<EntityId>,
    refresh_timer: Duration,
    action_delay: Duration,
    pending_absorptions: u32,
}

impl Brain {
    fn new(tuning: &BotTuning) -> Self {
        Self {
            state: BehaviorState {
                mode: BehaviorMode::Idle,
                target: None,
                is_chasing: false,
                is_dangerous: false,
                stamina: tuning.stamina_max,
            },
            danger: None,
            refresh_timer: Duration::ZERO,
            action_delay: Duration::ZERO,
            pending_absorptions: 0,
        }
    }

    fn begin_absorbing(&mut self, me: EntityId) {
        self.pending_absorptions = self.pending_absorptions.saturating_add(1);
        self.state.target = None;
        self.state.is_chasing = false;
        self.set_mode(me, BehaviorMode::Absorbing);
    }

    fn finish_absorbing(&mut self, me: EntityId, delay: Duration) {
        self.pending_absorptions = self.pending_absorptions.saturating_sub(1);
        if self.pending_absorptions > 0 || self.state.mode != BehaviorMode::Absorbing {
            return;
        }
        self.state.target = None;
        self.action_delay = delay;
        self.set_mode(me, BehaviorMode::SeekingFood);
    }

    fn set_mode(&mut self, me: EntityId, mode: BehaviorMode) {
        if self.state.mode != mode {
            debug!(bot = %me, from = ?self.state.mode, to = ?mode, "behavior mode changed");
            self.state.mode = mode;
        }
    }

    /// Runs one decision step and returns the desired velocity.
    fn think(
        &mut self,
        me: &AgentSnapshot,
        view: &WorldView,
        dt: Duration,
        tuning: &BotTuning,
    ) -> DVec2 {
        self.refresh_timer = self.refresh_timer.saturating_sub(dt);
        self.action_delay = self.action_delay.saturating_sub(dt);

        let danger_range = me.size * tuning.danger_range_factor;
        self.detect_danger(me, view, danger_range, tuning);

        if self.state.mode == BehaviorMode::Absorbing {
            self.update_stamina(dt, tuning);
            return DVec2::ZERO;
        }

        if self.state.is_dangerous {
            self.state.target = self.danger;
            self.state.is_chasing = false;
            self.set_mode(me.id, BehaviorMode::FleeingDanger);
        } else {
            if self.state.mode == BehaviorMode::FleeingDanger && self.action_delay.is_zero() {
                self.state.target = None;
                self.refresh_timer = Duration::ZERO;
                self.set_mode(me.id, BehaviorMode::SeekingFood);
            }
            if self.state.mode != BehaviorMode::FleeingDanger {
                let chase_stop_range = danger_range * tuning.chase_range_factor;
                self.maintain_target(me, view, chase_stop_range, tuning);
            }
        }

        self.update_stamina(dt, tuning);
        self.velocity(me, view, tuning)
    }

    /// Tracks the nearest larger agent, releasing it only past the clearance band.
    fn detect_danger(
        &mut self,
        me: &AgentSnapshot,
        view: &WorldView,
        danger_range: f64,
        tuning: &BotTuning,
    ) {
        let nearest = nearest(
            view.agents()
                .iter()
                .filter(|other| other.id != me.id && can_absorb(*other, me))
                .map(|other| (other.id, other.position.distance(me.position)))
                .filter(|(_, distance)| *distance < danger_range),
        );

        if let Some(threat) = nearest {
            if !self.state.is_dangerous {
                trace!(bot = %me.id, %threat, "danger detected");
            }
            self.state.is_dangerous = true;
            self.danger = Some(threat);
            return;
        }

        if !self.state.is_dangerous {
            return;
        }

        let clearance = danger_range + tuning.clearance_offset;
        let retained = self
            .danger
            .and_then(|threat| view.agent(threat))
            .is_some_and(|threat| threat.position.distance(me.position) <= clearance);
        if !retained {
            trace!(bot = %me.id, "danger cleared");
            self.state.is_dangerous = false;
            self.danger = None;
            self.action_delay = tuning.post_action_delay;
        }
    }

    fn maintain_target(
        &mut self,
        me: &AgentSnapshot,
        view: &WorldView,
        chase_stop_range: f64,
        tuning: &BotTuning,
    ) {
        if let Some(target) = self.state.target {
            match view.position_of(target) {
                None => self.state.target = None,
                Some(position) => {
                    if self.state.is_chasing && position.distance(me.position) > chase_stop_range {
                        self.state.target = None;
                    }
                }
            }
        }

        let lost = self.state.target.is_none() && self.action_delay.is_zero();
        if !lost && !self.refresh_timer.is_zero() {
            return;
        }

        self.refresh_timer = tuning.target_refresh_interval;
        self.scan(me, view, chase_stop_range);
    }

    /// Picks a new target; prey always wins over food.
    fn scan(&mut self, me: &AgentSnapshot, view: &WorldView, chase_stop_range: f64) {
        let prey = nearest(
            view.agents()
                .iter()
                .filter(|other| other.id != me.id && can_absorb(me, *other))
                .map(|other| (other.id, other.position.distance(me.position)))
                .filter(|(_, distance)| *distance < chase_stop_range),
        );
        let food = nearest(
            view.food()
                .iter()
                .filter(|food| can_absorb(me, *food))
                .map(|food| (food.id, food.position.distance(me.position))),
        );

        let (target, is_chasing, mode) = match (prey, food) {
            (Some(prey), _) => (Some(prey), true, BehaviorMode::ChasingPrey),
            (None, Some(food)) => (Some(food), false, BehaviorMode::SeekingFood),
            (None, None) => (None, false, BehaviorMode::Idle),
        };
        self.state.target = target;
        self.state.is_chasing = is_chasing;
        self.set_mode(me.id, mode);
    }

    fn update_stamina(&mut self, dt: Duration, tuning: &BotTuning) {
        let seconds = dt.as_secs_f64();
        let delta = match self.state.mode {
            BehaviorMode::ChasingPrey | BehaviorMode::FleeingDanger => {
                -tuning.stamina_drain_rate * seconds
            }
            _ => tuning.stamina_regen_rate * seconds,
        };
        self.state.stamina =
            (self.state.stamina + delta).clamp(tuning.stamina_min, tuning.stamina_max);
    }

    fn velocity(&self, me: &AgentSnapshot, view: &WorldView, tuning: &BotTuning) -> DVec2 {
        let Some(target) = self.state.target.and_then(|target| view.position_of(target)) else {
            return DVec2::ZERO;
        };

        match self.state.mode {
            BehaviorMode::Idle | BehaviorMode::Absorbing => DVec2::ZERO,
            BehaviorMode::FleeingDanger => {
                (me.position - target).normalize_or_zero() * tuning.base_speed
            }
            BehaviorMode::SeekingFood => {
                (target - me.position).normalize_or_zero() * tuning.base_speed
            }
            BehaviorMode::ChasingPrey => {
                let speed = if self.state.stamina > tuning.stamina_min {
                    tuning.sprint_speed
                } else {
                    tuning.base_speed
                };
                (target - me.position).normalize_or_zero() * speed
            }
        }
    }
}

/// Closest candidate; ties keep the first one in view order.
fn nearest(candidates: impl Iterator<Item = (EntityId, f64)>) -> Option<EntityId> {
    candidates
        .min_by(|(_, left), (_, right)| left.total_cmp(right))
        .map(|(id, _)| id)
}
