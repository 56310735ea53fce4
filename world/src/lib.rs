#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Devour.
//!
//! The world owns every pooled entity, integrates agent movement, resolves
//! reported contacts through the absorption protocol and counts down
//! respawns. It is mutated exclusively through [`apply`] and observed through
//! the functions in [`query`].

use std::time::Duration;

use devour_core::{
    config::{BotPoolConfig, FoodTemplate, WorldConfig},
    Category, Command, DVec2, EntityId, Error, Event, FoodKind, LevelTable, Region,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, warn};

mod absorption;
pub mod contacts;
pub mod pool;
mod popups;
pub mod progression;
mod registry;

use absorption::AbsorptionResolver;
use pool::{EntityPool, Placement};
use popups::PopupFeedback;
use progression::ScoreRecord;
use registry::{Agent, Food, Registry};

/// Represents the authoritative Devour world state.
#[derive(Debug)]
pub struct World {
    levels: LevelTable,
    arena: Region,
    bot_pool: BotPoolConfig,
    food_names: Vec<String>,
    registry: Registry,
    absorption: AbsorptionResolver,
    popups: PopupFeedback,
    rng: ChaCha8Rng,
    tick_index: u64,
}

impl World {
    /// Creates a world from the provided configuration and activates its initial entities.
    ///
    /// Food placements naming an unknown template are reported and skipped.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let WorldConfig {
            rng_seed,
            arena,
            levels,
            food_templates,
            food_placements,
            bots: bot_pool,
            players,
            popups,
            absorption,
        } = config;

        let mut rng = ChaCha8Rng::seed_from_u64(rng_seed);

        for placement in &food_placements {
            if !food_templates
                .iter()
                .any(|template| template.name == placement.template)
            {
                let error = Error::MissingDependency {
                    subject: format!("food placed at {:?}", placement.position),
                    dependency: placement.template.clone(),
                };
                error!(%error, "food placement skipped");
            }
        }

        let mut food = Vec::with_capacity(food_templates.len());
        for (index, template) in food_templates.iter().enumerate() {
            let Ok(kind) = u16::try_from(index).map(FoodKind::new) else {
                error!(template = %template.name, "too many food templates, template skipped");
                break;
            };
            let positions: Vec<DVec2> = food_placements
                .iter()
                .filter(|placement| placement.template == template.name)
                .map(|placement| placement.position)
                .collect();
            food.push(food_pool(kind, template, &positions, &mut rng));
        }

        let mut bots = EntityPool::new(Category::Bot);
        let (bot_score, bot_size) = ScoreRecord::start(&levels, bot_pool.start_level);
        bots.warm_up(bot_pool.capacity, |_| {
            Agent::new(bot_pool.spawn_region.center(), bot_score.clone(), bot_size)
        });
        for _ in 0..bot_pool.initial.min(bot_pool.capacity) {
            if let Err(error) = bots.acquire(Placement::Within(bot_pool.spawn_region), &mut rng) {
                error!(%error, "initial bot could not be activated");
            }
        }

        let mut player_pool = EntityPool::new(Category::Player);
        player_pool.warm_up(players.len(), |index| {
            let spawn = &players[index];
            let (score, size) = ScoreRecord::start(&levels, spawn.start_level);
            Agent::new(spawn.position, score, size)
        });
        for _ in 0..players.len() {
            if let Err(error) = player_pool.acquire(Placement::Origin, &mut rng) {
                error!(%error, "player could not be activated");
            }
        }

        Self {
            food_names: food_templates
                .iter()
                .map(|template| template.name.clone())
                .collect(),
            registry: Registry {
                food,
                bots,
                players: player_pool,
            },
            absorption: AbsorptionResolver::new(absorption),
            popups: PopupFeedback::new(popups),
            levels,
            arena,
            bot_pool,
            rng,
            tick_index: 0,
        }
    }

    fn integrate(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f64();
        let arena = self.arena;
        let absorption = &self.absorption;
        let agents = self
            .registry
            .bots
            .iter_active_mut()
            .chain(self.registry.players.iter_active_mut());
        for (id, agent) in agents {
            if absorption.is_claimed(id) {
                continue;
            }
            let moved = agent.transform.position + agent.velocity * seconds;
            agent.transform.position = arena.clamp(moved);
        }
    }

    fn advance_respawns(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut reactivated = Vec::new();
        for pool in &mut self.registry.food {
            pool.advance(dt, &mut self.rng, &mut reactivated);
        }
        self.registry
            .bots
            .advance(dt, &mut self.rng, &mut reactivated);

        for (entity, position) in reactivated {
            debug!(%entity, ?position, "entity respawned");
            out_events.push(Event::EntityRespawned { entity, position });
        }
    }

    fn steer(&mut self, agent: EntityId, velocity: DVec2) {
        if !velocity.is_finite() {
            debug!(%agent, ?velocity, "steering ignored: non-finite velocity");
            return;
        }
        if self.absorption.is_claimed(agent) {
            return;
        }
        let suppressed =
            agent.category() == Category::Bot && self.absorption.is_absorbing(agent);
        if let Some(record) = self.registry.agent_mut(agent) {
            record.velocity = if suppressed { DVec2::ZERO } else { velocity };
        }
    }

    fn spawn_bot(&mut self, out_events: &mut Vec<Event>) {
        let placement = Placement::Within(self.bot_pool.spawn_region);
        match self.registry.bots.acquire(placement, &mut self.rng) {
            Ok(entity) => {
                let position = self
                    .registry
                    .transform(entity)
                    .map_or(self.bot_pool.spawn_region.center(), |transform| {
                        transform.position
                    });
                debug!(%entity, ?position, "bot spawned");
                out_events.push(Event::EntitySpawned { entity, position });
            }
            Err(reason) => {
                warn!(error = %reason, "bot spawn rejected");
                out_events.push(Event::SpawnRejected {
                    category: Category::Bot,
                    reason,
                });
            }
        }
    }
}

fn food_pool(
    kind: FoodKind,
    template: &FoodTemplate,
    positions: &[DVec2],
    rng: &mut ChaCha8Rng,
) -> EntityPool<Food> {
    let mut pool = EntityPool::new(Category::Food(kind));
    pool.warm_up(positions.len(), |index| {
        Food::new(
            positions[index],
            template.size,
            template.worth,
            template.respawn_delay,
        )
    });
    for _ in positions {
        if let Err(error) = pool.acquire(Placement::Origin, rng) {
            error!(%error, template = %template.name, "food could not be activated");
        }
    }
    pool
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            world.integrate(dt);
            // Countdowns started by this tick's releases must not lose `dt`.
            world.advance_respawns(dt, out_events);
            world.absorption.advance(
                dt,
                &mut world.registry,
                &world.bot_pool,
                out_events,
            );
            world.popups.advance(dt, out_events);
        }
        Command::SteerAgent { agent, velocity } => world.steer(agent, velocity),
        Command::ReportContact { actor, target } => {
            if actor == target {
                debug!(%actor, "contact ignored: entity touched itself");
                return;
            }
            let Some(consumption) = world.absorption.begin(
                actor,
                target,
                &mut world.registry,
                &world.levels,
                out_events,
            ) else {
                return;
            };
            if actor.category() == Category::Player {
                world.popups.show(
                    consumption.absorber_position,
                    consumption.worth,
                    &mut world.rng,
                    out_events,
                );
            }
        }
        Command::SpawnBot => world.spawn_bot(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use devour_core::{
        AgentSnapshot, Category, DVec2, EntityId, FoodKind, FoodSnapshot, LevelTable, Region,
        WorldView,
    };

    /// Captures the read-only view consumed by systems.
    ///
    /// Inactive entities and entities currently being absorbed are omitted.
    #[must_use]
    pub fn world_view(world: &World) -> WorldView {
        let registry = &world.registry;
        let agents = registry
            .bots
            .iter_active()
            .chain(registry.players.iter_active())
            .filter(|(id, _)| !world.absorption.is_claimed(*id))
            .map(|(id, agent)| AgentSnapshot {
                id,
                position: agent.transform.position,
                velocity: agent.velocity,
                size: agent.size_state().current_size(),
            })
            .collect();
        let food = registry
            .food
            .iter()
            .flat_map(|pool| pool.iter_active())
            .filter(|(id, _)| !world.absorption.is_claimed(*id))
            .map(|(id, food)| FoodSnapshot {
                id,
                position: food.transform.position,
                size: devour_core::HasSize::size(food),
                worth: food.worth(),
            })
            .collect();
        WorldView::from_snapshots(agents, food)
    }

    /// Detailed state of an active bot or player.
    #[must_use]
    pub fn agent_status(world: &World, id: EntityId) -> Option<AgentStatus> {
        let agent = world.registry.agent(id)?;
        let score = agent.score();
        Some(AgentStatus {
            id,
            position: agent.transform.position,
            velocity: agent.velocity,
            size: agent.size_state().current_size(),
            scale: agent.transform.scale,
            total_score: score.total_score(),
            level: score.level(&world.levels).level,
            absorbing: world.absorption.is_absorbing(id),
            claimed: world.absorption.is_claimed(id),
        })
    }

    /// Detailed state of an active food object.
    #[must_use]
    pub fn food_status(world: &World, id: EntityId) -> Option<FoodStatus> {
        let food = world.registry.food(id)?;
        let origin = food.origin_transform();
        Some(FoodStatus {
            id,
            position: food.transform.position,
            scale: food.transform.scale,
            origin: origin.position,
            origin_scale: origin.scale,
            worth: food.worth(),
            claimed: world.absorption.is_claimed(id),
        })
    }

    /// Resolves the food kind created from the template called `name`.
    #[must_use]
    pub fn food_kind(world: &World, name: &str) -> Option<FoodKind> {
        let index = world.food_names.iter().position(|known| known == name)?;
        u16::try_from(index).ok().map(FoodKind::new)
    }

    /// Active food objects of the provided kind in slot order.
    #[must_use]
    pub fn food(world: &World, kind: FoodKind) -> Vec<EntityId> {
        world
            .registry
            .food_pool(kind)
            .map(|pool| pool.iter_active().map(|(id, _)| id).collect())
            .unwrap_or_default()
    }

    /// Active bots in slot order.
    #[must_use]
    pub fn bots(world: &World) -> Vec<EntityId> {
        world.registry.bots.iter_active().map(|(id, _)| id).collect()
    }

    /// Active players in slot order.
    #[must_use]
    pub fn players(world: &World) -> Vec<EntityId> {
        world
            .registry
            .players
            .iter_active()
            .map(|(id, _)| id)
            .collect()
    }

    /// Reports whether `id` names an active entity.
    #[must_use]
    pub fn is_active(world: &World, id: EntityId) -> bool {
        match id.category() {
            Category::Popup => world.popups.pool.is_active(id),
            _ => world.registry.is_active(id),
        }
    }

    /// Reports whether the agent is consuming at least one entity.
    #[must_use]
    pub fn is_absorbing(world: &World, id: EntityId) -> bool {
        world.absorption.is_absorbing(id)
    }

    /// Reports whether the entity is being consumed.
    #[must_use]
    pub fn is_claimed(world: &World, id: EntityId) -> bool {
        world.absorption.is_claimed(id)
    }

    /// Visible score popups in slot order.
    #[must_use]
    pub fn popups(world: &World) -> Vec<PopupStatus> {
        world
            .popups
            .pool
            .iter_active()
            .map(|(id, popup)| PopupStatus {
                id,
                position: popup.position,
                points: popup.points,
                elapsed: popup.elapsed,
            })
            .collect()
    }

    /// Level table used for score progression.
    #[must_use]
    pub fn levels(world: &World) -> &LevelTable {
        &world.levels
    }

    /// Rectangle agent positions are clamped to.
    #[must_use]
    pub fn arena(world: &World) -> Region {
        world.arena
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Reports how many instances of a pool are active or waiting to respawn.
    #[must_use]
    pub fn pool_occupancy(world: &World, category: Category) -> Option<PoolOccupancy> {
        let registry = &world.registry;
        let (capacity, active, pending) = match category {
            Category::Food(kind) => {
                let pool = registry.food_pool(kind)?;
                (pool.capacity(), pool.active_count(), pool.pending_count())
            }
            Category::Bot | Category::Player => {
                let pool = registry.agents(category)?;
                (pool.capacity(), pool.active_count(), pool.pending_count())
            }
            Category::Popup => {
                let pool = &world.popups.pool;
                (pool.capacity(), pool.active_count(), pool.pending_count())
            }
        };
        Some(PoolOccupancy {
            capacity,
            active,
            pending,
        })
    }

    /// Detailed state of a bot or player.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct AgentStatus {
        /// Identifier of the agent.
        pub id: EntityId,
        /// Position in world units.
        pub position: DVec2,
        /// Velocity applied during integration.
        pub velocity: DVec2,
        /// Live size used for eligibility.
        pub size: f64,
        /// Transform scale; shrinks while the agent is being absorbed.
        pub scale: f64,
        /// Score accumulated so far.
        pub total_score: f64,
        /// Level number reached.
        pub level: u32,
        /// Whether the agent is consuming something.
        pub absorbing: bool,
        /// Whether the agent is being consumed.
        pub claimed: bool,
    }

    /// Detailed state of a food object.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct FoodStatus {
        /// Identifier of the food object.
        pub id: EntityId,
        /// Current position in world units.
        pub position: DVec2,
        /// Current transform scale.
        pub scale: f64,
        /// Spawn position restored on respawn.
        pub origin: DVec2,
        /// Spawn scale restored on respawn.
        pub origin_scale: f64,
        /// Score credited to the absorber.
        pub worth: f64,
        /// Whether the object is being consumed.
        pub claimed: bool,
    }

    /// Visible score popup.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct PopupStatus {
        /// Identifier of the popup.
        pub id: EntityId,
        /// Current position in world units.
        pub position: DVec2,
        /// Whole points displayed.
        pub points: i64,
        /// Time the popup has been visible.
        pub elapsed: Duration,
    }

    /// Instance counts of a single pool.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PoolOccupancy {
        /// Number of instances created at warm-up.
        pub capacity: usize,
        /// Number of active instances.
        pub active: usize,
        /// Number of instances waiting on a respawn countdown.
        pub pending: usize,
    }
}
