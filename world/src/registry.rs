//! Entity records and the pools that own them.

use std::time::Duration;

use devour_core::{
    config::BotPoolConfig, Category, DVec2, EntityId, Error, FoodKind, HasSize, Level, LevelTable,
};

use crate::{
    pool::{EntityPool, Poolable, RespawnPolicy},
    progression::{ScoreRecord, SizeState},
};

/// Position and uniform scale of an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Transform {
    pub(crate) position: DVec2,
    pub(crate) scale: f64,
}

/// Bot or player record.
#[derive(Clone, Debug)]
pub(crate) struct Agent {
    pub(crate) transform: Transform,
    pub(crate) velocity: DVec2,
    size: SizeState,
    score: ScoreRecord,
    origin: DVec2,
    initial_score: ScoreRecord,
    initial_size: SizeState,
}

impl Agent {
    pub(crate) fn new(origin: DVec2, score: ScoreRecord, size: SizeState) -> Self {
        Self {
            transform: Transform {
                position: origin,
                scale: size.scale(),
            },
            velocity: DVec2::ZERO,
            size,
            origin,
            initial_score: score.clone(),
            initial_size: size,
            score,
        }
    }

    pub(crate) fn size_state(&self) -> &SizeState {
        &self.size
    }

    pub(crate) fn score(&self) -> &ScoreRecord {
        &self.score
    }

    /// Credits `amount` and mirrors any size change onto the transform.
    pub(crate) fn add_score(&mut self, amount: f64, levels: &LevelTable, advanced: &mut Vec<Level>) {
        self.score
            .add_score(amount, levels, &mut self.size, advanced);
        self.transform.scale = self.size.scale();
    }
}

impl HasSize for Agent {
    fn size(&self) -> f64 {
        self.size.current_size()
    }
}

impl Poolable for Agent {
    fn origin(&self) -> DVec2 {
        self.origin
    }

    fn reset(&mut self) {
        self.score = self.initial_score.clone();
        self.size = self.initial_size;
        self.velocity = DVec2::ZERO;
        self.transform.scale = self.size.scale();
    }

    fn activate(&mut self, position: DVec2) {
        self.transform.position = position;
    }
}

/// Food object created from a template.
#[derive(Clone, Debug)]
pub(crate) struct Food {
    pub(crate) transform: Transform,
    origin: Transform,
    size: f64,
    worth: f64,
    respawn_delay: Duration,
}

impl Food {
    pub(crate) fn new(position: DVec2, size: f64, worth: f64, respawn_delay: Duration) -> Self {
        let origin = Transform {
            position,
            scale: size,
        };
        Self {
            transform: origin,
            origin,
            size,
            worth,
            respawn_delay,
        }
    }

    pub(crate) fn worth(&self) -> f64 {
        self.worth
    }

    pub(crate) fn origin_transform(&self) -> Transform {
        self.origin
    }
}

impl HasSize for Food {
    fn size(&self) -> f64 {
        self.size
    }
}

impl Poolable for Food {
    fn origin(&self) -> DVec2 {
        self.origin.position
    }

    fn reset(&mut self) {
        self.transform.scale = self.origin.scale;
    }

    fn activate(&mut self, position: DVec2) {
        self.transform.position = position;
    }
}

/// Every absorbable entity of the world, grouped by category.
#[derive(Debug)]
pub(crate) struct Registry {
    pub(crate) food: Vec<EntityPool<Food>>,
    pub(crate) bots: EntityPool<Agent>,
    pub(crate) players: EntityPool<Agent>,
}

impl Registry {
    pub(crate) fn food_pool(&self, kind: FoodKind) -> Option<&EntityPool<Food>> {
        self.food.get(usize::from(kind.get()))
    }

    fn food_pool_mut(&mut self, kind: FoodKind) -> Option<&mut EntityPool<Food>> {
        self.food.get_mut(usize::from(kind.get()))
    }

    pub(crate) fn agents(&self, category: Category) -> Option<&EntityPool<Agent>> {
        match category {
            Category::Bot => Some(&self.bots),
            Category::Player => Some(&self.players),
            Category::Food(_) | Category::Popup => None,
        }
    }

    fn agents_mut(&mut self, category: Category) -> Option<&mut EntityPool<Agent>> {
        match category {
            Category::Bot => Some(&mut self.bots),
            Category::Player => Some(&mut self.players),
            Category::Food(_) | Category::Popup => None,
        }
    }

    pub(crate) fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.agents(id.category())?.get(id)
    }

    pub(crate) fn agent_mut(&mut self, id: EntityId) -> Option<&mut Agent> {
        self.agents_mut(id.category())?.get_mut(id)
    }

    pub(crate) fn food(&self, id: EntityId) -> Option<&Food> {
        match id.category() {
            Category::Food(kind) => self.food_pool(kind)?.get(id),
            _ => None,
        }
    }

    /// Size capability of any active entity, dispatched on its category.
    pub(crate) fn sized(&self, id: EntityId) -> Option<&dyn HasSize> {
        match id.category() {
            Category::Food(_) => self.food(id).map(|food| food as &dyn HasSize),
            Category::Bot | Category::Player => self.agent(id).map(|agent| agent as &dyn HasSize),
            Category::Popup => None,
        }
    }

    pub(crate) fn is_active(&self, id: EntityId) -> bool {
        self.transform(id).is_some()
    }

    pub(crate) fn transform(&self, id: EntityId) -> Option<Transform> {
        match id.category() {
            Category::Food(_) => self.food(id).map(|food| food.transform),
            Category::Bot | Category::Player => self.agent(id).map(|agent| agent.transform),
            Category::Popup => None,
        }
    }

    pub(crate) fn transform_mut(&mut self, id: EntityId) -> Option<&mut Transform> {
        match id.category() {
            Category::Food(kind) => self
                .food_pool_mut(kind)?
                .get_mut(id)
                .map(|food| &mut food.transform),
            Category::Bot | Category::Player => {
                self.agent_mut(id).map(|agent| &mut agent.transform)
            }
            Category::Popup => None,
        }
    }

    /// Returns an absorbed entity to its pool according to its category.
    ///
    /// Food respawns at its spawn point after its template delay, bots respawn
    /// inside the spawn region, players are deactivated for good.
    pub(crate) fn release(&mut self, id: EntityId, bots: &BotPoolConfig) -> Result<(), Error> {
        let stale = Error::StaleReference { entity: id };
        match id.category() {
            Category::Food(kind) => {
                let pool = self.food_pool_mut(kind).ok_or(stale.clone())?;
                let delay = pool.get(id).map(|food| food.respawn_delay).ok_or(stale)?;
                pool.release(id, delay, RespawnPolicy::Origin)
            }
            Category::Bot => self.bots.release(
                id,
                bots.respawn_delay,
                RespawnPolicy::Within(bots.spawn_region),
            ),
            Category::Player => self.players.release(id, Duration::ZERO, RespawnPolicy::Never),
            Category::Popup => Err(stale),
        }
    }
}
