#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Devour simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to. Systems consume event streams, query an immutable
//! [`WorldView`] snapshot, and respond exclusively with new command batches.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

pub mod config;
mod levels;

pub use glam::DVec2;
pub use levels::{Level, LevelTable};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Sets the desired velocity of a bot or player.
    SteerAgent {
        /// Agent whose movement intent is being updated.
        agent: EntityId,
        /// Desired velocity measured in world units per second.
        velocity: DVec2,
    },
    /// Reports that the physics layer observed two distinct entities touching.
    ReportContact {
        /// Agent that may attempt to absorb the other entity.
        actor: EntityId,
        /// Entity that was touched by the actor.
        target: EntityId,
    },
    /// Requests that an idle bot be taken from the pool and placed in the spawn region.
    SpawnBot,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an entity was taken from its pool on request.
    EntitySpawned {
        /// Identifier of the activated entity.
        entity: EntityId,
        /// Position the entity was placed at.
        position: DVec2,
    },
    /// Confirms that a released entity finished its respawn countdown.
    EntityRespawned {
        /// Identifier of the reactivated entity, carrying its fresh generation.
        entity: EntityId,
        /// Position the entity was placed at.
        position: DVec2,
    },
    /// Confirms that an entity left the active set.
    EntityDeactivated {
        /// Identifier the entity carried while it was active.
        entity: EntityId,
    },
    /// Announces that an agent began consuming a smaller entity.
    AbsorptionStarted {
        /// Agent performing the absorption.
        absorber: EntityId,
        /// Entity being consumed.
        target: EntityId,
        /// Score credited to the absorber.
        worth: f64,
    },
    /// Reports the new running score of an agent.
    ScoreChanged {
        /// Agent whose score changed.
        agent: EntityId,
        /// Score accumulated by the agent so far.
        total_score: f64,
    },
    /// Reports that an agent reached a new level.
    LevelAdvanced {
        /// Agent that levelled up.
        agent: EntityId,
        /// Level number taken from the level table.
        level: u32,
        /// Size applied to the agent for the new level.
        size: f64,
    },
    /// Announces that a shrink animation ran to completion and the target was dispatched.
    AbsorptionCompleted {
        /// Agent that performed the absorption.
        absorber: EntityId,
        /// Entity that was consumed.
        target: EntityId,
    },
    /// Announces that a shrink animation stopped because its target became invalid.
    AbsorptionAborted {
        /// Agent that performed the absorption.
        absorber: EntityId,
        /// Entity that disappeared mid-flight.
        target: EntityId,
    },
    /// Reports that a player was absorbed and removed from play.
    PlayerEliminated {
        /// Identifier the player carried while it was active.
        player: EntityId,
    },
    /// Requests presentation of a score popup.
    PopupShown {
        /// Pooled popup entity carrying the feedback.
        popup: EntityId,
        /// World position the popup starts from.
        position: DVec2,
        /// Whole points displayed by the popup.
        points: i64,
    },
    /// Reports that a popup finished and returned to its pool.
    PopupExpired {
        /// Popup that was released.
        popup: EntityId,
    },
    /// Reports that a spawn request could not be satisfied.
    SpawnRejected {
        /// Category of entity that was requested.
        category: Category,
        /// Specific reason the spawn failed.
        reason: Error,
    },
}

/// Failure taxonomy shared by the world and systems.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A component required by an entity was absent when it was initialised.
    #[error("{subject} is missing required dependency `{dependency}`")]
    MissingDependency {
        /// Description of the entity that could not be initialised.
        subject: String,
        /// Name of the dependency that could not be resolved.
        dependency: String,
    },
    /// A pool had no idle instance left to hand out.
    #[error("pool for {category:?} has no idle instance available")]
    PoolExhausted {
        /// Category served by the exhausted pool.
        category: Category,
    },
    /// A held reference no longer names an active entity.
    #[error("reference to {entity} is stale")]
    StaleReference {
        /// Reference that failed validation.
        entity: EntityId,
    },
    /// The level table is empty or malformed.
    #[error("invalid level table: {reason}")]
    InvalidLevelIndex {
        /// Human readable description of the defect.
        reason: String,
    },
}

/// Index of a food template inside the configured template list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FoodKind(u16);

impl FoodKind {
    /// Creates a food kind wrapper around the provided template index.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the template index.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Category tag attached to every simulated entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Static food object spawned from a template.
    Food(FoodKind),
    /// Autonomous agent steered by the behavior system.
    Bot,
    /// Agent steered by an input device.
    Player,
    /// Transient score feedback shown to the player.
    Popup,
}

impl Category {
    /// Reports whether entities of this category grow by absorbing others.
    #[must_use]
    pub const fn is_agent(self) -> bool {
        matches!(self, Self::Bot | Self::Player)
    }
}

/// Generational reference to a pooled entity.
///
/// The generation advances whenever the entity is released back to its pool,
/// so a reference captured before the release no longer validates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    category: Category,
    slot: u32,
    generation: u32,
}

impl EntityId {
    /// Creates a new entity reference.
    #[must_use]
    pub const fn new(category: Category, slot: u32, generation: u32) -> Self {
        Self {
            category,
            slot,
            generation,
        }
    }

    /// Category of the referenced entity.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Slot occupied by the entity inside its pool.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Generation the reference was captured at.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            Category::Food(kind) => write!(f, "food[{}]", kind.get())?,
            Category::Bot => f.write_str("bot")?,
            Category::Player => f.write_str("player")?,
            Category::Popup => f.write_str("popup")?,
        }
        write!(f, "#{}.{}", self.slot, self.generation)
    }
}

/// Capability shared by everything that can be compared for absorption.
pub trait HasSize {
    /// Current size used for eligibility and danger checks.
    fn size(&self) -> f64;
}

/// Reports whether `attacker` is strictly larger than `defender`.
///
/// Equal sizes never permit absorption in either direction.
#[must_use]
pub fn can_absorb<A, D>(attacker: &A, defender: &D) -> bool
where
    A: HasSize + ?Sized,
    D: HasSize + ?Sized,
{
    defender.size() < attacker.size()
}

/// Axis-aligned rectangle described by its centre and full extents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RegionDocument")]
pub struct Region {
    center: DVec2,
    size: DVec2,
}

#[derive(Deserialize)]
struct RegionDocument {
    center: DVec2,
    size: DVec2,
}

impl From<RegionDocument> for Region {
    fn from(document: RegionDocument) -> Self {
        Self::new(document.center, document.size)
    }
}

impl Region {
    /// Creates a region centred on `center` spanning `size` world units.
    #[must_use]
    pub fn new(center: DVec2, size: DVec2) -> Self {
        Self {
            center,
            size: size.abs(),
        }
    }

    /// Centre of the region.
    #[must_use]
    pub const fn center(&self) -> DVec2 {
        self.center
    }

    /// Full width and height of the region.
    #[must_use]
    pub const fn size(&self) -> DVec2 {
        self.size
    }

    /// Lower-left corner of the region.
    #[must_use]
    pub fn min(&self) -> DVec2 {
        self.center - self.size * 0.5
    }

    /// Upper-right corner of the region.
    #[must_use]
    pub fn max(&self) -> DVec2 {
        self.center + self.size * 0.5
    }

    /// Reports whether `point` lies inside the region, borders included.
    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// Projects `point` onto the closest location inside the region.
    #[must_use]
    pub fn clamp(&self, point: DVec2) -> DVec2 {
        point.max(self.min()).min(self.max())
    }
}

/// Immutable representation of an active, unclaimed agent used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Identifier of the agent; its category is either bot or player.
    pub id: EntityId,
    /// Position of the agent in world units.
    pub position: DVec2,
    /// Velocity currently applied to the agent.
    pub velocity: DVec2,
    /// Live size of the agent.
    pub size: f64,
}

impl HasSize for AgentSnapshot {
    fn size(&self) -> f64 {
        self.size
    }
}

/// Immutable representation of an active, unclaimed food object used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FoodSnapshot {
    /// Identifier of the food object.
    pub id: EntityId,
    /// Position of the food object in world units.
    pub position: DVec2,
    /// Fixed template size of the food object.
    pub size: f64,
    /// Score credited to whoever absorbs the object.
    pub worth: f64,
}

impl HasSize for FoodSnapshot {
    fn size(&self) -> f64 {
        self.size
    }
}

/// Read-only snapshot of every entity that scans may consider.
///
/// Inactive entities and entities already being absorbed are never part of
/// the view.
#[derive(Clone, Debug, Default)]
pub struct WorldView {
    agents: Vec<AgentSnapshot>,
    food: Vec<FoodSnapshot>,
}

impl WorldView {
    /// Creates a new view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(
        mut agents: Vec<AgentSnapshot>,
        mut food: Vec<FoodSnapshot>,
    ) -> Self {
        agents.sort_by_key(|snapshot| snapshot.id);
        food.sort_by_key(|snapshot| snapshot.id);
        Self { agents, food }
    }

    /// Agents in deterministic order.
    #[must_use]
    pub fn agents(&self) -> &[AgentSnapshot] {
        &self.agents
    }

    /// Food objects in deterministic order.
    #[must_use]
    pub fn food(&self) -> &[FoodSnapshot] {
        &self.food
    }

    /// Iterator over the bots contained in the view.
    pub fn bots(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.agents
            .iter()
            .filter(|snapshot| snapshot.id.category() == Category::Bot)
    }

    /// Looks up an agent by reference, validating its generation.
    #[must_use]
    pub fn agent(&self, id: EntityId) -> Option<&AgentSnapshot> {
        self.agents
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.agents[index])
    }

    /// Looks up a food object by reference, validating its generation.
    #[must_use]
    pub fn food_item(&self, id: EntityId) -> Option<&FoodSnapshot> {
        self.food
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.food[index])
    }

    /// Position of any entity in the view.
    #[must_use]
    pub fn position_of(&self, id: EntityId) -> Option<DVec2> {
        match id.category() {
            Category::Food(_) => self.food_item(id).map(|food| food.position),
            Category::Bot | Category::Player => self.agent(id).map(|agent| agent.position),
            Category::Popup => None,
        }
    }
}
