//! Immutable tuning data supplied when the simulation is initialised.
//!
//! Every structure deserializes with `serde`, falling back to its [`Default`]
//! for omitted fields. Durations are written as floating point seconds and
//! vectors as `[x, y]` arrays.

use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{LevelTable, Region};

/// Configuration consumed by the authoritative world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for every random placement performed by the world.
    pub rng_seed: u64,
    /// Rectangle that agent positions are clamped to.
    pub arena: Region,
    /// Level table shared by bots and players.
    pub levels: LevelTable,
    /// Food templates; the position of a template is its [`crate::FoodKind`].
    pub food_templates: Vec<FoodTemplate>,
    /// Fixed spawn points of the world's food objects.
    pub food_placements: Vec<FoodPlacement>,
    /// Bot pool sizing and placement.
    pub bots: BotPoolConfig,
    /// Player-controlled agents created with the world.
    pub players: Vec<PlayerSpawn>,
    /// Score popup pool sizing and motion.
    pub popups: PopupConfig,
    /// Absorption animation and agent worth parameters.
    pub absorption: AbsorptionConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            rng_seed: 0x5eed_da7a_0f0d_bea7,
            arena: Region::new(DVec2::ZERO, DVec2::new(200.0, 200.0)),
            levels: LevelTable::default(),
            food_templates: vec![
                FoodTemplate::new("crumb", 0.5, 1.0, Duration::from_secs(5)),
                FoodTemplate::new("snack", 1.2, 3.0, Duration::from_secs(8)),
                FoodTemplate::new("feast", 2.5, 10.0, Duration::from_secs(15)),
            ],
            food_placements: Vec::new(),
            bots: BotPoolConfig::default(),
            players: vec![PlayerSpawn::default()],
            popups: PopupConfig::default(),
            absorption: AbsorptionConfig::default(),
        }
    }
}

/// Read-only template describing a category of food.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoodTemplate {
    /// Name used by placements to reference the template.
    pub name: String,
    /// Fixed size compared against absorbers.
    pub size: f64,
    /// Score credited to the absorber.
    pub worth: f64,
    /// Delay before an absorbed object reappears at its spawn point.
    #[serde(with = "seconds")]
    pub respawn_delay: Duration,
}

impl FoodTemplate {
    /// Creates a new food template.
    #[must_use]
    pub fn new(name: &str, size: f64, worth: f64, respawn_delay: Duration) -> Self {
        Self {
            name: name.to_owned(),
            size,
            worth,
            respawn_delay,
        }
    }
}

/// Fixed spawn point for a single food object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoodPlacement {
    /// Name of the template the object is created from.
    pub template: String,
    /// Original spawn position, reused on every respawn.
    pub position: DVec2,
}

/// Sizing and placement of the bot pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotPoolConfig {
    /// Number of bot instances created at warm-up.
    pub capacity: usize,
    /// Number of bots activated when the world starts.
    pub initial: usize,
    /// Delay before an absorbed bot reappears.
    #[serde(with = "seconds")]
    pub respawn_delay: Duration,
    /// Rectangle bots are placed in, uniformly at random.
    pub spawn_region: Region,
    /// Level index bots start from, clamped to the level table.
    pub start_level: usize,
}

impl Default for BotPoolConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            initial: 20,
            respawn_delay: Duration::from_secs(5),
            spawn_region: Region::new(DVec2::ZERO, DVec2::new(50.0, 50.0)),
            start_level: 0,
        }
    }
}

/// Spawn description of a player-controlled agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSpawn {
    /// Position the player starts at.
    pub position: DVec2,
    /// Level index the player starts from, clamped to the level table.
    pub start_level: usize,
}

impl Default for PlayerSpawn {
    fn default() -> Self {
        Self {
            position: DVec2::ZERO,
            start_level: 0,
        }
    }
}

/// Sizing and motion of score popups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    /// Number of popup instances created at warm-up.
    pub capacity: usize,
    /// Time a popup stays visible.
    #[serde(with = "seconds")]
    pub duration: Duration,
    /// Upward drift in world units per second.
    pub rise_speed: f64,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            duration: Duration::from_secs(1),
            rise_speed: 50.0,
        }
    }
}

/// Parameters of the absorption protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsorptionConfig {
    /// Length of the shrink-and-pull animation.
    #[serde(with = "seconds")]
    pub animation: Duration,
    /// Share of an absorbed agent's score credited to the absorber.
    pub agent_worth_ratio: f64,
    /// Minimum worth of an absorbed agent.
    pub agent_min_worth: f64,
}

impl Default for AbsorptionConfig {
    fn default() -> Self {
        Self {
            animation: Duration::from_millis(700),
            agent_worth_ratio: 0.5,
            agent_min_worth: 1.0,
        }
    }
}

/// Tuning of the bot decision engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotTuning {
    /// Speed used while seeking food or fleeing.
    pub base_speed: f64,
    /// Speed used while chasing prey with stamina to spare.
    pub sprint_speed: f64,
    /// Interval between forced target re-scans.
    #[serde(with = "seconds")]
    pub target_refresh_interval: Duration,
    /// Quiet period after fleeing or absorbing before a lost target triggers a re-scan.
    #[serde(with = "seconds")]
    pub post_action_delay: Duration,
    /// Danger detection range expressed as a multiple of the bot's own size.
    pub danger_range_factor: f64,
    /// Extra distance a threat must retreat beyond the danger range before it is ignored.
    pub clearance_offset: f64,
    /// Chase stop range expressed as a multiple of the danger range.
    pub chase_range_factor: f64,
    /// Lower stamina bound; sprinting requires stamina above it.
    pub stamina_min: f64,
    /// Upper stamina bound and the value restored on respawn.
    pub stamina_max: f64,
    /// Stamina drained per second while chasing or fleeing.
    pub stamina_drain_rate: f64,
    /// Stamina regenerated per second otherwise.
    pub stamina_regen_rate: f64,
}

impl Default for BotTuning {
    fn default() -> Self {
        Self {
            base_speed: 3.0,
            sprint_speed: 5.0,
            target_refresh_interval: Duration::from_secs(1),
            post_action_delay: Duration::from_millis(500),
            danger_range_factor: 3.0,
            clearance_offset: 2.0,
            chase_range_factor: 1.0,
            stamina_min: 0.0,
            stamina_max: 100.0,
            stamina_drain_rate: 30.0,
            stamina_regen_rate: 10.0,
        }
    }
}

/// Tuning of player-controlled movement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Speed used without sprinting.
    pub walk_speed: f64,
    /// Speed used while sprinting.
    pub sprint_speed: f64,
    /// Upper stamina bound and starting stamina.
    pub max_stamina: f64,
    /// Stamina drained per second while sprinting.
    pub stamina_drain_rate: f64,
    /// Stamina regenerated per second while not sprinting.
    pub stamina_regen_rate: f64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            sprint_speed: 10.0,
            max_stamina: 100.0,
            stamina_drain_rate: 30.0,
            stamina_regen_rate: 10.0,
        }
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_fields_fall_back_to_defaults() {
        let document = r#"
            rng_seed = 7

            [bots]
            capacity = 4
            respawn_delay = 2.5

            [[food_placements]]
            template = "crumb"
            position = [3.0, -4.0]
        "#;

        let config: WorldConfig = toml::from_str(document).expect("parse world config");
        assert_eq!(config.rng_seed, 7);
        assert_eq!(config.bots.capacity, 4);
        assert_eq!(config.bots.initial, BotPoolConfig::default().initial);
        assert_eq!(config.bots.respawn_delay, Duration::from_millis(2500));
        assert_eq!(config.food_placements[0].position, DVec2::new(3.0, -4.0));
        assert_eq!(config.levels, LevelTable::default());
    }

    #[test]
    fn negative_durations_are_rejected() {
        let document = r#"
            animation = -1.0
        "#;
        let parsed: Result<AbsorptionConfig, _> = toml::from_str(document);
        assert!(parsed.is_err());
    }
}
