//! Scenario documents combining world, behavior and player tuning.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use devour_core::config::{BotTuning, PlayerTuning, WorldConfig};
use serde::Deserialize;

/// Scenario bundled into the binary and used when no file is supplied.
const DEFAULT_SCENARIO: &str = include_str!("../scenario.toml");

/// Complete configuration of a headless run.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Scenario {
    pub(crate) world: WorldConfig,
    pub(crate) behavior: BotTuning,
    pub(crate) player: PlayerTuning,
}

impl Scenario {
    /// Loads the scenario at `path`, or the bundled one when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let document = fs::read_to_string(path)
                    .with_context(|| format!("failed to read scenario {}", path.display()))?;
                Self::parse(&document)
                    .with_context(|| format!("failed to parse scenario {}", path.display()))
            }
            None => Self::parse(DEFAULT_SCENARIO).context("bundled scenario is invalid"),
        }
    }

    fn parse(document: &str) -> Result<Self> {
        Ok(toml::from_str(document)?)
    }
}
