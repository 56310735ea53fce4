//! Ordered level table describing how score maps onto agent size.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Single row of the level table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Level number presented to players.
    pub level: u32,
    /// Minimum total score required to reach the level.
    pub required_score: f64,
    /// Size applied to an agent once it reaches the level.
    pub size: f64,
}

impl Level {
    /// Creates a new level row.
    #[must_use]
    pub const fn new(level: u32, required_score: f64, size: f64) -> Self {
        Self {
            level,
            required_score,
            size,
        }
    }
}

/// Validated level table with strictly increasing score thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Level>", into = "Vec<Level>")]
pub struct LevelTable {
    levels: Vec<Level>,
}

impl LevelTable {
    /// Validates and wraps the provided rows.
    ///
    /// The table must contain at least one row, thresholds must be finite and
    /// strictly increasing, and every size must be finite and positive.
    pub fn new(levels: Vec<Level>) -> Result<Self, Error> {
        if levels.is_empty() {
            return Err(invalid("table contains no levels"));
        }

        for (index, row) in levels.iter().enumerate() {
            if !row.required_score.is_finite() {
                return Err(invalid(format!(
                    "level index {index} has a non-finite required score"
                )));
            }
            if !row.size.is_finite() || row.size <= 0.0 {
                return Err(invalid(format!(
                    "level index {index} has non-positive size {}",
                    row.size
                )));
            }
        }

        for (index, pair) in levels.windows(2).enumerate() {
            if pair[1].required_score <= pair[0].required_score {
                return Err(invalid(format!(
                    "required score of level index {} does not exceed level index {index}",
                    index + 1
                )));
            }
        }

        Ok(Self { levels })
    }

    /// Rows of the table in ascending order.
    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Row stored at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    /// Clamps a configured start index into the valid range of the table.
    #[must_use]
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.levels.len() - 1)
    }

    /// Greatest index whose threshold is met by `score`, or zero when none is.
    #[must_use]
    pub fn index_for_score(&self, score: f64) -> usize {
        self.levels
            .iter()
            .rposition(|row| row.required_score <= score)
            .unwrap_or(0)
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            levels: vec![
                Level::new(1, 0.0, 1.0),
                Level::new(2, 10.0, 1.5),
                Level::new(3, 30.0, 2.0),
                Level::new(4, 60.0, 3.0),
                Level::new(5, 120.0, 4.0),
                Level::new(6, 250.0, 5.5),
                Level::new(7, 500.0, 7.0),
            ],
        }
    }
}

impl TryFrom<Vec<Level>> for LevelTable {
    type Error = Error;

    fn try_from(levels: Vec<Level>) -> Result<Self, Self::Error> {
        Self::new(levels)
    }
}

impl From<LevelTable> for Vec<Level> {
    fn from(table: LevelTable) -> Self {
        table.levels
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidLevelIndex {
        reason: reason.into(),
    }
}
