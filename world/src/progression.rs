//! Score accumulation, level lookup and size application for agents.

use devour_core::{Level, LevelTable};

/// Live size of an agent.
///
/// The visual and collision scale of the agent mirrors the size 1:1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeState {
    current_size: f64,
}

impl SizeState {
    /// Creates a size state initialised to `size`.
    #[must_use]
    pub const fn new(size: f64) -> Self {
        Self { current_size: size }
    }

    /// Current size of the agent.
    #[must_use]
    pub const fn current_size(&self) -> f64 {
        self.current_size
    }

    /// Scale applied to the agent's transform.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.current_size
    }

    fn apply(&mut self, size: f64) {
        self.current_size = size;
    }
}

/// Running score of an agent together with the level it has reached.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreRecord {
    total_score: f64,
    level_index: usize,
}

impl ScoreRecord {
    /// Starts a record at `start_level`, clamped into the table.
    ///
    /// The score begins at the level's threshold and the returned size state
    /// carries the level's size.
    #[must_use]
    pub fn start(levels: &LevelTable, start_level: usize) -> (Self, SizeState) {
        let level_index = levels.clamp_index(start_level);
        let row = levels.levels()[level_index];
        (
            Self {
                total_score: row.required_score,
                level_index,
            },
            SizeState::new(row.size),
        )
    }

    /// Score accumulated so far.
    #[must_use]
    pub const fn total_score(&self) -> f64 {
        self.total_score
    }

    /// Index of the reached level inside the table.
    #[must_use]
    pub const fn level_index(&self) -> usize {
        self.level_index
    }

    /// Row of the reached level.
    #[must_use]
    pub fn level<'table>(&self, levels: &'table LevelTable) -> &'table Level {
        &levels.levels()[levels.clamp_index(self.level_index)]
    }

    /// Adds `amount` to the score and advances through every level it unlocks.
    ///
    /// Each level gained applies its size to `size` and is appended to
    /// `advanced`. Non-positive or non-finite amounts leave the score untouched.
    pub fn add_score(
        &mut self,
        amount: f64,
        levels: &LevelTable,
        size: &mut SizeState,
        advanced: &mut Vec<Level>,
    ) {
        if amount.is_finite() && amount > 0.0 {
            self.total_score += amount;
        }

        while let Some(next) = levels.get(self.level_index + 1) {
            if next.required_score > self.total_score {
                break;
            }
            self.level_index += 1;
            size.apply(next.size);
            advanced.push(*next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn two_levels() -> LevelTable {
        LevelTable::new(vec![Level::new(0, 0.0, 1.0), Level::new(1, 5.0, 2.0)])
            .expect("valid table")
    }

    fn ladder() -> LevelTable {
        LevelTable::new(vec![
            Level::new(1, 0.0, 1.0),
            Level::new(2, 10.0, 1.5),
            Level::new(3, 30.0, 2.0),
            Level::new(4, 60.0, 3.0),
        ])
        .expect("valid table")
    }

    #[test]
    fn absorbing_five_points_reaches_second_level() {
        let levels = two_levels();
        let (mut record, mut size) = ScoreRecord::start(&levels, 0);
        let mut advanced = Vec::new();

        record.add_score(5.0, &levels, &mut size, &mut advanced);

        assert_eq!(record.total_score(), 5.0);
        assert_eq!(record.level_index(), 1);
        assert_eq!(size.current_size(), 2.0);
        assert_eq!(size.scale(), 2.0);
        assert_eq!(advanced, vec![Level::new(1, 5.0, 2.0)]);
    }

    #[test]
    fn start_level_is_clamped_and_seeds_score() {
        let levels = ladder();
        let (record, size) = ScoreRecord::start(&levels, 42);
        assert_eq!(record.level_index(), 3);
        assert_eq!(record.total_score(), 60.0);
        assert_eq!(size.current_size(), 3.0);
        assert_eq!(record.level(&levels).level, 4);
    }

    #[test]
    fn large_jump_advances_every_unlocked_level() {
        let levels = ladder();
        let (mut record, mut size) = ScoreRecord::start(&levels, 0);
        let mut advanced = Vec::new();

        record.add_score(35.0, &levels, &mut size, &mut advanced);

        assert_eq!(record.level_index(), 2);
        assert_eq!(size.current_size(), 2.0);
        assert_eq!(advanced.len(), 2);
    }

    #[test]
    fn final_level_absorbs_extra_score_without_advancing() {
        let levels = two_levels();
        let (mut record, mut size) = ScoreRecord::start(&levels, 1);
        let mut advanced = Vec::new();

        record.add_score(1_000.0, &levels, &mut size, &mut advanced);

        assert_eq!(record.level_index(), 1);
        assert!(advanced.is_empty());
        assert_eq!(size.current_size(), 2.0);
    }

    #[test]
    fn negative_amounts_do_not_reduce_score() {
        let levels = ladder();
        let (mut record, mut size) = ScoreRecord::start(&levels, 1);
        let mut advanced = Vec::new();

        record.add_score(-50.0, &levels, &mut size, &mut advanced);
        record.add_score(f64::NAN, &levels, &mut size, &mut advanced);

        assert_eq!(record.total_score(), 10.0);
        assert_eq!(record.level_index(), 1);
    }

    proptest! {
        #[test]
        fn score_is_monotonic_and_level_matches_score(
            amounts in proptest::collection::vec(-20.0f64..80.0, 0..40)
        ) {
            let levels = ladder();
            let (mut record, mut size) = ScoreRecord::start(&levels, 0);
            let mut advanced = Vec::new();
            let mut previous = record.total_score();

            for amount in amounts {
                record.add_score(amount, &levels, &mut size, &mut advanced);
                prop_assert!(record.total_score() >= previous);
                previous = record.total_score();

                let index = record.level_index();
                prop_assert_eq!(index, levels.index_for_score(record.total_score()));
                prop_assert_eq!(size.current_size(), levels.levels()[index].size);
                if let Some(next) = levels.get(index + 1) {
                    prop_assert!(record.total_score() < next.required_score);
                }
            }
        }
    }
}
