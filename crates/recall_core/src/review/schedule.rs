//! Review interval table and next-review computation.

use crate::model::note::MAX_REVIEW_LEVEL;
use crate::time::{now_epoch_ms, DAY_MS, HOUR_MS};

/// Delay after a review at each level: 1h, 1d, 3d, 7d, 30d.
pub const REVIEW_INTERVALS_MS: [i64; 5] = [HOUR_MS, DAY_MS, 3 * DAY_MS, 7 * DAY_MS, 30 * DAY_MS];

/// Delay used once a note runs past the interval table.
pub const MASTERED_INTERVAL_MS: i64 = 365 * DAY_MS;

/// Tunable review schedule. `Default` reproduces the standard table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewConfig {
    /// Delay indexed by review level.
    pub intervals_ms: Vec<i64>,
    /// Delay for any level at or past `intervals_ms.len()`.
    pub mastered_interval_ms: i64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            intervals_ms: REVIEW_INTERVALS_MS.to_vec(),
            mastered_interval_ms: MASTERED_INTERVAL_MS,
        }
    }
}

impl ReviewConfig {
    /// Returns the delay applied after reaching `level`.
    pub fn interval_for(&self, level: u8) -> i64 {
        self.intervals_ms
            .get(usize::from(level))
            .copied()
            .unwrap_or(self.mastered_interval_ms)
    }

    /// Returns `now_ms + interval_for(level)`, saturating on overflow.
    pub fn next_review_date(&self, level: u8, now_ms: i64) -> i64 {
        now_ms.saturating_add(self.interval_for(level))
    }

    /// Returns the level after one more review, capped at `MAX_REVIEW_LEVEL`.
    ///
    /// The cap is fixed because the due predicate treats exactly that level
    /// as mastered.
    pub fn advance_level(&self, level: u8) -> u8 {
        level.saturating_add(1).min(MAX_REVIEW_LEVEL)
    }
}

/// Computes the next review timestamp for `level` with the standard table.
///
/// Levels at or beyond the table length (mastered notes) get the one-year
/// fallback, which keeps the date in the far future.
pub fn compute_next_review_date(level: u8, now_ms: i64) -> i64 {
    let interval = REVIEW_INTERVALS_MS
        .get(usize::from(level))
        .copied()
        .unwrap_or(MASTERED_INTERVAL_MS);
    now_ms.saturating_add(interval)
}

/// Wall-clock variant of `compute_next_review_date`.
pub fn next_review_date_from_now(level: u8) -> i64 {
    compute_next_review_date(level, now_epoch_ms())
}

#[cfg(test)]
mod tests {
    use super::{
        compute_next_review_date, ReviewConfig, MASTERED_INTERVAL_MS, REVIEW_INTERVALS_MS,
    };
    use crate::time::{DAY_MS, HOUR_MS};

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn table_matches_standard_intervals() {
        assert_eq!(compute_next_review_date(0, NOW), NOW + HOUR_MS);
        assert_eq!(compute_next_review_date(1, NOW), NOW + DAY_MS);
        assert_eq!(compute_next_review_date(2, NOW), NOW + 3 * DAY_MS);
        assert_eq!(compute_next_review_date(3, NOW), NOW + 7 * DAY_MS);
        assert_eq!(compute_next_review_date(4, NOW), NOW + 30 * DAY_MS);
    }

    #[test]
    fn levels_past_table_use_one_year_fallback() {
        assert_eq!(compute_next_review_date(5, NOW), NOW + MASTERED_INTERVAL_MS);
        assert_eq!(compute_next_review_date(200, NOW), NOW + 365 * DAY_MS);
    }

    #[test]
    fn default_config_agrees_with_free_function() {
        let config = ReviewConfig::default();
        for level in 0..=6u8 {
            assert_eq!(
                config.next_review_date(level, NOW),
                compute_next_review_date(level, NOW)
            );
        }
        assert_eq!(config.intervals_ms.len(), REVIEW_INTERVALS_MS.len());
    }

    #[test]
    fn advance_level_caps_at_max() {
        let config = ReviewConfig::default();
        assert_eq!(config.advance_level(0), 1);
        assert_eq!(config.advance_level(4), 5);
        assert_eq!(config.advance_level(5), 5);
        assert_eq!(config.advance_level(u8::MAX), 5);
    }
}
