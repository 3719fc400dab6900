//! Progression rules
//!
//! Pure leveling math and the daily streak window. Nothing in here touches
//! storage; the completion ledger drives both.

pub mod leveling;
pub mod streak;

pub use leveling::{
    level_from_xp, level_up_bonus, points_from_xp, progress_within_level, LevelChange, LevelCurve,
    LevelProgress,
};
pub use streak::{streak_bonus_multiplier, StreakError, StreakRules, StreakTracker};
