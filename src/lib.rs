//! HabitQuest - habit progression engine
//!
//! Turns daily habit completions into XP, points, global and per-area
//! levels, a rolling daily streak, achievements with claimable rewards and a
//! friends-only weekly leaderboard. All state lives in a single SQLite store
//! that serializes writers.

pub mod achievements;
pub mod error;
pub mod leaderboard;
pub mod ledger;
pub mod progression;
pub mod storage;

// Re-export commonly used types
pub use achievements::AchievementEngine;
pub use error::{EngineError, EngineResult};
pub use leaderboard::LeaderboardAggregator;
pub use ledger::CompletionLedger;
pub use progression::{LevelCurve, StreakTracker};
pub use storage::config::AppConfig;
pub use storage::database::Database;
