//! Weekly leaderboard module
//!
//! Per-user weekly aggregates keyed by Monday-start weeks, and ranked views
//! scoped to a user's accepted friends.

pub mod weekly;

pub use weekly::{
    rank_entries, week_start, FriendsLeaderboard, LeaderboardAggregator, RankedEntry, WeeklyEntry,
};
