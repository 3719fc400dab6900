//! Completion ledger module
//!
//! Users, life areas and habits, the append-only completion log and the
//! single reward path every XP or points change goes through.

pub mod completion;
pub(crate) mod rewards;
pub mod types;

pub use completion::CompletionLedger;
pub use types::{
    AreaProgress, CompletionOutcome, GrantOutcome, Habit, HabitCompletion, LifeArea,
    ProgressSnapshot, RewardOutcome, UncompletionOutcome, User, UserTotals, MAX_HABIT_XP,
    MIN_HABIT_XP,
};
