//! Core types for the completion ledger.
//!
//! Defines users, life areas, habits, completion records and the outcomes
//! returned to callers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::achievements::UnlockedAchievement;
use crate::progression::{LevelChange, LevelProgress};

/// Smallest XP reward a habit may carry.
pub const MIN_HABIT_XP: u64 = 10;
/// Largest XP reward a habit may carry.
pub const MAX_HABIT_XP: u64 = 100;

/// User account with cached progression totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub total_xp_earned: u64,
    pub points: u64,
    /// Cached; always recomputable from `total_xp_earned`
    pub level: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a fresh user at level 1.
    pub fn new(display_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            display_name,
            total_xp_earned: 0,
            points: 0,
            level: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Category a habit belongs to, levelled on its own curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeArea {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub total_xp: u64,
    pub level: u32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl LifeArea {
    pub fn new(user_id: Uuid, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            total_xp: 0,
            level: 1,
            enabled: true,
            created_at: Utc::now(),
        }
    }
}

/// A daily habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub life_area_id: Uuid,
    pub name: String,
    /// XP granted per completion (10-100)
    pub xp: u64,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    pub fn new(user_id: Uuid, life_area_id: Uuid, name: String, xp: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            life_area_id,
            name,
            xp,
            created_at: Utc::now(),
        }
    }

    /// Validate a habit XP reward (10-100).
    pub fn validate_xp(xp: u64) -> bool {
        (MIN_HABIT_XP..=MAX_HABIT_XP).contains(&xp)
    }
}

/// One completion of one habit on one day.
///
/// Rewards are recorded as granted so a later reversal subtracts exactly
/// what was added, whatever the habit's XP is by then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitCompletion {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub user_id: Uuid,
    pub life_area_id: Uuid,
    pub completed_on: NaiveDate,
    pub xp_earned: u64,
    pub points_earned: u64,
    /// Level-up bonus points this completion triggered
    pub bonus_points: u64,
    pub created_at: DateTime<Utc>,
}

/// User totals after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTotals {
    pub total_xp_earned: u64,
    pub points: u64,
    pub level: u32,
}

/// Result of applying an XP/points delta to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardOutcome {
    /// XP actually added (negative when removed, after clamping)
    pub xp_delta: i64,
    /// Points actually added, bonus included (negative when removed)
    pub points_delta: i64,
    /// Level-up bonus points included in `points_delta`
    pub bonus_points: u64,
    pub level: LevelChange,
    pub totals: UserTotals,
}

/// Result of an out-of-band XP/points grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantOutcome {
    pub reward: RewardOutcome,
    pub newly_unlocked: Vec<UnlockedAchievement>,
}

/// What a completion applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub completion_id: Uuid,
    pub habit_id: Uuid,
    pub day: NaiveDate,
    pub xp_earned: u64,
    pub points_earned: u64,
    /// User and area level-up bonuses granted on top of `points_earned`
    pub bonus_points: u64,
    pub user_level: LevelChange,
    pub area_level: LevelChange,
    pub totals: UserTotals,
    pub area_total_xp: u64,
    pub current_streak: u32,
    pub newly_unlocked: Vec<UnlockedAchievement>,
}

/// What a reversal removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncompletionOutcome {
    pub habit_id: Uuid,
    pub day: NaiveDate,
    pub xp_removed: u64,
    pub points_removed: u64,
    pub user_level: LevelChange,
    pub area_level: LevelChange,
    pub totals: UserTotals,
    pub area_total_xp: u64,
    /// Whether another habit still keeps the day's streak flag set
    pub day_still_completed: bool,
    pub current_streak: u32,
    pub newly_unlocked: Vec<UnlockedAchievement>,
}

/// Read model of a user's progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub user_id: Uuid,
    pub display_name: String,
    pub total_xp_earned: u64,
    pub points: u64,
    pub progress: LevelProgress,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub streak_multiplier: f64,
    pub last_n_days: Vec<bool>,
    pub areas: Vec<AreaProgress>,
}

/// Read model of a life area's progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaProgress {
    pub area_id: Uuid,
    pub name: String,
    pub enabled: bool,
    pub total_xp: u64,
    pub progress: LevelProgress,
}
