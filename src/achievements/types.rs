//! Core types for achievements.
//!
//! Defines achievement definitions, requirement kinds, per-user unlock state
//! and the aggregate stats requirements are evaluated against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::types::RewardOutcome;

/// What an achievement's requirement value is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    /// Current daily streak length
    StreakDays,
    /// Lifetime habit completions
    TotalCompletions,
    /// Lifetime XP earned
    TotalXp,
    /// Accepted friends
    FriendCount,
    /// Global user level
    UserLevel,
    /// Highest level among enabled life areas
    AreaLevel,
    /// Every day of the streak window completed (value 1)
    PerfectWeek,
}

impl RequirementKind {
    pub const ALL: [RequirementKind; 7] = [
        RequirementKind::StreakDays,
        RequirementKind::TotalCompletions,
        RequirementKind::TotalXp,
        RequirementKind::FriendCount,
        RequirementKind::UserLevel,
        RequirementKind::AreaLevel,
        RequirementKind::PerfectWeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementKind::StreakDays => "streak_days",
            RequirementKind::TotalCompletions => "total_completions",
            RequirementKind::TotalXp => "total_xp",
            RequirementKind::FriendCount => "friend_count",
            RequirementKind::UserLevel => "user_level",
            RequirementKind::AreaLevel => "area_level",
            RequirementKind::PerfectWeek => "perfect_week",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

/// Achievement tier/difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementTier {
    Bronze,
    Silver,
    Gold,
    Diamond,
    Legendary,
}

impl AchievementTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Diamond => "diamond",
            Self::Legendary => "legendary",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bronze" => Some(Self::Bronze),
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            "diamond" => Some(Self::Diamond),
            "legendary" => Some(Self::Legendary),
            _ => None,
        }
    }
}

/// Achievement definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    /// Unique short key
    pub key: String,
    pub name: String,
    pub description: String,
    pub requirement: RequirementKind,
    /// Threshold the evaluated stat must reach
    pub requirement_value: u64,
    pub tier: AchievementTier,
    pub xp_reward: u64,
    pub points_reward: u64,
}

impl Achievement {
    pub fn new(
        key: &str,
        name: &str,
        description: &str,
        requirement: RequirementKind,
        requirement_value: u64,
        tier: AchievementTier,
    ) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            requirement,
            requirement_value,
            tier,
            xp_reward: 0,
            points_reward: 0,
        }
    }

    /// Set the one-time reward granted on claim
    pub fn with_reward(mut self, xp_reward: u64, points_reward: u64) -> Self {
        self.xp_reward = xp_reward;
        self.points_reward = points_reward;
        self
    }
}

/// Lifecycle of an achievement for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementState {
    Locked,
    /// Unlocked, reward not yet claimed
    Available,
    Claimed,
}

/// Unlock record for one (user, achievement) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAchievement {
    pub user_id: Uuid,
    pub achievement_key: String,
    pub progress: u64,
    pub unlocked_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl UserAchievement {
    pub fn state(&self) -> AchievementState {
        if self.claimed_at.is_some() {
            AchievementState::Claimed
        } else {
            AchievementState::Available
        }
    }
}

/// Achievement as seen by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    pub state: AchievementState,
    /// Never above `achievement.requirement_value`
    pub progress: u64,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
}

/// Summary of an achievement that just became available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub key: String,
    pub name: String,
    pub tier: AchievementTier,
    pub xp_reward: u64,
    pub points_reward: u64,
    pub unlocked_at: DateTime<Utc>,
}

/// Result of claiming an achievement reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub key: String,
    pub xp_reward: u64,
    pub points_reward: u64,
    pub claimed_at: DateTime<Utc>,
    pub reward: RewardOutcome,
    pub newly_unlocked: Vec<UnlockedAchievement>,
}

/// Aggregate user stats that requirements are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completions: u64,
    pub total_xp: u64,
    pub friend_count: u64,
    pub user_level: u32,
    pub max_area_level: u32,
    pub perfect_window: bool,
}
