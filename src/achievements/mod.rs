//! Achievement module
//!
//! Achievement definitions, requirement evaluators and the
//! locked -> available -> claimed lifecycle.

pub mod definitions;
pub mod engine;
pub mod evaluators;
pub mod types;

pub use engine::AchievementEngine;
pub use evaluators::{Evaluator, EvaluatorRegistry};
pub use types::{
    Achievement, AchievementState, AchievementStatus, AchievementTier, AggregateStats,
    ClaimOutcome, RequirementKind, UnlockedAchievement, UserAchievement,
};
