//! Requirement evaluators.
//!
//! One pure function per requirement kind, looked up by kind. Adding a new
//! kind means registering one more function; nothing inspects types at
//! runtime.

use std::collections::HashMap;

use super::types::{Achievement, AggregateStats, RequirementKind};

/// Maps aggregate stats to the value a requirement is compared against.
pub type Evaluator = fn(&AggregateStats) -> u64;

fn streak_days(stats: &AggregateStats) -> u64 {
    u64::from(stats.current_streak)
}

fn total_completions(stats: &AggregateStats) -> u64 {
    stats.total_completions
}

fn total_xp(stats: &AggregateStats) -> u64 {
    stats.total_xp
}

fn friend_count(stats: &AggregateStats) -> u64 {
    stats.friend_count
}

fn user_level(stats: &AggregateStats) -> u64 {
    u64::from(stats.user_level)
}

fn area_level(stats: &AggregateStats) -> u64 {
    u64::from(stats.max_area_level)
}

fn perfect_week(stats: &AggregateStats) -> u64 {
    u64::from(stats.perfect_window)
}

/// Lookup table from requirement kind to evaluator.
#[derive(Debug, Clone)]
pub struct EvaluatorRegistry {
    evaluators: HashMap<RequirementKind, Evaluator>,
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(RequirementKind::StreakDays, streak_days);
        registry.register(RequirementKind::TotalCompletions, total_completions);
        registry.register(RequirementKind::TotalXp, total_xp);
        registry.register(RequirementKind::FriendCount, friend_count);
        registry.register(RequirementKind::UserLevel, user_level);
        registry.register(RequirementKind::AreaLevel, area_level);
        registry.register(RequirementKind::PerfectWeek, perfect_week);
        registry
    }
}

impl EvaluatorRegistry {
    /// Registry with no evaluators.
    pub fn empty() -> Self {
        Self {
            evaluators: HashMap::new(),
        }
    }

    /// Register or replace the evaluator for `kind`.
    pub fn register(&mut self, kind: RequirementKind, evaluator: Evaluator) {
        self.evaluators.insert(kind, evaluator);
    }

    /// Raw stat value for `kind`, `None` if no evaluator is registered.
    pub fn evaluate(&self, kind: RequirementKind, stats: &AggregateStats) -> Option<u64> {
        self.evaluators.get(&kind).map(|evaluate| evaluate(stats))
    }

    /// Progress towards `achievement`, capped at its requirement value.
    pub fn progress(&self, achievement: &Achievement, stats: &AggregateStats) -> Option<u64> {
        self.evaluate(achievement.requirement, stats)
            .map(|value| value.min(achievement.requirement_value))
    }

    /// Whether `stats` meet the requirement of `achievement`.
    pub fn is_met(&self, achievement: &Achievement, stats: &AggregateStats) -> bool {
        self.evaluate(achievement.requirement, stats)
            .is_some_and(|value| value >= achievement.requirement_value)
    }
}
