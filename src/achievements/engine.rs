//! Achievement unlocking and claiming.
//!
//! Unlocks are insert-if-absent keyed by (user, achievement), so re-running
//! a check never duplicates or revokes anything. Claims grant the reward
//! through the same reward path habit completions use.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::definitions::seed_achievements;
use super::evaluators::EvaluatorRegistry;
use super::types::{
    Achievement, AchievementState, AchievementStatus, AchievementTier, AggregateStats,
    ClaimOutcome, RequirementKind, UnlockedAchievement, UserAchievement,
};
use crate::error::{EngineError, EngineResult};
use crate::ledger::rewards::{apply_user_delta, to_delta};
use crate::progression::level_from_xp;
use crate::storage::database::{begin_write, uuid_column, DatabaseError};
use crate::storage::{AccountStore, ProgressionRules, SocialStore};

/// Achievement engine over a shared connection.
pub struct AchievementEngine<'a> {
    conn: &'a Connection,
    rules: &'a ProgressionRules,
    registry: EvaluatorRegistry,
}

impl<'a> AchievementEngine<'a> {
    /// Create an engine with the built-in evaluators.
    pub fn new(conn: &'a Connection, rules: &'a ProgressionRules) -> Self {
        Self::with_registry(conn, rules, EvaluatorRegistry::default())
    }

    /// Create an engine with a custom evaluator table.
    pub fn with_registry(
        conn: &'a Connection,
        rules: &'a ProgressionRules,
        registry: EvaluatorRegistry,
    ) -> Self {
        Self {
            conn,
            rules,
            registry,
        }
    }

    /// Insert the built-in achievement definitions if missing.
    pub fn seed_defaults(&self) -> EngineResult<usize> {
        Ok(seed_achievements(self.conn)?)
    }

    /// All known achievement definitions.
    ///
    /// Rows with an unknown requirement tag or tier are skipped.
    pub fn all_achievements(&self) -> EngineResult<Vec<Achievement>> {
        load_achievements(self.conn)
    }

    /// Get an achievement definition by key.
    pub fn get_achievement(&self, key: &str) -> EngineResult<Option<Achievement>> {
        let row = self
            .conn
            .query_row(
                "SELECT key, name, description, requirement_type, requirement_value, tier,
                        xp_reward, points_reward
                 FROM achievements WHERE key = ?1",
                params![key],
                read_achievement_row,
            )
            .optional()?;

        Ok(row.and_then(parse_achievement_row))
    }

    /// Unlock record for one user and achievement.
    pub fn get_user_achievement(
        &self,
        user_id: Uuid,
        key: &str,
    ) -> EngineResult<Option<UserAchievement>> {
        user_achievement(self.conn, user_id, key)
    }

    /// All unlock records of a user.
    pub fn user_achievements(&self, user_id: Uuid) -> EngineResult<Vec<UserAchievement>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, achievement_key, progress, unlocked_at, claimed_at
             FROM user_achievements WHERE user_id = ?1
             ORDER BY unlocked_at ASC, achievement_key ASC",
        )?;
        let rows = stmt.query_map(params![user_id.to_string()], row_to_user_achievement)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Aggregate stats requirements are evaluated against.
    pub fn aggregate_stats(&self, user_id: Uuid) -> EngineResult<AggregateStats> {
        aggregate_stats(self.conn, self.rules, user_id)
    }

    /// Unlock every achievement whose requirement is now met.
    ///
    /// Returns only the achievements unlocked by this call. Idempotent:
    /// existing unlocks are never duplicated or removed.
    pub fn check_and_unlock(&self, user_id: Uuid) -> EngineResult<Vec<UnlockedAchievement>> {
        let tx = begin_write(self.conn)?;
        let stats = aggregate_stats(&tx, self.rules, user_id)?;
        let now = Utc::now();

        let mut unlocked = Vec::new();
        for achievement in load_achievements(&tx)? {
            if !self.registry.is_met(&achievement, &stats) {
                continue;
            }

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO user_achievements
                 (user_id, achievement_key, progress, unlocked_at, claimed_at)
                 VALUES (?1, ?2, ?3, ?4, NULL)",
                params![
                    user_id.to_string(),
                    achievement.key,
                    achievement.requirement_value,
                    now,
                ],
            )?;

            if inserted == 1 {
                tracing::info!("User {} unlocked achievement {}", user_id, achievement.key);
                unlocked.push(UnlockedAchievement {
                    key: achievement.key,
                    name: achievement.name,
                    tier: achievement.tier,
                    xp_reward: achievement.xp_reward,
                    points_reward: achievement.points_reward,
                    unlocked_at: now,
                });
            }
        }

        tx.commit().map_err(DatabaseError::from)?;
        Ok(unlocked)
    }

    /// Re-check unlocks without letting a failure reach the caller.
    pub(crate) fn check_and_unlock_best_effort(&self, user_id: Uuid) -> Vec<UnlockedAchievement> {
        match self.check_and_unlock(user_id) {
            Ok(unlocked) => unlocked,
            Err(e) => {
                tracing::warn!("Achievement check failed for user {}: {}", user_id, e);
                Vec::new()
            }
        }
    }

    /// Claim the reward of an unlocked achievement.
    ///
    /// Fails with `NotUnlocked` before the unlock and `AlreadyClaimed` after
    /// a previous claim, so the reward is granted at most once.
    pub fn claim(&self, user_id: Uuid, key: &str) -> EngineResult<ClaimOutcome> {
        let tx = begin_write(self.conn)?;

        let achievement = load_achievements(&tx)?
            .into_iter()
            .find(|a| a.key == key)
            .ok_or_else(|| EngineError::NotFound(format!("achievement {}", key)))?;

        let record = user_achievement(&tx, user_id, key)?
            .ok_or_else(|| EngineError::NotUnlocked(key.to_string()))?;
        if record.claimed_at.is_some() {
            return Err(EngineError::AlreadyClaimed(key.to_string()));
        }

        let claimed_at = Utc::now().max(record.unlocked_at);
        let updated = tx.execute(
            "UPDATE user_achievements SET claimed_at = ?3
             WHERE user_id = ?1 AND achievement_key = ?2 AND claimed_at IS NULL",
            params![user_id.to_string(), key, claimed_at],
        )?;
        if updated != 1 {
            return Err(EngineError::AlreadyClaimed(key.to_string()));
        }

        let reward = apply_user_delta(
            &tx,
            self.rules,
            user_id,
            to_delta(achievement.xp_reward)?,
            to_delta(achievement.points_reward)?,
        )?;

        tx.commit().map_err(DatabaseError::from)?;
        tracing::info!(
            "User {} claimed {} (+{} XP, +{} points)",
            user_id,
            key,
            achievement.xp_reward,
            achievement.points_reward
        );

        let newly_unlocked = self.check_and_unlock_best_effort(user_id);

        Ok(ClaimOutcome {
            key: achievement.key,
            xp_reward: achievement.xp_reward,
            points_reward: achievement.points_reward,
            claimed_at,
            reward,
            newly_unlocked,
        })
    }

    /// Every achievement with this user's state and capped progress.
    pub fn statuses(&self, user_id: Uuid) -> EngineResult<Vec<AchievementStatus>> {
        let stats = self.aggregate_stats(user_id)?;
        let records = self.user_achievements(user_id)?;

        let statuses = self
            .all_achievements()?
            .into_iter()
            .map(|achievement| {
                match records.iter().find(|r| r.achievement_key == achievement.key) {
                    Some(record) => AchievementStatus {
                        state: record.state(),
                        progress: record.progress.min(achievement.requirement_value),
                        unlocked_at: Some(record.unlocked_at),
                        claimed_at: record.claimed_at,
                        achievement,
                    },
                    None => AchievementStatus {
                        state: AchievementState::Locked,
                        progress: self.registry.progress(&achievement, &stats).unwrap_or(0),
                        unlocked_at: None,
                        claimed_at: None,
                        achievement,
                    },
                }
            })
            .collect();

        Ok(statuses)
    }
}

fn aggregate_stats(
    conn: &Connection,
    rules: &ProgressionRules,
    user_id: Uuid,
) -> EngineResult<AggregateStats> {
    let accounts = AccountStore::new(conn);
    let user = accounts
        .get_user(user_id)?
        .ok_or_else(|| EngineError::NotFound(format!("user {}", user_id)))?;
    let streak = accounts.require_streak(user_id)?;

    let total_completions: u64 = conn.query_row(
        "SELECT COUNT(*) FROM habit_completions WHERE user_id = ?1",
        params![user_id.to_string()],
        |row| row.get(0),
    )?;

    let max_area_level = accounts
        .life_areas_for_user(user_id)?
        .iter()
        .filter(|area| area.enabled)
        .map(|area| level_from_xp(area.total_xp, &rules.area_curve))
        .max()
        .unwrap_or(0);

    Ok(AggregateStats {
        current_streak: streak.current_streak(),
        longest_streak: streak.longest_streak(),
        total_completions,
        total_xp: user.total_xp_earned,
        friend_count: SocialStore::new(conn).friend_count(user_id)?,
        user_level: level_from_xp(user.total_xp_earned, &rules.user_curve),
        max_area_level,
        perfect_window: streak.is_perfect_window(),
    })
}

type AchievementRow = (String, String, String, String, u64, String, u64, u64);

fn read_achievement_row(row: &Row<'_>) -> rusqlite::Result<AchievementRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn parse_achievement_row(row: AchievementRow) -> Option<Achievement> {
    let (key, name, description, requirement_str, requirement_value, tier_str, xp, points) = row;

    let Some(requirement) = RequirementKind::from_str(&requirement_str) else {
        tracing::warn!("Skipping achievement {} with unknown requirement {}", key, requirement_str);
        return None;
    };
    let Some(tier) = AchievementTier::from_str(&tier_str) else {
        tracing::warn!("Skipping achievement {} with unknown tier {}", key, tier_str);
        return None;
    };

    Some(Achievement {
        key,
        name,
        description,
        requirement,
        requirement_value,
        tier,
        xp_reward: xp,
        points_reward: points,
    })
}

fn load_achievements(conn: &Connection) -> EngineResult<Vec<Achievement>> {
    let mut stmt = conn.prepare(
        "SELECT key, name, description, requirement_type, requirement_value, tier,
                xp_reward, points_reward
         FROM achievements ORDER BY requirement_type ASC, requirement_value ASC, key ASC",
    )?;
    let rows = stmt.query_map([], read_achievement_row)?;

    let mut achievements = Vec::new();
    for row in rows {
        if let Some(achievement) = parse_achievement_row(row?) {
            achievements.push(achievement);
        }
    }
    Ok(achievements)
}

fn user_achievement(
    conn: &Connection,
    user_id: Uuid,
    key: &str,
) -> EngineResult<Option<UserAchievement>> {
    let record = conn
        .query_row(
            "SELECT user_id, achievement_key, progress, unlocked_at, claimed_at
             FROM user_achievements WHERE user_id = ?1 AND achievement_key = ?2",
            params![user_id.to_string(), key],
            row_to_user_achievement,
        )
        .optional()?;
    Ok(record)
}

fn row_to_user_achievement(row: &Row<'_>) -> rusqlite::Result<UserAchievement> {
    Ok(UserAchievement {
        user_id: uuid_column(row, 0)?,
        achievement_key: row.get(1)?,
        progress: row.get(2)?,
        unlocked_at: row.get::<_, DateTime<Utc>>(3)?,
        claimed_at: row.get(4)?,
    })
}
