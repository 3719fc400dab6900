//! Completion ledger.
//!
//! Completions are an append-only log keyed by (habit, day). Every write
//! runs in one `IMMEDIATE` transaction covering the completion row, user
//! and area totals, the streak window and the weekly leaderboard row; the
//! achievement re-check runs afterwards and never fails the write.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::rewards::{apply_area_delta, apply_user_delta, to_delta};
use super::types::{
    AreaProgress, CompletionOutcome, GrantOutcome, Habit, HabitCompletion, ProgressSnapshot,
    UncompletionOutcome,
};
use crate::achievements::{AchievementEngine, UnlockedAchievement};
use crate::error::{EngineError, EngineResult};
use crate::leaderboard::LeaderboardAggregator;
use crate::progression::{
    level_from_xp, points_from_xp, progress_within_level, StreakError, StreakTracker,
};
use crate::storage::database::{begin_write, uuid_column, DatabaseError};
use crate::storage::{AccountStore, ProgressionRules};

/// Completion ledger over a shared connection.
pub struct CompletionLedger<'a> {
    conn: &'a Connection,
    rules: &'a ProgressionRules,
}

impl<'a> CompletionLedger<'a> {
    pub fn new(conn: &'a Connection, rules: &'a ProgressionRules) -> Self {
        Self { conn, rules }
    }

    /// Complete a habit for `today`.
    ///
    /// Fails with `AlreadyCompleted` when the habit already has a completion
    /// for that day. The completion, both totals, the streak flag and the
    /// weekly row are applied together or not at all.
    pub fn complete_habit(&self, habit_id: Uuid, today: NaiveDate) -> EngineResult<CompletionOutcome> {
        let tx = begin_write(self.conn)?;
        let accounts = AccountStore::new(&tx);

        let habit = require_habit(&accounts, habit_id)?;
        if !Habit::validate_xp(habit.xp) {
            return Err(EngineError::InvariantViolation(format!(
                "habit {} carries xp {} outside 10..=100",
                habit_id, habit.xp
            )));
        }
        accounts
            .get_user(habit.user_id)?
            .ok_or_else(|| EngineError::NotFound(format!("user {}", habit.user_id)))?;

        if completion_for(&tx, habit_id, today)?.is_some() {
            return Err(EngineError::AlreadyCompleted { habit_id, day: today });
        }
        let first_of_day = completion_count_on(&tx, habit.user_id, today)? == 0;

        let xp_earned = habit.xp;
        let points_earned = points_from_xp(xp_earned, self.rules.points_to_xp_ratio);

        let area = apply_area_delta(&tx, self.rules, habit.life_area_id, to_delta(xp_earned)?)?;
        let reward = apply_user_delta(
            &tx,
            self.rules,
            habit.user_id,
            to_delta(xp_earned)?,
            to_delta(points_earned.saturating_add(area.bonus_points))?,
        )?;
        let bonus_points = area.bonus_points.saturating_add(reward.bonus_points);

        let completion = HabitCompletion {
            id: Uuid::new_v4(),
            habit_id,
            user_id: habit.user_id,
            life_area_id: habit.life_area_id,
            completed_on: today,
            xp_earned,
            points_earned,
            bonus_points,
            created_at: Utc::now(),
        };
        insert_completion(&tx, &completion)?;

        let mut streak = self.load_streak(&accounts, habit.user_id)?;
        if first_of_day {
            match streak.record_day(today, true) {
                Ok(()) => accounts.save_streak(habit.user_id, &streak)?,
                Err(StreakError::OutOfOrder { day, window_end }) => {
                    tracing::debug!(
                        "Completion on {} is older than the streak window ending {}, streak unchanged",
                        day,
                        window_end
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        LeaderboardAggregator::new(&tx).track_completion(
            habit.user_id,
            xp_earned,
            points_earned,
            today,
        )?;

        tx.commit().map_err(DatabaseError::from)?;
        tracing::debug!(
            "Completed habit {} on {} (+{} XP, +{} points, +{} bonus)",
            habit_id,
            today,
            xp_earned,
            points_earned,
            bonus_points
        );

        let newly_unlocked = self.recheck_achievements(habit.user_id);

        Ok(CompletionOutcome {
            completion_id: completion.id,
            habit_id,
            day: today,
            xp_earned,
            points_earned,
            bonus_points,
            user_level: reward.level,
            area_level: area.level,
            totals: reward.totals,
            area_total_xp: area.total_xp,
            current_streak: streak.current_streak(),
            newly_unlocked,
        })
    }

    /// Reverse the completion of a habit on `today`.
    ///
    /// Subtracts exactly what the completion recorded, bonus included, so
    /// later edits to the habit's XP do not leak into the totals. The day's
    /// streak flag is only cleared once no other habit is completed that day.
    /// Achievement unlocks and claims are left alone.
    pub fn uncomplete_habit(
        &self,
        habit_id: Uuid,
        today: NaiveDate,
    ) -> EngineResult<UncompletionOutcome> {
        let tx = begin_write(self.conn)?;
        let accounts = AccountStore::new(&tx);

        let completion = completion_for(&tx, habit_id, today)?
            .ok_or(EngineError::NotCompleted { habit_id, day: today })?;

        tx.execute(
            "DELETE FROM habit_completions WHERE id = ?1",
            params![completion.id.to_string()],
        )?;

        let area = apply_area_delta(
            &tx,
            self.rules,
            completion.life_area_id,
            -to_delta(completion.xp_earned)?,
        )?;
        let points_removed = completion
            .points_earned
            .saturating_add(completion.bonus_points);
        let reward = apply_user_delta(
            &tx,
            self.rules,
            completion.user_id,
            -to_delta(completion.xp_earned)?,
            -to_delta(points_removed)?,
        )?;

        let day_still_completed = completion_count_on(&tx, completion.user_id, today)? > 0;
        let mut streak = self.load_streak(&accounts, completion.user_id)?;
        if !day_still_completed {
            match streak.record_day(today, false) {
                Ok(()) => accounts.save_streak(completion.user_id, &streak)?,
                Err(StreakError::OutOfOrder { day, window_end }) => {
                    tracing::debug!(
                        "Reversal on {} is older than the streak window ending {}, streak unchanged",
                        day,
                        window_end
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        LeaderboardAggregator::new(&tx).untrack_completion(
            completion.user_id,
            completion.xp_earned,
            completion.points_earned,
            today,
        )?;

        tx.commit().map_err(DatabaseError::from)?;
        tracing::debug!(
            "Reversed habit {} on {} (-{} XP, -{} points)",
            habit_id,
            today,
            completion.xp_earned,
            points_removed
        );

        let newly_unlocked = self.recheck_achievements(completion.user_id);

        Ok(UncompletionOutcome {
            habit_id,
            day: today,
            xp_removed: completion.xp_earned,
            points_removed,
            user_level: reward.level,
            area_level: area.level,
            totals: reward.totals,
            area_total_xp: area.total_xp,
            day_still_completed,
            current_streak: streak.current_streak(),
            newly_unlocked,
        })
    }

    /// Apply signed XP and points adjustments outside of habit completions.
    ///
    /// Goes through the same level-up path as completions; balances clamp
    /// at zero.
    pub fn grant(&self, user_id: Uuid, xp_delta: i64, points_delta: i64) -> EngineResult<GrantOutcome> {
        let tx = begin_write(self.conn)?;
        let reward = apply_user_delta(&tx, self.rules, user_id, xp_delta, points_delta)?;
        tx.commit().map_err(DatabaseError::from)?;

        tracing::info!(
            "Granted user {} {:+} XP, {:+} points",
            user_id,
            reward.xp_delta,
            reward.points_delta
        );

        Ok(GrantOutcome {
            reward,
            newly_unlocked: self.recheck_achievements(user_id),
        })
    }

    /// Completion of a habit on a day, if any.
    pub fn get_completion(&self, habit_id: Uuid, day: NaiveDate) -> EngineResult<Option<HabitCompletion>> {
        completion_for(self.conn, habit_id, day)
    }

    /// All completions of a user on a day.
    pub fn completions_on(&self, user_id: Uuid, day: NaiveDate) -> EngineResult<Vec<HabitCompletion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, habit_id, user_id, life_area_id, completed_on, xp_earned, points_earned,
                    bonus_points, created_at
             FROM habit_completions WHERE user_id = ?1 AND completed_on = ?2
             ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![user_id.to_string(), day], row_to_completion)?;
        let completions = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(completions)
    }

    /// Progress read model for a user and their life areas.
    pub fn snapshot(&self, user_id: Uuid) -> EngineResult<ProgressSnapshot> {
        let accounts = AccountStore::new(self.conn);
        let user = accounts
            .get_user(user_id)?
            .ok_or_else(|| EngineError::NotFound(format!("user {}", user_id)))?;
        let streak = self.load_streak(&accounts, user_id)?;

        let user_curve = &self.rules.user_curve;
        let level = level_from_xp(user.total_xp_earned, user_curve);

        let areas = accounts
            .life_areas_for_user(user_id)?
            .into_iter()
            .map(|area| {
                let curve = &self.rules.area_curve;
                let area_level = level_from_xp(area.total_xp, curve);
                AreaProgress {
                    area_id: area.id,
                    progress: progress_within_level(area.total_xp, area_level, curve),
                    name: area.name,
                    enabled: area.enabled,
                    total_xp: area.total_xp,
                }
            })
            .collect();

        Ok(ProgressSnapshot {
            user_id,
            display_name: user.display_name,
            total_xp_earned: user.total_xp_earned,
            points: user.points,
            progress: progress_within_level(user.total_xp_earned, level, user_curve),
            current_streak: streak.current_streak(),
            longest_streak: streak.longest_streak(),
            streak_multiplier: streak.streak_bonus_multiplier(&self.rules.streak),
            last_n_days: streak.last_n_days().to_vec(),
            areas,
        })
    }

    /// Load a user's streak. The window length is fixed when the user is
    /// provisioned; a different configured size only applies to new users.
    fn load_streak(&self, accounts: &AccountStore<'_>, user_id: Uuid) -> EngineResult<StreakTracker> {
        let streak = accounts.require_streak(user_id)?;
        if streak.window_size() != self.rules.streak.window_size {
            tracing::warn!(
                "Streak window of user {} holds {} days, configured size is {}; keeping {}",
                user_id,
                streak.window_size(),
                self.rules.streak.window_size,
                streak.window_size()
            );
        }
        Ok(streak)
    }

    fn recheck_achievements(&self, user_id: Uuid) -> Vec<UnlockedAchievement> {
        AchievementEngine::new(self.conn, self.rules).check_and_unlock_best_effort(user_id)
    }
}

fn require_habit(accounts: &AccountStore<'_>, habit_id: Uuid) -> EngineResult<Habit> {
    accounts
        .get_habit(habit_id)?
        .ok_or_else(|| EngineError::NotFound(format!("habit {}", habit_id)))
}

fn completion_for(
    conn: &Connection,
    habit_id: Uuid,
    day: NaiveDate,
) -> EngineResult<Option<HabitCompletion>> {
    let completion = conn
        .query_row(
            "SELECT id, habit_id, user_id, life_area_id, completed_on, xp_earned, points_earned,
                    bonus_points, created_at
             FROM habit_completions WHERE habit_id = ?1 AND completed_on = ?2",
            params![habit_id.to_string(), day],
            row_to_completion,
        )
        .optional()?;
    Ok(completion)
}

fn completion_count_on(conn: &Connection, user_id: Uuid, day: NaiveDate) -> EngineResult<u64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM habit_completions WHERE user_id = ?1 AND completed_on = ?2",
        params![user_id.to_string(), day],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn insert_completion(conn: &Connection, completion: &HabitCompletion) -> EngineResult<()> {
    let result = conn.execute(
        "INSERT INTO habit_completions
         (id, habit_id, user_id, life_area_id, completed_on, xp_earned, points_earned,
          bonus_points, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            completion.id.to_string(),
            completion.habit_id.to_string(),
            completion.user_id.to_string(),
            completion.life_area_id.to_string(),
            completion.completed_on,
            completion.xp_earned,
            completion.points_earned,
            completion.bonus_points,
            completion.created_at,
        ],
    );

    match result.map_err(DatabaseError::from) {
        Ok(_) => Ok(()),
        // UNIQUE(habit_id, completed_on)
        Err(DatabaseError::ConstraintViolation(_)) => Err(EngineError::AlreadyCompleted {
            habit_id: completion.habit_id,
            day: completion.completed_on,
        }),
        Err(e) => Err(e.into()),
    }
}

fn row_to_completion(row: &Row<'_>) -> rusqlite::Result<HabitCompletion> {
    Ok(HabitCompletion {
        id: uuid_column(row, 0)?,
        habit_id: uuid_column(row, 1)?,
        user_id: uuid_column(row, 2)?,
        life_area_id: uuid_column(row, 3)?,
        completed_on: row.get(4)?,
        xp_earned: row.get(5)?,
        points_earned: row.get(6)?,
        bonus_points: row.get(7)?,
        created_at: row.get(8)?,
    })
}
