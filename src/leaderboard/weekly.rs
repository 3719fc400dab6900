//! Weekly leaderboard aggregates and friend-scoped rankings.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::storage::database::{uuid_column, DatabaseError};
use crate::storage::{AccountStore, SocialStore};

/// Monday of the week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    let offset = i64::from(day.weekday().num_days_from_monday());
    day - Duration::days(offset)
}

/// Stored weekly totals for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyEntry {
    pub user_id: Uuid,
    pub week_start: NaiveDate,
    pub weekly_xp_earned: u64,
    pub weekly_points_earned: u64,
    pub habits_completed: u64,
}

/// One ranked row of a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: u32,
    pub user_id: Uuid,
    pub display_name: String,
    pub weekly_xp_earned: u64,
    pub weekly_points_earned: u64,
    pub habits_completed: u64,
    pub is_current_user: bool,
}

/// Leaderboard of a user and their accepted friends for one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendsLeaderboard {
    pub week_start: NaiveDate,
    pub entries: Vec<RankedEntry>,
    pub user_rank: Option<u32>,
}

impl FriendsLeaderboard {
    /// Get top N entries.
    pub fn top(&self, n: usize) -> &[RankedEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Find the entry of a user.
    pub fn find_user(&self, user_id: Uuid) -> Option<&RankedEntry> {
        self.entries.iter().find(|e| e.user_id == user_id)
    }
}

/// Order rows and assign ranks.
///
/// Ordered by weekly XP descending, then habits completed descending, then
/// user id ascending. Ranks are dense over (weekly XP, habits completed):
/// rows equal on both share a rank and the next distinct row gets the next
/// integer.
pub fn rank_entries(mut entries: Vec<RankedEntry>) -> Vec<RankedEntry> {
    entries.sort_by(|a, b| {
        b.weekly_xp_earned
            .cmp(&a.weekly_xp_earned)
            .then(b.habits_completed.cmp(&a.habits_completed))
            .then(a.user_id.cmp(&b.user_id))
    });

    let mut rank = 0u32;
    let mut previous: Option<(u64, u64)> = None;
    for entry in &mut entries {
        let key = (entry.weekly_xp_earned, entry.habits_completed);
        if previous != Some(key) {
            rank += 1;
            previous = Some(key);
        }
        entry.rank = rank;
    }

    entries
}

/// Weekly leaderboard aggregator over a connection or an open transaction.
pub struct LeaderboardAggregator<'a> {
    conn: &'a Connection,
}

impl<'a> LeaderboardAggregator<'a> {
    /// Create a new aggregator with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Add a completion to the week containing `day`, creating the row if needed.
    pub fn track_completion(
        &self,
        user_id: Uuid,
        xp: u64,
        points: u64,
        day: NaiveDate,
    ) -> Result<WeeklyEntry, DatabaseError> {
        let week = week_start(day);
        self.conn.execute(
            "INSERT INTO weekly_leaderboard
             (user_id, week_start, weekly_xp_earned, weekly_points_earned, habits_completed, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)
             ON CONFLICT(user_id, week_start) DO UPDATE SET
                weekly_xp_earned = weekly_xp_earned + excluded.weekly_xp_earned,
                weekly_points_earned = weekly_points_earned + excluded.weekly_points_earned,
                habits_completed = habits_completed + 1,
                updated_at = excluded.updated_at",
            params![user_id.to_string(), week, xp, points, Utc::now()],
        )?;

        self.get_entry(user_id, week)?
            .ok_or_else(|| DatabaseError::NotFound(format!("weekly entry for {}", user_id)))
    }

    /// Remove a reversed completion from the week containing `day`, clamping at zero.
    pub(crate) fn untrack_completion(
        &self,
        user_id: Uuid,
        xp: u64,
        points: u64,
        day: NaiveDate,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE weekly_leaderboard SET
                weekly_xp_earned = MAX(weekly_xp_earned - ?3, 0),
                weekly_points_earned = MAX(weekly_points_earned - ?4, 0),
                habits_completed = MAX(habits_completed - 1, 0),
                updated_at = ?5
             WHERE user_id = ?1 AND week_start = ?2",
            params![user_id.to_string(), week_start(day), xp, points, Utc::now()],
        )?;
        Ok(())
    }

    /// Stored row for a user and week, if any.
    pub fn get_entry(&self, user_id: Uuid, week: NaiveDate) -> Result<Option<WeeklyEntry>, DatabaseError> {
        self.conn
            .query_row(
                "SELECT user_id, week_start, weekly_xp_earned, weekly_points_earned, habits_completed
                 FROM weekly_leaderboard WHERE user_id = ?1 AND week_start = ?2",
                params![user_id.to_string(), week],
                |row| {
                    Ok(WeeklyEntry {
                        user_id: uuid_column(row, 0)?,
                        week_start: row.get(1)?,
                        weekly_xp_earned: row.get(2)?,
                        weekly_points_earned: row.get(3)?,
                        habits_completed: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(DatabaseError::from)
    }

    /// Ranked leaderboard of `user_id` and their accepted friends.
    ///
    /// Defaults to the current UTC week; any given day is normalized to the
    /// Monday of its week. Members without activity appear with zeros.
    /// Read-only.
    pub fn friends_weekly_leaderboard(
        &self,
        user_id: Uuid,
        week: Option<NaiveDate>,
    ) -> EngineResult<FriendsLeaderboard> {
        let week = week_start(week.unwrap_or_else(|| Utc::now().date_naive()));
        let accounts = AccountStore::new(self.conn);
        accounts
            .get_user(user_id)?
            .ok_or_else(|| EngineError::NotFound(format!("user {}", user_id)))?;

        let mut members = SocialStore::new(self.conn).accepted_friend_ids(user_id)?;
        members.push(user_id);

        let mut entries = Vec::with_capacity(members.len());
        for user in accounts.get_users(&members)? {
            let totals = self.get_entry(user.id, week)?;
            entries.push(RankedEntry {
                rank: 0,
                user_id: user.id,
                display_name: user.display_name,
                weekly_xp_earned: totals.as_ref().map_or(0, |t| t.weekly_xp_earned),
                weekly_points_earned: totals.as_ref().map_or(0, |t| t.weekly_points_earned),
                habits_completed: totals.as_ref().map_or(0, |t| t.habits_completed),
                is_current_user: user.id == user_id,
            });
        }

        let entries = rank_entries(entries);
        let user_rank = entries.iter().find(|e| e.is_current_user).map(|e| e.rank);

        Ok(FriendsLeaderboard {
            week_start: week,
            entries,
            user_rank,
        })
    }
}
