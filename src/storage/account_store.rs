//! Account data storage operations.
//!
//! Provides persistence for:
//! - Users and their cached totals
//! - Life areas
//! - Habits
//! - Streak state
//!
//! Total and level columns are only written through the crate-private
//! `update_*_totals` methods, which the ledger's reward path owns.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::ledger::types::{Habit, LifeArea, User};
use crate::progression::streak::{decode_window, encode_window};
use crate::progression::StreakTracker;
use crate::storage::database::{begin_write, uuid_column, DatabaseError};

/// Account store over a connection or an open transaction.
pub struct AccountStore<'a> {
    conn: &'a Connection,
}

impl<'a> AccountStore<'a> {
    /// Create a new account store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== User Operations ==========

    /// Provision a user together with an empty streak window.
    ///
    /// Both rows are written in one transaction, so this must not be called
    /// while another transaction is open on the connection. The window
    /// length is fixed here for the lifetime of the user.
    pub fn create_user(&self, display_name: &str, window_size: usize) -> Result<User, DatabaseError> {
        let user = User::new(display_name.to_string());

        let tx = begin_write(self.conn)?;
        let store = AccountStore::new(&tx);
        store.insert_user(&user)?;
        store.save_streak(user.id, &StreakTracker::new(window_size))?;
        tx.commit()?;

        tracing::debug!("Provisioned user {}", user.id);
        Ok(user)
    }

    /// Insert a user row.
    pub fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO users (id, display_name, total_xp_earned, points, level, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id.to_string(),
                user.display_name,
                user.total_xp_earned,
                user.points,
                user.level,
                user.created_at,
                user.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a user by ID.
    pub fn get_user(&self, user_id: Uuid) -> Result<Option<User>, DatabaseError> {
        self.conn
            .query_row(
                "SELECT id, display_name, total_xp_earned, points, level, created_at, updated_at
                 FROM users WHERE id = ?1",
                params![user_id.to_string()],
                row_to_user,
            )
            .optional()
            .map_err(DatabaseError::from)
    }

    /// Get a user by ID, failing when it does not exist.
    pub fn require_user(&self, user_id: Uuid) -> Result<User, DatabaseError> {
        self.get_user(user_id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", user_id)))
    }

    /// Get several users, skipping unknown IDs.
    pub fn get_users(&self, user_ids: &[Uuid]) -> Result<Vec<User>, DatabaseError> {
        let mut users = Vec::with_capacity(user_ids.len());
        for id in user_ids {
            if let Some(user) = self.get_user(*id)? {
                users.push(user);
            }
        }
        Ok(users)
    }

    pub(crate) fn update_user_totals(
        &self,
        user_id: Uuid,
        total_xp_earned: u64,
        points: u64,
        level: u32,
    ) -> Result<(), DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE users SET total_xp_earned = ?2, points = ?3, level = ?4, updated_at = ?5
             WHERE id = ?1",
            params![user_id.to_string(), total_xp_earned, points, level, Utc::now()],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }

    // ========== Life Area Operations ==========

    /// Create a life area for a user.
    pub fn create_life_area(&self, user_id: Uuid, name: &str) -> Result<LifeArea, DatabaseError> {
        self.require_user(user_id)?;
        let area = LifeArea::new(user_id, name.to_string());
        self.conn.execute(
            "INSERT INTO life_areas (id, user_id, name, total_xp, level, enabled, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                area.id.to_string(),
                area.user_id.to_string(),
                area.name,
                area.total_xp,
                area.level,
                area.enabled,
                area.created_at,
            ],
        )?;
        Ok(area)
    }

    /// Get a life area by ID.
    pub fn get_life_area(&self, area_id: Uuid) -> Result<Option<LifeArea>, DatabaseError> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, total_xp, level, enabled, created_at
                 FROM life_areas WHERE id = ?1",
                params![area_id.to_string()],
                row_to_life_area,
            )
            .optional()
            .map_err(DatabaseError::from)
    }

    /// Get all life areas of a user, oldest first.
    pub fn life_areas_for_user(&self, user_id: Uuid) -> Result<Vec<LifeArea>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, total_xp, level, enabled, created_at
             FROM life_areas WHERE user_id = ?1
             ORDER BY created_at ASC, name ASC",
        )?;
        let rows = stmt.query_map(params![user_id.to_string()], row_to_life_area)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
    }

    /// Enable or disable a life area.
    pub fn set_life_area_enabled(&self, area_id: Uuid, enabled: bool) -> Result<(), DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE life_areas SET enabled = ?2 WHERE id = ?1",
            params![area_id.to_string(), enabled],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(format!("life area {}", area_id)));
        }
        Ok(())
    }

    pub(crate) fn update_area_totals(
        &self,
        area_id: Uuid,
        total_xp: u64,
        level: u32,
    ) -> Result<(), DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE life_areas SET total_xp = ?2, level = ?3 WHERE id = ?1",
            params![area_id.to_string(), total_xp, level],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(format!("life area {}", area_id)));
        }
        Ok(())
    }

    // ========== Habit Operations ==========

    /// Create a habit in one of the user's life areas.
    pub fn create_habit(
        &self,
        user_id: Uuid,
        life_area_id: Uuid,
        name: &str,
        xp: u64,
    ) -> Result<Habit, DatabaseError> {
        if !Habit::validate_xp(xp) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "habit xp must be between 10 and 100, got {}",
                xp
            )));
        }

        let area = self
            .get_life_area(life_area_id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("life area {}", life_area_id)))?;
        if area.user_id != user_id {
            return Err(DatabaseError::ConstraintViolation(format!(
                "life area {} belongs to another user",
                life_area_id
            )));
        }

        let habit = Habit::new(user_id, life_area_id, name.to_string(), xp);
        self.conn.execute(
            "INSERT INTO habits (id, user_id, life_area_id, name, xp, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                habit.id.to_string(),
                habit.user_id.to_string(),
                habit.life_area_id.to_string(),
                habit.name,
                habit.xp,
                habit.created_at,
            ],
        )?;
        Ok(habit)
    }

    /// Get a habit by ID.
    pub fn get_habit(&self, habit_id: Uuid) -> Result<Option<Habit>, DatabaseError> {
        self.conn
            .query_row(
                "SELECT id, user_id, life_area_id, name, xp, created_at
                 FROM habits WHERE id = ?1",
                params![habit_id.to_string()],
                row_to_habit,
            )
            .optional()
            .map_err(DatabaseError::from)
    }

    /// Get all habits of a user.
    pub fn habits_for_user(&self, user_id: Uuid) -> Result<Vec<Habit>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, life_area_id, name, xp, created_at
             FROM habits WHERE user_id = ?1
             ORDER BY created_at ASC, name ASC",
        )?;
        let rows = stmt.query_map(params![user_id.to_string()], row_to_habit)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
    }

    /// Change the XP reward of a habit. Past completions keep their recorded XP.
    pub fn set_habit_xp(&self, habit_id: Uuid, xp: u64) -> Result<(), DatabaseError> {
        if !Habit::validate_xp(xp) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "habit xp must be between 10 and 100, got {}",
                xp
            )));
        }
        let updated = self.conn.execute(
            "UPDATE habits SET xp = ?2 WHERE id = ?1",
            params![habit_id.to_string(), xp],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(format!("habit {}", habit_id)));
        }
        Ok(())
    }

    // ========== Streak Operations ==========

    /// Load the streak state of a user.
    pub fn get_streak(&self, user_id: Uuid) -> Result<Option<StreakTracker>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT last_n_days, longest_streak, last_completion_date, window_end
                 FROM streaks WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, Option<NaiveDate>>(2)?,
                        row.get::<_, Option<NaiveDate>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((encoded, longest, last_completion, window_end)) = row else {
            return Ok(None);
        };

        let days = decode_window(&encoded)
            .map_err(|e| DatabaseError::DeserializationError(e.to_string()))?;
        StreakTracker::from_parts(days, longest, last_completion, window_end)
            .map(Some)
            .map_err(|e| DatabaseError::DeserializationError(e.to_string()))
    }

    /// Load the streak state of a user, failing when it does not exist.
    pub fn require_streak(&self, user_id: Uuid) -> Result<StreakTracker, DatabaseError> {
        self.get_streak(user_id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("streak for user {}", user_id)))
    }

    pub(crate) fn save_streak(&self, user_id: Uuid, streak: &StreakTracker) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO streaks (user_id, current_streak, longest_streak, last_n_days,
                                  last_completion_date, window_end, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id) DO UPDATE SET
                current_streak = excluded.current_streak,
                longest_streak = excluded.longest_streak,
                last_n_days = excluded.last_n_days,
                last_completion_date = excluded.last_completion_date,
                window_end = excluded.window_end,
                updated_at = excluded.updated_at",
            params![
                user_id.to_string(),
                streak.current_streak(),
                streak.longest_streak(),
                encode_window(streak.last_n_days()),
                streak.last_completion_date(),
                streak.window_end(),
                Utc::now(),
            ],
        )?;
        Ok(())
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_column(row, 0)?,
        display_name: row.get(1)?,
        total_xp_earned: row.get(2)?,
        points: row.get(3)?,
        level: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_life_area(row: &Row<'_>) -> rusqlite::Result<LifeArea> {
    Ok(LifeArea {
        id: uuid_column(row, 0)?,
        user_id: uuid_column(row, 1)?,
        name: row.get(2)?,
        total_xp: row.get(3)?,
        level: row.get(4)?,
        enabled: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn row_to_habit(row: &Row<'_>) -> rusqlite::Result<Habit> {
    Ok(Habit {
        id: uuid_column(row, 0)?,
        user_id: uuid_column(row, 1)?,
        life_area_id: uuid_column(row, 2)?,
        name: row.get(3)?,
        xp: row.get(4)?,
        created_at: row.get(5)?,
    })
}
