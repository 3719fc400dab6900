//! Friendship storage.
//!
//! The social graph is managed elsewhere; this store covers what the
//! progression engine reads from it (accepted friends and friend counts) plus
//! the writes needed to provision it.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::storage::database::{uuid_column, DatabaseError};

/// Friendship request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendshipStatus {
    Pending,
    Accepted,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(FriendshipStatus::Pending),
            "accepted" => Some(FriendshipStatus::Accepted),
            _ => None,
        }
    }
}

/// Social store for friendship rows.
pub struct SocialStore<'a> {
    conn: &'a Connection,
}

impl<'a> SocialStore<'a> {
    /// Create a new social store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record a friend request from `user_id` to `friend_id`.
    pub fn request_friendship(&self, user_id: Uuid, friend_id: Uuid) -> Result<(), DatabaseError> {
        if user_id == friend_id {
            return Err(DatabaseError::ConstraintViolation(
                "cannot befriend yourself".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT OR IGNORE INTO friendships (user_id, friend_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id.to_string(),
                friend_id.to_string(),
                FriendshipStatus::Pending.as_str(),
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    /// Accept a pending request, in either direction.
    pub fn accept_friendship(&self, user_id: Uuid, friend_id: Uuid) -> Result<(), DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE friendships SET status = ?3
             WHERE (user_id = ?1 AND friend_id = ?2) OR (user_id = ?2 AND friend_id = ?1)",
            params![
                user_id.to_string(),
                friend_id.to_string(),
                FriendshipStatus::Accepted.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(format!(
                "friend request between {} and {}",
                user_id, friend_id
            )));
        }
        Ok(())
    }

    /// Request and accept in one step.
    pub fn befriend(&self, user_id: Uuid, friend_id: Uuid) -> Result<(), DatabaseError> {
        self.request_friendship(user_id, friend_id)?;
        self.accept_friendship(user_id, friend_id)
    }

    /// Status of the friendship between two users, if any.
    pub fn friendship_status(
        &self,
        user_id: Uuid,
        friend_id: Uuid,
    ) -> Result<Option<FriendshipStatus>, DatabaseError> {
        let status: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM friendships
                 WHERE (user_id = ?1 AND friend_id = ?2) OR (user_id = ?2 AND friend_id = ?1)
                 ORDER BY status = 'accepted' DESC
                 LIMIT 1",
                params![user_id.to_string(), friend_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(status.as_deref().and_then(FriendshipStatus::from_str))
    }

    /// IDs of accepted friends, in either direction, sorted.
    pub fn accepted_friend_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT friend_id FROM friendships WHERE user_id = ?1 AND status = 'accepted'
             UNION
             SELECT user_id FROM friendships WHERE friend_id = ?1 AND status = 'accepted'",
        )?;

        let rows = stmt.query_map(params![user_id.to_string()], |row| uuid_column(row, 0))?;
        let mut ids = rows.collect::<Result<Vec<_>, _>>()?;
        ids.sort();
        Ok(ids)
    }

    /// Number of accepted friends.
    pub fn friend_count(&self, user_id: Uuid) -> Result<u64, DatabaseError> {
        Ok(self.accepted_friend_ids(user_id)?.len() as u64)
    }
}
