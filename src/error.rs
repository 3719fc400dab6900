//! Engine error taxonomy.
//!
//! Conflict variants (`AlreadyCompleted`, `NotCompleted`, `AlreadyClaimed`,
//! `NotUnlocked`) are expected outcomes of user actions, not bugs.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::progression::StreakError;
use crate::storage::DatabaseError;

/// Errors returned by progression engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Habit {habit_id} is already completed on {day}")]
    AlreadyCompleted { habit_id: Uuid, day: NaiveDate },

    #[error("Habit {habit_id} is not completed on {day}")]
    NotCompleted { habit_id: Uuid, day: NaiveDate },

    #[error("Achievement {0} has already been claimed")]
    AlreadyClaimed(String),

    #[error("Achievement {0} is not unlocked")]
    NotUnlocked(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient store error: {0}")]
    TransientStoreError(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl EngineError {
    /// Whether the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::TransientStoreError(_))
    }

    /// Whether this is an expected conflict with existing state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            EngineError::AlreadyCompleted { .. }
                | EngineError::NotCompleted { .. }
                | EngineError::AlreadyClaimed(_)
                | EngineError::NotUnlocked(_)
        )
    }
}

impl From<DatabaseError> for EngineError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Busy(msg) => EngineError::TransientStoreError(msg),
            DatabaseError::NotFound(what) => EngineError::NotFound(what),
            DatabaseError::ConstraintViolation(msg) => EngineError::Validation(msg),
            other => EngineError::Store(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        EngineError::from(DatabaseError::from(e))
    }
}

impl From<StreakError> for EngineError {
    fn from(e: StreakError) -> Self {
        EngineError::InvariantViolation(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
