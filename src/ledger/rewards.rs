//! The single write path for user and area progression totals.
//!
//! Completions, reversals, achievement claims and out-of-band grants all
//! change XP and points through these functions, so level-ups and bonuses
//! behave the same whatever triggered them. Callers pass an open
//! transaction; nothing here commits.

use rusqlite::Connection;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::ledger::types::{RewardOutcome, UserTotals};
use crate::progression::{level_from_xp, level_up_bonus, LevelChange};
use crate::storage::{AccountStore, ProgressionRules};

/// Result of applying an XP delta to a life area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AreaRewardOutcome {
    pub level: LevelChange,
    pub total_xp: u64,
    /// Area level-up bonus points, to be paid into the user's balance
    pub bonus_points: u64,
}

/// Convert a recorded amount to a signed delta.
pub(crate) fn to_delta(amount: u64) -> EngineResult<i64> {
    i64::try_from(amount)
        .map_err(|_| EngineError::InvariantViolation(format!("amount {} out of range", amount)))
}

/// Add a signed delta to a balance, clamping at zero.
pub(crate) fn apply_clamped(balance: u64, delta: i64) -> u64 {
    if delta >= 0 {
        balance.saturating_add(delta.unsigned_abs())
    } else {
        balance.saturating_sub(delta.unsigned_abs())
    }
}

fn signed_difference(after: u64, before: u64) -> i64 {
    if after >= before {
        i64::try_from(after - before).unwrap_or(i64::MAX)
    } else {
        i64::try_from(before - after).map(|d| -d).unwrap_or(i64::MIN)
    }
}

/// Apply XP and points deltas to a user and recompute the level.
///
/// Both balances clamp at zero. When the level rises, the bonus for every
/// level crossed is added to points on top of `points_delta`.
pub(crate) fn apply_user_delta(
    conn: &Connection,
    rules: &ProgressionRules,
    user_id: Uuid,
    xp_delta: i64,
    points_delta: i64,
) -> EngineResult<RewardOutcome> {
    let accounts = AccountStore::new(conn);
    let user = accounts
        .get_user(user_id)?
        .ok_or_else(|| EngineError::NotFound(format!("user {}", user_id)))?;

    // The cached level is not trusted; derive it from XP
    let old_level = level_from_xp(user.total_xp_earned, &rules.user_curve);
    let total_xp_earned = apply_clamped(user.total_xp_earned, xp_delta);
    let new_level = level_from_xp(total_xp_earned, &rules.user_curve);

    let bonus_points = level_up_bonus(old_level, new_level, rules.level_up_bonus);
    let points = apply_clamped(user.points, points_delta).saturating_add(bonus_points);

    accounts.update_user_totals(user_id, total_xp_earned, points, new_level)?;

    let level = LevelChange::new(old_level, new_level);
    if level.leveled_up() {
        tracing::info!(
            "User {} reached level {} (+{} bonus points)",
            user_id,
            new_level,
            bonus_points
        );
    } else if new_level < old_level {
        tracing::debug!("User {} dropped to level {}", user_id, new_level);
    }

    Ok(RewardOutcome {
        xp_delta: signed_difference(total_xp_earned, user.total_xp_earned),
        points_delta: signed_difference(points, user.points),
        bonus_points,
        level,
        totals: UserTotals {
            total_xp_earned,
            points,
            level: new_level,
        },
    })
}

/// Apply an XP delta to a life area and recompute its level.
pub(crate) fn apply_area_delta(
    conn: &Connection,
    rules: &ProgressionRules,
    area_id: Uuid,
    xp_delta: i64,
) -> EngineResult<AreaRewardOutcome> {
    let accounts = AccountStore::new(conn);
    let area = accounts
        .get_life_area(area_id)?
        .ok_or_else(|| EngineError::NotFound(format!("life area {}", area_id)))?;

    let old_level = level_from_xp(area.total_xp, &rules.area_curve);
    let total_xp = apply_clamped(area.total_xp, xp_delta);
    let new_level = level_from_xp(total_xp, &rules.area_curve);
    let bonus_points = level_up_bonus(old_level, new_level, rules.area_level_up_bonus);

    accounts.update_area_totals(area_id, total_xp, new_level)?;

    if new_level > old_level {
        tracing::info!("Life area {} reached level {}", area.name, new_level);
    }

    Ok(AreaRewardOutcome {
        level: LevelChange::new(old_level, new_level),
        total_xp,
        bonus_points,
    })
}
