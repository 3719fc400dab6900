//! Level curves.
//!
//! Pure functions mapping accumulated XP to a level. The same shape is used
//! for the global user level and for life areas, each with its own curve.

use serde::{Deserialize, Serialize};

/// Geometric level curve.
///
/// Reaching level `n` (n >= 2) costs `base_xp_per_level * multiplier^(n-2)`
/// XP on top of everything needed for level `n - 1`. Per-level costs are
/// rounded to whole XP so cumulative thresholds are exact integers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelCurve {
    /// XP needed to go from level 1 to level 2
    pub base_xp_per_level: u64,
    /// Growth factor applied to each further level
    pub multiplier: f64,
    /// Highest reachable level
    pub max_level: u32,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self {
            base_xp_per_level: 150,
            multiplier: 1.2,
            max_level: 100,
        }
    }
}

impl LevelCurve {
    /// Check the curve is usable.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.base_xp_per_level == 0 {
            return Err("base_xp_per_level must be positive");
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err("multiplier must be at least 1.0");
        }
        if self.max_level == 0 {
            return Err("max_level must be at least 1");
        }
        Ok(())
    }

    /// XP cost of the step into `level` (0 for level 1 and below).
    pub fn level_threshold(&self, level: u32) -> u64 {
        if level < 2 {
            return 0;
        }
        let exponent = i32::try_from(level - 2).unwrap_or(i32::MAX);
        let cost = self.base_xp_per_level as f64 * self.multiplier.powi(exponent);
        // Float-to-int casts saturate, so an overflowing curve pins at u64::MAX
        cost.round() as u64
    }

    /// Cumulative XP required to stand at `level`.
    pub fn xp_for_level(&self, level: u32) -> u64 {
        let capped = level.min(self.max_level);
        (2..=capped).fold(0u64, |total, n| total.saturating_add(self.level_threshold(n)))
    }
}

/// Level reached with `total_xp` on `curve`.
///
/// Largest level whose cumulative threshold is <= `total_xp`, capped at
/// `curve.max_level`. Monotonic non-decreasing in XP.
pub fn level_from_xp(total_xp: u64, curve: &LevelCurve) -> u32 {
    let mut level = 1;
    let mut cumulative = 0u64;

    while level < curve.max_level {
        let next = cumulative.saturating_add(curve.level_threshold(level + 1));
        if next > total_xp {
            break;
        }
        cumulative = next;
        level += 1;
    }

    level
}

/// Position inside the current level, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    /// XP earned since reaching `level`
    pub earned_in_level: u64,
    /// XP the step to the next level costs; 0 at the cap
    pub needed_for_level: u64,
}

impl LevelProgress {
    /// Completion of the current level in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.needed_for_level == 0 {
            return 1.0;
        }
        (self.earned_in_level as f64 / self.needed_for_level as f64).min(1.0)
    }
}

/// Progress within `level` for a total of `total_xp`.
pub fn progress_within_level(total_xp: u64, level: u32, curve: &LevelCurve) -> LevelProgress {
    let level = level.clamp(1, curve.max_level);
    let earned_in_level = total_xp.saturating_sub(curve.xp_for_level(level));
    let needed_for_level = if level >= curve.max_level {
        0
    } else {
        curve.level_threshold(level + 1)
    };

    LevelProgress {
        level,
        earned_in_level,
        needed_for_level,
    }
}

/// Points granted for `xp`: `floor(xp * ratio)`.
pub fn points_from_xp(xp: u64, ratio: f64) -> u64 {
    (xp as f64 * ratio).floor() as u64
}

/// Bonus points for moving from `old_level` to `new_level`.
///
/// Every level crossed contributes `level * per_level_bonus`, so a jump of
/// several levels pays each of them. No bonus when the level did not rise.
pub fn level_up_bonus(old_level: u32, new_level: u32, per_level_bonus: u64) -> u64 {
    if new_level <= old_level {
        return 0;
    }
    (old_level + 1..=new_level)
        .map(|level| u64::from(level).saturating_mul(per_level_bonus))
        .fold(0u64, u64::saturating_add)
}

/// Before/after levels of a single XP change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub old_level: u32,
    pub new_level: u32,
}

impl LevelChange {
    pub fn new(old_level: u32, new_level: u32) -> Self {
        Self {
            old_level,
            new_level,
        }
    }

    pub fn leveled_up(&self) -> bool {
        self.new_level > self.old_level
    }

    /// Levels gained (0 when unchanged or lost).
    pub fn levels_gained(&self) -> u32 {
        self.new_level.saturating_sub(self.old_level)
    }
}
