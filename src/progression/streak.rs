//! Daily streak tracking over a fixed-size sliding window.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Streak window and multiplier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakRules {
    /// Number of days kept in the window
    pub window_size: usize,
    /// Multiplier added per streak day
    pub bonus_per_day: f64,
    /// Upper bound of the reward multiplier
    pub max_streak_bonus: f64,
}

impl Default for StreakRules {
    fn default() -> Self {
        Self {
            window_size: 7,
            bonus_per_day: 0.1,
            max_streak_bonus: 2.0,
        }
    }
}

impl StreakRules {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.window_size == 0 {
            return Err("window_size must be at least 1");
        }
        if !self.bonus_per_day.is_finite() || self.bonus_per_day < 0.0 {
            return Err("bonus_per_day must be a non-negative number");
        }
        if !self.max_streak_bonus.is_finite() || self.max_streak_bonus < 1.0 {
            return Err("max_streak_bonus must be at least 1.0");
        }
        Ok(())
    }
}

/// Reward multiplier for a streak: `min(1 + streak * bonus_per_day, max)`.
pub fn streak_bonus_multiplier(current_streak: u32, rules: &StreakRules) -> f64 {
    (1.0 + f64::from(current_streak) * rules.bonus_per_day).min(rules.max_streak_bonus)
}

/// Sliding window of daily completion flags, oldest first.
///
/// The window always holds exactly `window_size` flags. `current_streak`
/// counts trailing `true` flags, so it never exceeds the window size, and
/// `longest_streak` only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakTracker {
    last_n_days: Vec<bool>,
    current_streak: u32,
    longest_streak: u32,
    last_completion_date: Option<NaiveDate>,
    /// Calendar day of the newest flag
    window_end: Option<NaiveDate>,
}

impl StreakTracker {
    /// Empty tracker with an all-`false` window.
    pub fn new(window_size: usize) -> Self {
        Self {
            last_n_days: vec![false; window_size.max(1)],
            current_streak: 0,
            longest_streak: 0,
            last_completion_date: None,
            window_end: None,
        }
    }

    /// Rebuild a tracker from persisted state.
    ///
    /// The current streak is re-derived from the window; the stored longest
    /// streak is kept when it is larger.
    pub fn from_parts(
        last_n_days: Vec<bool>,
        longest_streak: u32,
        last_completion_date: Option<NaiveDate>,
        window_end: Option<NaiveDate>,
    ) -> Result<Self, StreakError> {
        if last_n_days.is_empty() {
            return Err(StreakError::EmptyWindow);
        }

        let mut tracker = Self {
            last_n_days,
            current_streak: 0,
            longest_streak,
            last_completion_date,
            window_end,
        };
        tracker.recompute();
        Ok(tracker)
    }

    /// Shift today's flag into the window.
    ///
    /// Drops the oldest flag, appends `completed_today` and recomputes both
    /// streak counters.
    pub fn update_for_today(&mut self, completed_today: bool) {
        self.last_n_days.remove(0);
        self.last_n_days.push(completed_today);
        self.recompute();
    }

    /// Record the flag for a calendar day.
    ///
    /// A day inside the window overwrites its flag in place; a later day
    /// first shifts in a `false` flag for every skipped day. Days older than
    /// the window are rejected.
    pub fn record_day(&mut self, day: NaiveDate, completed: bool) -> Result<(), StreakError> {
        match self.window_end {
            Some(end) if day <= end => {
                let age = usize::try_from((end - day).num_days()).unwrap_or(usize::MAX);
                if age >= self.window_size() {
                    return Err(StreakError::OutOfOrder { day, window_end: end });
                }
                let index = self.window_size() - 1 - age;
                self.last_n_days[index] = completed;
                self.recompute();
            }
            Some(end) => {
                let skipped = (day - end).num_days() - 1;
                let skipped = usize::try_from(skipped).unwrap_or(0).min(self.window_size());
                for _ in 0..skipped {
                    self.update_for_today(false);
                }
                self.update_for_today(completed);
                self.window_end = Some(day);
            }
            None => {
                self.update_for_today(completed);
                self.window_end = Some(day);
            }
        }

        if completed {
            self.last_completion_date = self.last_completion_date.max(Some(day));
        } else if self.last_completion_date == Some(day) {
            self.last_completion_date = self.newest_completed_day();
        }

        Ok(())
    }

    /// Reward multiplier for the current streak.
    pub fn streak_bonus_multiplier(&self, rules: &StreakRules) -> f64 {
        streak_bonus_multiplier(self.current_streak, rules)
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    pub fn last_n_days(&self) -> &[bool] {
        &self.last_n_days
    }

    pub fn last_completion_date(&self) -> Option<NaiveDate> {
        self.last_completion_date
    }

    pub fn window_end(&self) -> Option<NaiveDate> {
        self.window_end
    }

    pub fn window_size(&self) -> usize {
        self.last_n_days.len()
    }

    /// Whether every day in the window is completed.
    pub fn is_perfect_window(&self) -> bool {
        self.last_n_days.iter().all(|&day| day)
    }

    fn recompute(&mut self) {
        let trailing = self
            .last_n_days
            .iter()
            .rev()
            .take_while(|&&completed| completed)
            .count();
        self.current_streak = u32::try_from(trailing).unwrap_or(u32::MAX);
        self.longest_streak = self.longest_streak.max(self.current_streak);
    }

    /// Newest completed day still inside the window.
    fn newest_completed_day(&self) -> Option<NaiveDate> {
        let end = self.window_end?;
        let age = self.last_n_days.iter().rev().position(|&completed| completed)?;
        let age = i64::try_from(age).ok()?;
        end.checked_sub_signed(Duration::days(age))
    }
}

/// Encode a window as a compact `1`/`0` string for storage.
pub fn encode_window(days: &[bool]) -> String {
    days.iter().map(|&day| if day { '1' } else { '0' }).collect()
}

/// Decode a window stored by [`encode_window`].
pub fn decode_window(encoded: &str) -> Result<Vec<bool>, StreakError> {
    encoded
        .chars()
        .map(|c| match c {
            '1' => Ok(true),
            '0' => Ok(false),
            other => Err(StreakError::InvalidWindow(other)),
        })
        .collect()
}

/// Streak errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreakError {
    #[error("Day {day} is older than the window ending {window_end}")]
    OutOfOrder {
        day: NaiveDate,
        window_end: NaiveDate,
    },

    #[error("Streak window must not be empty")]
    EmptyWindow,

    #[error("Invalid window flag: {0:?}")]
    InvalidWindow(char),
}
