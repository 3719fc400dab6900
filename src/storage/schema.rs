//! Database schema definitions for HabitQuest.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    total_xp_earned INTEGER NOT NULL DEFAULT 0 CHECK (total_xp_earned >= 0),
    points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
    level INTEGER NOT NULL DEFAULT 1 CHECK (level >= 1),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Life areas table
CREATE TABLE IF NOT EXISTS life_areas (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    name TEXT NOT NULL,
    total_xp INTEGER NOT NULL DEFAULT 0 CHECK (total_xp >= 0),
    level INTEGER NOT NULL DEFAULT 1 CHECK (level >= 1),
    enabled INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_life_areas_user_id ON life_areas(user_id);

-- Habits table
CREATE TABLE IF NOT EXISTS habits (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    life_area_id TEXT NOT NULL REFERENCES life_areas(id),
    name TEXT NOT NULL,
    xp INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_habits_user_id ON habits(user_id);

-- Habit completions ledger (append-only, one row per habit per day)
CREATE TABLE IF NOT EXISTS habit_completions (
    id TEXT PRIMARY KEY,
    habit_id TEXT NOT NULL REFERENCES habits(id),
    user_id TEXT NOT NULL REFERENCES users(id),
    life_area_id TEXT NOT NULL REFERENCES life_areas(id),
    completed_on TEXT NOT NULL,
    xp_earned INTEGER NOT NULL,
    points_earned INTEGER NOT NULL,
    bonus_points INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    UNIQUE(habit_id, completed_on)
);

CREATE INDEX IF NOT EXISTS idx_completions_user_day ON habit_completions(user_id, completed_on);

-- Streaks table
CREATE TABLE IF NOT EXISTS streaks (
    user_id TEXT PRIMARY KEY REFERENCES users(id),
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0,
    last_n_days TEXT NOT NULL,
    last_completion_date TEXT,
    window_end TEXT,
    updated_at TEXT NOT NULL
);

-- Achievement catalogue
CREATE TABLE IF NOT EXISTS achievements (
    key TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    requirement_type TEXT NOT NULL,
    requirement_value INTEGER NOT NULL,
    tier TEXT NOT NULL,
    xp_reward INTEGER NOT NULL DEFAULT 0,
    points_reward INTEGER NOT NULL DEFAULT 0
);

-- Per-user achievement unlocks and claims
CREATE TABLE IF NOT EXISTS user_achievements (
    user_id TEXT NOT NULL REFERENCES users(id),
    achievement_key TEXT NOT NULL REFERENCES achievements(key),
    progress INTEGER NOT NULL,
    unlocked_at TEXT NOT NULL,
    claimed_at TEXT,
    PRIMARY KEY (user_id, achievement_key)
);

-- Weekly leaderboard aggregates
CREATE TABLE IF NOT EXISTS weekly_leaderboard (
    user_id TEXT NOT NULL REFERENCES users(id),
    week_start TEXT NOT NULL,
    weekly_xp_earned INTEGER NOT NULL DEFAULT 0,
    weekly_points_earned INTEGER NOT NULL DEFAULT 0,
    habits_completed INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (user_id, week_start)
);

CREATE INDEX IF NOT EXISTS idx_weekly_leaderboard_week ON weekly_leaderboard(week_start);

-- Friendships (managed by the social graph, read here for scoping)
CREATE TABLE IF NOT EXISTS friendships (
    user_id TEXT NOT NULL REFERENCES users(id),
    friend_id TEXT NOT NULL REFERENCES users(id),
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, friend_id),
    CHECK (user_id <> friend_id)
);
"#;

/// SQL for the schema version table.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;
