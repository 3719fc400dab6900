//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap. Execution lives in `main.rs`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use uuid::Uuid;

/// HabitQuest CLI
#[derive(Parser)]
#[command(name = "habitquest")]
#[command(about = "HabitQuest - habit progression engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Write the default config and create the database
    Init,

    /// Create a user
    AddUser {
        /// Display name
        name: String,
    },

    /// Create a life area for a user
    AddArea {
        user: Uuid,
        name: String,
    },

    /// Create a habit in a life area
    AddHabit {
        user: Uuid,
        area: Uuid,
        name: String,
        /// XP per completion (10-100)
        #[arg(long, default_value_t = 20)]
        xp: u64,
    },

    /// Complete a habit
    Complete {
        habit: Uuid,
        /// Day of the completion (defaults to today, UTC)
        #[arg(long)]
        day: Option<NaiveDate>,
    },

    /// Reverse a habit completion
    Uncomplete {
        habit: Uuid,
        /// Day of the completion (defaults to today, UTC)
        #[arg(long)]
        day: Option<NaiveDate>,
    },

    /// Claim the reward of an unlocked achievement
    Claim {
        user: Uuid,
        key: String,
    },

    /// List achievements with their state and progress
    Achievements {
        user: Uuid,
    },

    /// Show the friends weekly leaderboard
    Leaderboard {
        user: Uuid,
        /// Any day of the week to show (defaults to the current week)
        #[arg(long)]
        week: Option<NaiveDate>,
    },

    /// Show level, points, streak and area progress
    Status {
        user: Uuid,
    },

    /// Adjust XP and points out of band
    Grant {
        user: Uuid,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        xp: i64,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        points: i64,
    },

    /// Make two users friends
    Befriend {
        user: Uuid,
        friend: Uuid,
    },
}
