//! HabitQuest - habit progression engine
//!
//! Main entry point for the command-line tool. Every command prints JSON on
//! stdout; logs go to stderr.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use habitquest::achievements::AchievementEngine;
use habitquest::leaderboard::LeaderboardAggregator;
use habitquest::ledger::CompletionLedger;
use habitquest::storage::config::{get_config_path, load_config, load_config_from, save_config_to};
use habitquest::storage::{with_retry, AccountStore, AppConfig, Database, RetryPolicy, SocialStore};

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!("Starting HabitQuest v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("failed to load config")?;

    if matches!(cli.command, Commands::Init) {
        let path = cli.config.clone().unwrap_or_else(get_config_path);
        if !path.exists() {
            save_config_to(&config, &path).context("failed to write config")?;
            tracing::info!("Wrote default config to {}", path.display());
        }
    }

    let db = Database::open_with_timeout(&config.database_path(), config.storage.busy_timeout())
        .with_context(|| format!("failed to open {}", config.database_path().display()))?;

    run(cli.command, &config, &db)
}

fn run(command: Commands, config: &AppConfig, db: &Database) -> Result<()> {
    let conn = db.connection();
    let rules = &config.progression;
    let policy = RetryPolicy::from_settings(&config.storage);
    let ledger = CompletionLedger::new(conn, rules);
    let achievements = AchievementEngine::new(conn, rules);

    // Definitions are seeded on every run so new built-ins appear after upgrades
    achievements.seed_defaults()?;

    match command {
        Commands::Init => print_json(&serde_json::json!({
            "database": config.database_path(),
        })),
        Commands::AddUser { name } => {
            let user = AccountStore::new(conn).create_user(&name, rules.streak.window_size)?;
            print_json(&user)
        }
        Commands::AddArea { user, name } => {
            let area = AccountStore::new(conn).create_life_area(user, &name)?;
            print_json(&area)
        }
        Commands::AddHabit { user, area, name, xp } => {
            let habit = AccountStore::new(conn).create_habit(user, area, &name, xp)?;
            print_json(&habit)
        }
        Commands::Complete { habit, day } => {
            let day = day.unwrap_or_else(today);
            let outcome = with_retry(&policy, || ledger.complete_habit(habit, day))?;
            print_json(&outcome)
        }
        Commands::Uncomplete { habit, day } => {
            let day = day.unwrap_or_else(today);
            let outcome = with_retry(&policy, || ledger.uncomplete_habit(habit, day))?;
            print_json(&outcome)
        }
        Commands::Claim { user, key } => {
            let outcome = with_retry(&policy, || achievements.claim(user, &key))?;
            print_json(&outcome)
        }
        Commands::Achievements { user } => print_json(&achievements.statuses(user)?),
        Commands::Leaderboard { user, week } => {
            let board = LeaderboardAggregator::new(conn).friends_weekly_leaderboard(user, week)?;
            print_json(&board)
        }
        Commands::Status { user } => print_json(&ledger.snapshot(user)?),
        Commands::Grant { user, xp, points } => {
            let outcome = with_retry(&policy, || ledger.grant(user, xp, points))?;
            print_json(&outcome)
        }
        Commands::Befriend { user, friend } => {
            SocialStore::new(conn).befriend(user, friend)?;
            let unlocked = [user, friend]
                .into_iter()
                .map(|id| achievements.check_and_unlock(id))
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&serde_json::json!({
                "user": user,
                "friend": friend,
                "newly_unlocked": unlocked,
            }))
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
