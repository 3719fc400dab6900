//! Integration tests for the completion ledger against a file-backed store.
//!
//! Tests complete/uncomplete flows end to end: totals, levels, streaks,
//! weekly rows and achievement unlocks.

use chrono::{Duration, NaiveDate};
use habitquest::achievements::AchievementEngine;
use habitquest::leaderboard::LeaderboardAggregator;
use habitquest::ledger::CompletionLedger;
use habitquest::storage::{AccountStore, Database, ProgressionRules};
use habitquest::EngineError;
use tempfile::TempDir;
use uuid::Uuid;

struct Setup {
    _dir: TempDir,
    db: Database,
    rules: ProgressionRules,
    user_id: Uuid,
    area_id: Uuid,
}

fn setup() -> Setup {
    let dir = TempDir::new().unwrap();
    let db = Database::open(&dir.path().join("habitquest.db")).unwrap();
    let rules = ProgressionRules::default();

    let accounts = AccountStore::new(db.connection());
    let user = accounts.create_user("Grace", rules.streak.window_size).unwrap();
    let area = accounts.create_life_area(user.id, "Fitness").unwrap();

    AchievementEngine::new(db.connection(), &rules)
        .seed_defaults()
        .unwrap();

    Setup {
        _dir: dir,
        db,
        rules,
        user_id: user.id,
        area_id: area.id,
    }
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

#[test]
fn test_first_completion_worked_example() {
    let s = setup();
    let habit = AccountStore::new(s.db.connection())
        .create_habit(s.user_id, s.area_id, "Push-ups", 30)
        .unwrap();
    let ledger = CompletionLedger::new(s.db.connection(), &s.rules);

    let outcome = ledger.complete_habit(habit.id, monday()).unwrap();
    assert_eq!(outcome.xp_earned, 30);
    assert_eq!(outcome.points_earned, 15);
    assert_eq!(outcome.totals.total_xp_earned, 30);
    assert_eq!(outcome.totals.points, 15);
    assert_eq!(outcome.totals.level, 1);
    assert_eq!(outcome.current_streak, 1);
    assert!(outcome.newly_unlocked.iter().any(|a| a.key == "first_step"));
}

#[test]
fn test_completion_then_reversal_restores_totals() {
    let s = setup();
    let accounts = AccountStore::new(s.db.connection());
    let ledger = CompletionLedger::new(s.db.connection(), &s.rules);
    let habits: Vec<Uuid> = (0..3)
        .map(|i| {
            accounts
                .create_habit(s.user_id, s.area_id, &format!("Habit {i}"), 90)
                .unwrap()
                .id
        })
        .collect();

    let before = accounts.require_user(s.user_id).unwrap();
    for habit in &habits {
        ledger.complete_habit(*habit, monday()).unwrap();
    }
    let peak = accounts.require_user(s.user_id).unwrap();
    assert_eq!(peak.total_xp_earned, 270);
    assert_eq!(peak.level, 2);

    // Edit the XP of a completed habit; reversal must still subtract 90
    accounts.set_habit_xp(habits[1], 10).unwrap();

    for habit in habits.iter().rev() {
        ledger.uncomplete_habit(*habit, monday()).unwrap();
    }
    let after = accounts.require_user(s.user_id).unwrap();
    assert_eq!(after.total_xp_earned, before.total_xp_earned);
    assert_eq!(after.points, before.points);
    assert_eq!(after.level, 1);
}

#[test]
fn test_claims_survive_reversal() {
    let s = setup();
    let habit = AccountStore::new(s.db.connection())
        .create_habit(s.user_id, s.area_id, "Stretch", 20)
        .unwrap();
    let ledger = CompletionLedger::new(s.db.connection(), &s.rules);
    let engine = AchievementEngine::new(s.db.connection(), &s.rules);

    ledger.complete_habit(habit.id, monday()).unwrap();
    engine.claim(s.user_id, "first_step").unwrap();

    ledger.uncomplete_habit(habit.id, monday()).unwrap();
    let record = engine
        .get_user_achievement(s.user_id, "first_step")
        .unwrap()
        .unwrap();
    assert!(record.claimed_at.is_some());

    // Completing again does not re-unlock or re-grant
    let outcome = ledger.complete_habit(habit.id, monday()).unwrap();
    assert!(outcome.newly_unlocked.iter().all(|a| a.key != "first_step"));
    assert!(matches!(
        engine.claim(s.user_id, "first_step"),
        Err(EngineError::AlreadyClaimed(_))
    ));
}

#[test]
fn test_week_of_completions_unlocks_streak_achievements() {
    let s = setup();
    let habit = AccountStore::new(s.db.connection())
        .create_habit(s.user_id, s.area_id, "Meditate", 10)
        .unwrap();
    let ledger = CompletionLedger::new(s.db.connection(), &s.rules);

    let mut unlocked = Vec::new();
    for offset in 0..7 {
        let outcome = ledger
            .complete_habit(habit.id, monday() + Duration::days(offset))
            .unwrap();
        unlocked.extend(outcome.newly_unlocked.into_iter().map(|a| a.key));
    }

    assert!(unlocked.contains(&"on_a_roll".to_string()));
    assert!(unlocked.contains(&"week_warrior".to_string()));
    assert!(unlocked.contains(&"perfect_week".to_string()));

    let snapshot = ledger.snapshot(s.user_id).unwrap();
    assert_eq!(snapshot.current_streak, 7);
    assert!((snapshot.streak_multiplier - 1.7).abs() < 1e-9);

    let entry = LeaderboardAggregator::new(s.db.connection())
        .get_entry(s.user_id, monday())
        .unwrap()
        .unwrap();
    assert_eq!(entry.habits_completed, 7);
    assert_eq!(entry.weekly_xp_earned, 70);
}

#[test]
fn test_disabled_area_ignored_for_area_achievements() {
    let s = setup();
    let accounts = AccountStore::new(s.db.connection());
    let habit = accounts
        .create_habit(s.user_id, s.area_id, "Swim", 100)
        .unwrap();
    let ledger = CompletionLedger::new(s.db.connection(), &s.rules);

    for offset in 0..2 {
        ledger
            .complete_habit(habit.id, monday() + Duration::days(offset))
            .unwrap();
    }
    let engine = AchievementEngine::new(s.db.connection(), &s.rules);
    assert!(engine.aggregate_stats(s.user_id).unwrap().max_area_level >= 2);

    accounts.set_life_area_enabled(s.area_id, false).unwrap();
    assert_eq!(engine.aggregate_stats(s.user_id).unwrap().max_area_level, 0);
}

#[test]
fn test_reversed_earlier_day_breaks_streak() {
    let s = setup();
    let habit = AccountStore::new(s.db.connection())
        .create_habit(s.user_id, s.area_id, "Journal", 10)
        .unwrap();
    let ledger = CompletionLedger::new(s.db.connection(), &s.rules);

    ledger.complete_habit(habit.id, monday()).unwrap();
    ledger
        .complete_habit(habit.id, monday() + Duration::days(1))
        .unwrap();
    let outcome = ledger.uncomplete_habit(habit.id, monday()).unwrap();
    assert_eq!(outcome.current_streak, 1);

    let outcome = ledger
        .complete_habit(habit.id, monday() + Duration::days(2))
        .unwrap();
    assert_eq!(outcome.current_streak, 2);
    assert!(outcome.newly_unlocked.iter().all(|a| a.key != "on_a_roll"));

    // Backfilling the cleared day restores the run
    let outcome = ledger.complete_habit(habit.id, monday()).unwrap();
    assert_eq!(outcome.current_streak, 3);
    assert!(outcome.newly_unlocked.iter().any(|a| a.key == "on_a_roll"));
}
