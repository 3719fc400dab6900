//! Integration tests for concurrent writers on one database file.
//!
//! Each thread opens its own connection, the way separate processes or
//! request handlers would.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use habitquest::ledger::CompletionLedger;
use habitquest::storage::{with_retry, AccountStore, Database, ProgressionRules, RetryPolicy};
use habitquest::EngineError;
use tempfile::TempDir;

const THREADS: usize = 6;

fn policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 10,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(100),
    }
}

#[test]
fn test_concurrent_double_submit_completes_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("habitquest.db");
    let day = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();

    let (user_id, habit_id) = {
        let db = Database::open(&path).unwrap();
        let accounts = AccountStore::new(db.connection());
        let user = accounts.create_user("Ada", 7).unwrap();
        let area = accounts.create_life_area(user.id, "Health").unwrap();
        let habit = accounts.create_habit(user.id, area.id, "Run", 40).unwrap();
        (user.id, habit.id)
    };

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let db = Database::open(&path).unwrap();
                let rules = ProgressionRules::default();
                let ledger = CompletionLedger::new(db.connection(), &rules);
                barrier.wait();
                with_retry(&policy(), || ledger.complete_habit(habit_id, day)).map(|_| ())
            })
        })
        .collect();

    let results: Vec<Result<(), EngineError>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(EngineError::AlreadyCompleted { .. })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, THREADS - 1);

    let db = Database::open(&path).unwrap();
    let user = AccountStore::new(db.connection()).require_user(user_id).unwrap();
    assert_eq!(user.total_xp_earned, 40);
    assert_eq!(user.points, 20);
}

#[test]
fn test_concurrent_distinct_habits_all_apply() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("habitquest.db");
    let day = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();

    let (user_id, habit_ids) = {
        let db = Database::open(&path).unwrap();
        let accounts = AccountStore::new(db.connection());
        let user = accounts.create_user("Ada", 7).unwrap();
        let area = accounts.create_life_area(user.id, "Health").unwrap();
        let habits: Vec<_> = (0..THREADS)
            .map(|i| {
                accounts
                    .create_habit(user.id, area.id, &format!("Habit {i}"), 10)
                    .unwrap()
                    .id
            })
            .collect();
        (user.id, habits)
    };

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = habit_ids
        .into_iter()
        .map(|habit_id| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let db = Database::open(&path).unwrap();
                let rules = ProgressionRules::default();
                let ledger = CompletionLedger::new(db.connection(), &rules);
                barrier.wait();
                with_retry(&policy(), || ledger.complete_habit(habit_id, day)).map(|_| ())
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let db = Database::open(&path).unwrap();
    let rules = ProgressionRules::default();
    let user = AccountStore::new(db.connection()).require_user(user_id).unwrap();
    assert_eq!(user.total_xp_earned, 10 * THREADS as u64);

    let snapshot = CompletionLedger::new(db.connection(), &rules)
        .snapshot(user_id)
        .unwrap();
    assert_eq!(snapshot.current_streak, 1);
}
