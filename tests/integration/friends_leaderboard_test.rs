//! Integration tests for the friends weekly leaderboard.

use chrono::{Duration, NaiveDate};
use habitquest::leaderboard::LeaderboardAggregator;
use habitquest::ledger::CompletionLedger;
use habitquest::storage::{AccountStore, Database, ProgressionRules, SocialStore};
use habitquest::EngineError;
use uuid::Uuid;

fn wednesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()
}

fn user_with_habit(db: &Database, name: &str, xp: u64) -> (Uuid, Uuid) {
    let accounts = AccountStore::new(db.connection());
    let user = accounts.create_user(name, 7).unwrap();
    let area = accounts.create_life_area(user.id, "General").unwrap();
    let habit = accounts.create_habit(user.id, area.id, "Daily", xp).unwrap();
    (user.id, habit.id)
}

#[test]
fn test_friends_only_ranking() {
    let db = Database::open_in_memory().unwrap();
    let rules = ProgressionRules::default();
    let ledger = CompletionLedger::new(db.connection(), &rules);
    let social = SocialStore::new(db.connection());

    let (ada, ada_habit) = user_with_habit(&db, "Ada", 30);
    let (bob, bob_habit) = user_with_habit(&db, "Bob", 50);
    let (cy, _) = user_with_habit(&db, "Cy", 10);
    let (stranger, stranger_habit) = user_with_habit(&db, "Stranger", 100);

    social.befriend(ada, bob).unwrap();
    social.befriend(cy, ada).unwrap();

    ledger.complete_habit(ada_habit, wednesday()).unwrap();
    ledger.complete_habit(bob_habit, wednesday()).unwrap();
    ledger.complete_habit(stranger_habit, wednesday()).unwrap();

    let board = LeaderboardAggregator::new(db.connection())
        .friends_weekly_leaderboard(ada, Some(wednesday()))
        .unwrap();

    assert_eq!(board.week_start, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    let order: Vec<Uuid> = board.entries.iter().map(|e| e.user_id).collect();
    assert_eq!(order, vec![bob, ada, cy]);
    assert!(board.find_user(stranger).is_none());
    assert_eq!(board.user_rank, Some(2));

    let cy_entry = board.find_user(cy).unwrap();
    assert_eq!(cy_entry.weekly_xp_earned, 0);
    assert_eq!(cy_entry.rank, 3);
    assert!(board.find_user(ada).unwrap().is_current_user);
}

#[test]
fn test_weeks_are_separate() {
    let db = Database::open_in_memory().unwrap();
    let rules = ProgressionRules::default();
    let ledger = CompletionLedger::new(db.connection(), &rules);
    let (ada, habit) = user_with_habit(&db, "Ada", 40);

    ledger.complete_habit(habit, wednesday()).unwrap();
    ledger
        .complete_habit(habit, wednesday() + Duration::days(7))
        .unwrap();

    let board = LeaderboardAggregator::new(db.connection());
    let this_week = board.friends_weekly_leaderboard(ada, Some(wednesday())).unwrap();
    let next_week = board
        .friends_weekly_leaderboard(ada, Some(wednesday() + Duration::days(5)))
        .unwrap();

    assert_eq!(this_week.entries[0].weekly_xp_earned, 40);
    assert_eq!(next_week.entries[0].weekly_xp_earned, 40);
    assert_eq!(next_week.week_start, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
}

#[test]
fn test_unknown_user() {
    let db = Database::open_in_memory().unwrap();
    let err = LeaderboardAggregator::new(db.connection())
        .friends_weekly_leaderboard(Uuid::new_v4(), None)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}
