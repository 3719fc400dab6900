//! Integration tests for the achievement claim lifecycle.

use habitquest::achievements::{AchievementEngine, AchievementState};
use habitquest::storage::{AccountStore, Database, ProgressionRules, SocialStore};
use habitquest::EngineError;

fn setup() -> (Database, ProgressionRules) {
    let db = Database::open_in_memory().unwrap();
    let rules = ProgressionRules::default();
    AchievementEngine::new(db.connection(), &rules)
        .seed_defaults()
        .unwrap();
    (db, rules)
}

#[test]
fn test_statuses_walk_lifecycle() {
    let (db, rules) = setup();
    let accounts = AccountStore::new(db.connection());
    let ada = accounts.create_user("Ada", 7).unwrap();
    let bob = accounts.create_user("Bob", 7).unwrap();
    let engine = AchievementEngine::new(db.connection(), &rules);

    let state_of = |key: &str| {
        engine
            .statuses(ada.id)
            .unwrap()
            .into_iter()
            .find(|s| s.achievement.key == key)
            .unwrap()
    };

    assert_eq!(state_of("first_friend").state, AchievementState::Locked);

    SocialStore::new(db.connection()).befriend(ada.id, bob.id).unwrap();
    let unlocked = engine.check_and_unlock(ada.id).unwrap();
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0].key, "first_friend");

    let status = state_of("first_friend");
    assert_eq!(status.state, AchievementState::Available);
    assert_eq!(status.progress, 1);

    let squad = state_of("squad");
    assert_eq!(squad.state, AchievementState::Locked);
    assert_eq!(squad.progress, 1);

    engine.claim(ada.id, "first_friend").unwrap();
    assert_eq!(state_of("first_friend").state, AchievementState::Claimed);
}

#[test]
fn test_claim_grants_exactly_once() {
    let (db, rules) = setup();
    let accounts = AccountStore::new(db.connection());
    let ada = accounts.create_user("Ada", 7).unwrap();
    let bob = accounts.create_user("Bob", 7).unwrap();
    SocialStore::new(db.connection()).befriend(ada.id, bob.id).unwrap();

    let engine = AchievementEngine::new(db.connection(), &rules);
    engine.check_and_unlock(ada.id).unwrap();

    let outcome = engine.claim(ada.id, "first_friend").unwrap();
    assert_eq!(outcome.reward.totals.total_xp_earned, 20);
    assert_eq!(outcome.reward.totals.points, 10);

    for _ in 0..3 {
        assert!(matches!(
            engine.claim(ada.id, "first_friend"),
            Err(EngineError::AlreadyClaimed(_))
        ));
    }
    let user = accounts.require_user(ada.id).unwrap();
    assert_eq!(user.total_xp_earned, 20);
    assert_eq!(user.points, 10);
}

#[test]
fn test_claim_before_unlock() {
    let (db, rules) = setup();
    let ada = AccountStore::new(db.connection()).create_user("Ada", 7).unwrap();
    let engine = AchievementEngine::new(db.connection(), &rules);

    let err = engine.claim(ada.id, "centurion").unwrap_err();
    assert!(matches!(err, EngineError::NotUnlocked(_)));
    assert!(err.is_conflict());
}

#[test]
fn test_pending_friendship_does_not_count() {
    let (db, rules) = setup();
    let accounts = AccountStore::new(db.connection());
    let ada = accounts.create_user("Ada", 7).unwrap();
    let bob = accounts.create_user("Bob", 7).unwrap();
    SocialStore::new(db.connection())
        .request_friendship(ada.id, bob.id)
        .unwrap();

    let engine = AchievementEngine::new(db.connection(), &rules);
    assert!(engine.check_and_unlock(ada.id).unwrap().is_empty());
}
