//! Unit tests for weekly ranking

use chrono::NaiveDate;
use habitquest::leaderboard::{rank_entries, week_start, FriendsLeaderboard, RankedEntry};
use uuid::Uuid;

fn entry(id: u128, xp: u64, habits: u64) -> RankedEntry {
    RankedEntry {
        rank: 0,
        user_id: Uuid::from_u128(id),
        display_name: format!("user{id}"),
        weekly_xp_earned: xp,
        weekly_points_earned: xp / 2,
        habits_completed: habits,
        is_current_user: false,
    }
}

#[test]
fn test_week_start_is_monday() {
    let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    for offset in 0..7 {
        let day = monday + chrono::Duration::days(offset);
        assert_eq!(week_start(day), monday);
    }
    let next = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    assert_eq!(week_start(next), next);
}

#[test]
fn test_week_start_across_year() {
    let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    assert_eq!(week_start(day), NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
}

#[test]
fn test_ordering() {
    let ranked = rank_entries(vec![entry(1, 100, 2), entry(2, 300, 5), entry(3, 100, 4)]);
    let ids: Vec<u128> = ranked.iter().map(|e| e.user_id.as_u128()).collect();
    assert_eq!(ids, vec![2, 3, 1]);
    let ranks: Vec<u32> = ranked.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[test]
fn test_dense_rank_for_ties() {
    let ranked = rank_entries(vec![
        entry(4, 50, 1),
        entry(2, 200, 3),
        entry(1, 200, 3),
        entry(3, 0, 0),
    ]);
    let ids: Vec<u128> = ranked.iter().map(|e| e.user_id.as_u128()).collect();
    assert_eq!(ids, vec![1, 2, 4, 3]);
    let ranks: Vec<u32> = ranked.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 1, 2, 3]);
}

#[test]
fn test_top_and_find() {
    let board = FriendsLeaderboard {
        week_start: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        entries: rank_entries(vec![entry(1, 10, 1), entry(2, 20, 1)]),
        user_rank: Some(2),
    };
    assert_eq!(board.top(1).len(), 1);
    assert_eq!(board.top(10).len(), 2);
    assert_eq!(board.find_user(Uuid::from_u128(1)).unwrap().rank, 2);
    assert!(board.find_user(Uuid::from_u128(9)).is_none());
}
