//! Unit tests for the streak window

use chrono::NaiveDate;
use habitquest::progression::{streak_bonus_multiplier, StreakError, StreakRules, StreakTracker};

fn window(flags: &str) -> Vec<bool> {
    flags.chars().map(|c| c == 'T').collect()
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

#[test]
fn test_trailing_run_and_break() {
    let mut tracker = StreakTracker::from_parts(window("TTFTTTT"), 0, None, None).unwrap();
    assert_eq!(tracker.current_streak(), 4);

    tracker.update_for_today(false);
    assert_eq!(tracker.last_n_days(), window("TFTTTTF").as_slice());
    assert_eq!(tracker.current_streak(), 0);
    assert_eq!(tracker.longest_streak(), 4);
}

#[test]
fn test_multiplier_example() {
    let rules = StreakRules {
        window_size: 7,
        bonus_per_day: 0.1,
        max_streak_bonus: 2.0,
    };
    assert!((streak_bonus_multiplier(5, &rules) - 1.5).abs() < 1e-9);
    assert!((streak_bonus_multiplier(0, &rules) - 1.0).abs() < 1e-9);
    assert!((streak_bonus_multiplier(50, &rules) - 2.0).abs() < 1e-9);
}

#[test]
fn test_multiplier_does_not_mutate() {
    let tracker = StreakTracker::from_parts(window("FFFFTTT"), 3, None, None).unwrap();
    let before = tracker.clone();
    let _ = tracker.streak_bonus_multiplier(&StreakRules::default());
    assert_eq!(tracker, before);
}

#[test]
fn test_window_length_fixed() {
    let mut tracker = StreakTracker::new(7);
    for i in 0..30 {
        tracker.update_for_today(i % 3 != 0);
        assert_eq!(tracker.last_n_days().len(), 7);
        assert!(tracker.current_streak() as usize <= tracker.window_size());
        assert!(tracker.longest_streak() >= tracker.current_streak());
    }
}

#[test]
fn test_record_day_fills_gap() {
    let mut tracker = StreakTracker::new(7);
    tracker.record_day(date(1), true).unwrap();
    tracker.record_day(date(2), true).unwrap();
    tracker.record_day(date(5), true).unwrap();

    assert_eq!(tracker.last_n_days(), window("FFTTFFT").as_slice());
    assert_eq!(tracker.current_streak(), 1);
    assert_eq!(tracker.longest_streak(), 2);
    assert_eq!(tracker.window_end(), Some(date(5)));
}

#[test]
fn test_record_day_long_gap_clears_window() {
    let mut tracker = StreakTracker::new(7);
    tracker.record_day(date(1), true).unwrap();
    tracker.record_day(date(30), false).unwrap();
    assert!(tracker.last_n_days().iter().all(|&d| !d));
    assert_eq!(tracker.last_completion_date(), Some(date(1)));
}

#[test]
fn test_record_same_day_overwrites() {
    let mut tracker = StreakTracker::new(7);
    tracker.record_day(date(1), true).unwrap();
    tracker.record_day(date(2), true).unwrap();
    tracker.record_day(date(2), false).unwrap();

    assert_eq!(tracker.current_streak(), 0);
    assert_eq!(tracker.last_completion_date(), Some(date(1)));
}

#[test]
fn test_record_day_before_window_rejected() {
    let mut tracker = StreakTracker::new(7);
    tracker.record_day(date(10), true).unwrap();
    let err = tracker.record_day(date(2), true).unwrap_err();
    assert!(matches!(err, StreakError::OutOfOrder { .. }));
    assert_eq!(tracker.current_streak(), 1);
}

#[test]
fn test_record_day_inside_window_bridges_gap() {
    let mut tracker = StreakTracker::new(7);
    tracker.record_day(date(8), true).unwrap();
    tracker.record_day(date(10), true).unwrap();
    tracker.record_day(date(9), true).unwrap();

    assert_eq!(tracker.last_n_days(), window("FFFFTTT").as_slice());
    assert_eq!(tracker.current_streak(), 3);
    assert_eq!(tracker.window_end(), Some(date(10)));
}

#[test]
fn test_perfect_window() {
    let mut tracker = StreakTracker::new(7);
    for d in 1..=7 {
        tracker.record_day(date(d), true).unwrap();
    }
    assert!(tracker.is_perfect_window());
    assert_eq!(tracker.current_streak(), 7);
}
