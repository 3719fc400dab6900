//! Unit tests for level curves and reward math

use habitquest::progression::{
    level_from_xp, level_up_bonus, points_from_xp, progress_within_level, LevelCurve,
};

fn curve(base: u64, multiplier: f64, max_level: u32) -> LevelCurve {
    LevelCurve {
        base_xp_per_level: base,
        multiplier,
        max_level,
    }
}

/// A single 30 XP completion at ratio 0.5 on a 150 XP curve
#[test]
fn test_first_completion_example() {
    let c = curve(150, 1.2, 100);
    assert_eq!(points_from_xp(30, 0.5), 15);
    assert_eq!(level_from_xp(30, &c), 1);
}

#[test]
fn test_default_curve_thresholds() {
    let c = LevelCurve::default();
    assert_eq!(c.level_threshold(2), 150);
    assert_eq!(c.level_threshold(3), 180);
    assert_eq!(c.level_threshold(4), 216);
    assert_eq!(c.xp_for_level(4), 546);

    assert_eq!(level_from_xp(329, &c), 2);
    assert_eq!(level_from_xp(330, &c), 3);
    assert_eq!(level_from_xp(546, &c), 4);
}

#[test]
fn test_level_never_exceeds_cap() {
    let c = curve(1, 1.0, 20);
    for xp in [0, 19, 20, 1_000, u64::MAX] {
        assert!(level_from_xp(xp, &c) <= 20);
    }
    assert_eq!(level_from_xp(u64::MAX, &c), 20);
}

#[test]
fn test_level_is_monotonic() {
    let c = curve(100, 1.5, 30);
    let levels: Vec<u32> = (0..50_000).step_by(97).map(|xp| level_from_xp(xp, &c)).collect();
    assert!(levels.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_level_matches_cumulative_threshold() {
    let c = LevelCurve::default();
    for level in 1..=40 {
        let threshold = c.xp_for_level(level);
        assert_eq!(level_from_xp(threshold, &c), level);
        if threshold > 0 {
            assert_eq!(level_from_xp(threshold - 1, &c), level - 1);
        }
    }
}

#[test]
fn test_progress_fraction() {
    let c = LevelCurve::default();
    let progress = progress_within_level(225, level_from_xp(225, &c), &c);
    assert_eq!(progress.level, 2);
    assert_eq!(progress.earned_in_level, 75);
    assert_eq!(progress.needed_for_level, 180);
    assert!(progress.fraction() > 0.41 && progress.fraction() < 0.42);
}

#[test]
fn test_level_up_bonus_jump() {
    // 3*10 + 4*10
    assert_eq!(level_up_bonus(2, 4, 10), 70);
    assert_eq!(level_up_bonus(2, 2, 10), 0);
    assert_eq!(level_up_bonus(5, 1, 10), 0);
}
