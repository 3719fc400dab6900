//! Achievement definitions.

use rusqlite::{params, Connection};

use super::types::{Achievement, AchievementTier, RequirementKind};
use crate::storage::DatabaseError;

/// Get all built-in achievement definitions
pub fn all_achievements() -> Vec<Achievement> {
    let mut achievements = Vec::new();

    achievements.extend(completion_achievements());
    achievements.extend(streak_achievements());
    achievements.extend(xp_achievements());
    achievements.extend(social_achievements());
    achievements.extend(special_achievements());

    achievements
}

fn completion_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "first_step",
            "First Step",
            "Complete your first habit",
            RequirementKind::TotalCompletions,
            1,
            AchievementTier::Bronze,
        )
        .with_reward(20, 10),
        Achievement::new(
            "habit_builder",
            "Habit Builder",
            "Complete 25 habits",
            RequirementKind::TotalCompletions,
            25,
            AchievementTier::Silver,
        )
        .with_reward(100, 50),
        Achievement::new(
            "centurion",
            "Centurion",
            "Complete 100 habits",
            RequirementKind::TotalCompletions,
            100,
            AchievementTier::Gold,
        )
        .with_reward(300, 150),
    ]
}

// Streak values stay within the default seven-day window
fn streak_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "on_a_roll",
            "On a Roll",
            "Keep a 3 day streak",
            RequirementKind::StreakDays,
            3,
            AchievementTier::Bronze,
        )
        .with_reward(30, 15),
        Achievement::new(
            "week_warrior",
            "Week Warrior",
            "Keep a 7 day streak",
            RequirementKind::StreakDays,
            7,
            AchievementTier::Silver,
        )
        .with_reward(100, 50),
    ]
}

fn xp_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "xp_500",
            "Rising Star",
            "Earn 500 XP",
            RequirementKind::TotalXp,
            500,
            AchievementTier::Bronze,
        )
        .with_reward(50, 25),
        Achievement::new(
            "xp_5000",
            "Seasoned",
            "Earn 5,000 XP",
            RequirementKind::TotalXp,
            5_000,
            AchievementTier::Gold,
        )
        .with_reward(250, 125),
        Achievement::new(
            "level_10",
            "Double Digits",
            "Reach level 10",
            RequirementKind::UserLevel,
            10,
            AchievementTier::Diamond,
        )
        .with_reward(500, 250),
        Achievement::new(
            "area_expert",
            "Area Expert",
            "Reach level 5 in any life area",
            RequirementKind::AreaLevel,
            5,
            AchievementTier::Silver,
        )
        .with_reward(150, 75),
    ]
}

fn social_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "first_friend",
            "Better Together",
            "Add your first friend",
            RequirementKind::FriendCount,
            1,
            AchievementTier::Bronze,
        )
        .with_reward(20, 10),
        Achievement::new(
            "squad",
            "Squad Goals",
            "Have 5 friends",
            RequirementKind::FriendCount,
            5,
            AchievementTier::Silver,
        )
        .with_reward(75, 40),
    ]
}

fn special_achievements() -> Vec<Achievement> {
    vec![Achievement::new(
        "perfect_week",
        "Perfect Week",
        "Complete at least one habit every day for a full week",
        RequirementKind::PerfectWeek,
        1,
        AchievementTier::Gold,
    )
    .with_reward(200, 100)]
}

/// Insert the built-in definitions, leaving existing rows untouched.
pub fn seed_achievements(conn: &Connection) -> Result<usize, DatabaseError> {
    let mut inserted = 0;
    for achievement in all_achievements() {
        inserted += insert_achievement(conn, &achievement)?;
    }
    if inserted > 0 {
        tracing::info!("Seeded {} achievement definitions", inserted);
    }
    Ok(inserted)
}

/// Insert one definition if its key is not taken. Returns rows inserted.
pub fn insert_achievement(conn: &Connection, achievement: &Achievement) -> Result<usize, DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO achievements
         (key, name, description, requirement_type, requirement_value, tier, xp_reward, points_reward)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            achievement.key,
            achievement.name,
            achievement.description,
            achievement.requirement.as_str(),
            achievement.requirement_value,
            achievement.tier.as_str(),
            achievement.xp_reward,
            achievement.points_reward,
        ],
    )
    .map_err(DatabaseError::from)
}
