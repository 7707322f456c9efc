//! Construction helpers producing the initial aggregate for a new user.
//!
//! Everything here is deterministic apart from generated task ids, so the
//! default aggregate is stable enough to assert against in tests.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::types::{
    Achievement, AchievementKind, SkillProgress, StudyGroup, Task, TaskKind, User, UserData,
    UserStats, WeeklyGoal, POINTS_PER_LEVEL,
};

const DAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn default_stats() -> UserStats {
    UserStats {
        streak: 0,
        longest_streak: 0,
        total_points: 0,
        level: 1,
        points_to_next_level: POINTS_PER_LEVEL,
        total_study_hours: 0.0,
        tasks_completed: 0,
        mock_tests_taken: 0,
        days_to_exam: 30,
        target_band: 8.0,
        current_band: 6.0,
        last_study_date: None,
    }
}

/// The starter set: one task per skill, dated `today`.
pub fn default_tasks(today: NaiveDate) -> Vec<Task> {
    let specs = [
        (TaskKind::Listening, "Listening Practice: Academic Lecture", 15, 20),
        (TaskKind::Reading, "Reading Passage: Science Article", 20, 25),
        (TaskKind::Writing, "Vocabulary Builder: 10 New Words", 10, 15),
        (TaskKind::Speaking, "Speaking Exercise: Describe a Photo", 12, 20),
    ];

    specs
        .into_iter()
        .map(|(kind, title, duration_minutes, points)| Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            kind,
            duration_minutes,
            points,
            completed: false,
            completed_at: None,
            date: today,
            description: None,
            category: None,
            due_date: None,
            difficulty: None,
        })
        .collect()
}

/// The fixed achievement catalogue. The `kind` field is the static table the
/// unlock pass reads to decide which stat each entry tracks.
pub fn default_achievements() -> Vec<Achievement> {
    let specs = [
        (
            "week_warrior",
            "Week Warrior",
            "Study 7 days in a row",
            AchievementKind::StreakDays,
            0,
            7,
            100,
        ),
        (
            "task_master",
            "Task Master",
            "Complete 50 tasks",
            AchievementKind::TasksCompleted,
            0,
            50,
            200,
        ),
        (
            "perfect_score",
            "Perfect Score",
            "Get 8.0+ in mock test",
            AchievementKind::MockTestBand,
            6,
            8,
            500,
        ),
        (
            "early_bird",
            "Early Bird",
            "Study before 8 AM",
            AchievementKind::EarlyBird,
            0,
            5,
            50,
        ),
        (
            "first_steps",
            "First Steps",
            "Complete your first task",
            AchievementKind::FirstTask,
            0,
            1,
            10,
        ),
    ];

    specs
        .into_iter()
        .map(
            |(id, title, description, kind, progress, total, points_reward)| Achievement {
                id: id.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                kind,
                unlocked: false,
                unlocked_at: None,
                progress,
                total,
                points_reward,
            },
        )
        .collect()
}

/// Seven entries covering the calendar week (Sunday-based) containing `today`.
pub fn default_weekly_goals(today: NaiveDate) -> Vec<WeeklyGoal> {
    let sunday = today - Duration::days(today.weekday().num_days_from_sunday() as i64);

    (0..7)
        .map(|offset| WeeklyGoal {
            day: DAY_LABELS[offset as usize].to_string(),
            date: sunday + Duration::days(offset),
            tasks: 0,
            completed: false,
        })
        .collect()
}

pub fn default_skill_progress() -> Vec<SkillProgress> {
    vec![
        SkillProgress::from_score(TaskKind::Listening, 6.0),
        SkillProgress::from_score(TaskKind::Reading, 6.0),
        SkillProgress::from_score(TaskKind::Writing, 5.5),
        SkillProgress::from_score(TaskKind::Speaking, 6.0),
    ]
}

pub fn default_study_groups() -> Vec<StudyGroup> {
    let specs = [
        ("ielts-8-achievers", "IELTS 8.0 Achievers", 234, true),
        ("speaking-practice-circle", "Speaking Practice Circle", 156, false),
        ("writing-feedback-group", "Writing Feedback Group", 89, true),
        ("daily-vocabulary-challenge", "Daily Vocabulary Challenge", 412, true),
    ];

    specs
        .into_iter()
        .map(|(id, name, members, active)| StudyGroup {
            id: id.to_string(),
            name: name.to_string(),
            members,
            active,
            joined: false,
        })
        .collect()
}

/// Avatar glyph from a display name: first letters of the first two words,
/// uppercased.
pub fn avatar_from_name(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(|c| c.to_uppercase())
        .collect()
}

impl UserData {
    /// The complete initial aggregate for a freshly registered user.
    pub fn new_for_user(user: User, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        Self {
            user,
            stats: default_stats(),
            tasks: default_tasks(today),
            achievements: default_achievements(),
            weekly_goals: default_weekly_goals(today),
            skill_progress: default_skill_progress(),
            study_groups: default_study_groups(),
            notifications: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_tasks_cover_all_skills() {
        let today = date(2024, 1, 15);
        let tasks = default_tasks(today);

        assert_eq!(tasks.len(), 4);
        for kind in TaskKind::ALL {
            assert!(tasks.iter().any(|t| t.kind == kind));
        }
        for task in &tasks {
            assert!(!task.completed);
            assert!(task.completed_at.is_none());
            assert_eq!(task.date, today);
            assert!(task.points > 0);
            assert!(task.duration_minutes > 0);
        }
    }

    #[test]
    fn test_default_achievements_catalogue() {
        let achievements = default_achievements();

        assert_eq!(achievements.len(), 5);
        assert!(achievements.iter().all(|a| !a.unlocked));
        assert!(achievements.iter().all(|a| a.unlocked_at.is_none()));

        let first_steps = achievements
            .iter()
            .find(|a| a.id == "first_steps")
            .unwrap();
        assert_eq!(first_steps.kind, AchievementKind::FirstTask);
        assert_eq!(first_steps.total, 1);
        assert_eq!(first_steps.points_reward, 10);

        let week_warrior = achievements
            .iter()
            .find(|a| a.id == "week_warrior")
            .unwrap();
        assert_eq!(week_warrior.kind, AchievementKind::StreakDays);
        assert_eq!(week_warrior.total, 7);
    }

    #[test]
    fn test_default_weekly_goals_cover_current_week() {
        // 2024-01-17 is a Wednesday.
        let today = date(2024, 1, 17);
        let goals = default_weekly_goals(today);

        assert_eq!(goals.len(), 7);
        assert_eq!(goals[0].day, "Sun");
        assert_eq!(goals[0].date, date(2024, 1, 14));
        assert_eq!(goals[0].date.weekday(), Weekday::Sun);
        assert_eq!(goals[6].date, date(2024, 1, 20));
        assert!(goals.iter().any(|g| g.date == today));
        assert!(goals.iter().all(|g| g.tasks == 0 && !g.completed));
    }

    #[test]
    fn test_default_weekly_goals_on_sunday() {
        // A Sunday starts its own week.
        let sunday = date(2024, 1, 14);
        let goals = default_weekly_goals(sunday);
        assert_eq!(goals[0].date, sunday);
    }

    #[test]
    fn test_avatar_from_name() {
        assert_eq!(avatar_from_name("Demo User"), "DU");
        assert_eq!(avatar_from_name("priya"), "P");
        assert_eq!(avatar_from_name("Anna Maria Schmidt"), "AM");
        assert_eq!(avatar_from_name(""), "");
    }

    #[test]
    fn test_new_for_user_aggregate() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Demo User".to_string(),
            email: "demo@example.com".to_string(),
            avatar: "DU".to_string(),
            created_at: now,
            last_login: now,
        };

        let data = UserData::new_for_user(user.clone(), now);

        assert_eq!(data.user.id, user.id);
        assert_eq!(data.stats, default_stats());
        assert_eq!(data.stats.level, 1);
        assert_eq!(data.stats.points_to_next_level, POINTS_PER_LEVEL);
        assert_eq!(data.tasks.len(), 4);
        assert_eq!(data.achievements.len(), 5);
        assert_eq!(data.weekly_goals.len(), 7);
        assert_eq!(data.skill_progress.len(), 4);
        assert_eq!(data.study_groups.len(), 4);
        assert!(data.notifications.is_empty());
    }
}
