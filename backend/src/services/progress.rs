//! The progress engine: pure `(state, event) -> state` transitions over the
//! per-user aggregate. No clock, RNG or I/O access: callers pass `now` and a
//! random source in, which keeps every transition replayable in tests.
//!
//! On any error the aggregate is left untouched.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use shared::defaults;
use shared::{
    CreateTaskRequest, Notification, NotificationKind, Task, TaskKind, UncompleteBehavior,
    UserData, UserStats, ValidationError, DAILY_GOAL_TASKS, MAX_NOTIFICATIONS, POINTS_PER_LEVEL,
};

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Task not found")]
    TaskNotFound,
    #[error("Study group not found")]
    GroupNotFound,
    #[error("Notification not found")]
    NotificationNotFound,
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

/// Result descriptor for a toggle, used for UI feedback.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub completed: bool,
    pub points_delta: i64,
    /// Titles of achievements unlocked by this completion.
    pub unlocked: Vec<String>,
}

/// Flip a task between completed and uncompleted, recomputing all derived
/// state. Completion advances points, counters, hours, streak, the daily
/// tally and the achievement pass; un-completion reverses only the
/// point/counter/hour deltas (clamped at zero) plus whatever `behavior`
/// allows.
pub fn toggle_task(
    data: &mut UserData,
    task_id: &Uuid,
    now: DateTime<Utc>,
    behavior: UncompleteBehavior,
) -> Result<ToggleOutcome, ProgressError> {
    let today = now.date_naive();

    let task = data
        .tasks
        .iter_mut()
        .find(|t| t.id == *task_id)
        .ok_or(ProgressError::TaskNotFound)?;

    task.completed = !task.completed;
    task.completed_at = task.completed.then_some(now);

    let completed = task.completed;
    let points = task.points;
    let hours = f64::from(task.duration_minutes) / 60.0;

    if completed {
        data.stats.total_points += points;
        data.stats.tasks_completed += 1;
        data.stats.total_study_hours += hours;

        advance_streak(&mut data.stats, today);
        tally_weekly_goal(data, today, 1);
        apply_level(&mut data.stats);

        let unlocked = run_achievement_pass(data, now);
        if !unlocked.is_empty() {
            // Unlock bonuses were credited during the pass.
            apply_level(&mut data.stats);
        }

        Ok(ToggleOutcome {
            completed: true,
            points_delta: points,
            unlocked,
        })
    } else {
        data.stats.total_points = (data.stats.total_points - points).max(0);
        data.stats.tasks_completed = (data.stats.tasks_completed - 1).max(0);
        data.stats.total_study_hours = (data.stats.total_study_hours - hours).max(0.0);

        if behavior == UncompleteBehavior::RollbackDailyTally {
            tally_weekly_goal(data, today, -1);
        }
        // Streak, last_study_date, longest_streak and achievement unlocks are
        // one-way and stay at their post-completion values.

        apply_level(&mut data.stats);

        Ok(ToggleOutcome {
            completed: false,
            points_delta: -points,
            unlocked: Vec::new(),
        })
    }
}

/// Append a new task from a validated spec. No stat side effects.
pub fn create_task(
    data: &mut UserData,
    request: &CreateTaskRequest,
    now: DateTime<Utc>,
) -> Result<Task, ProgressError> {
    request.validate()?;

    let task = Task {
        id: Uuid::new_v4(),
        title: request.title.trim().to_string(),
        kind: request.kind,
        duration_minutes: request.duration_minutes,
        points: request.points,
        completed: false,
        completed_at: None,
        date: request.date.unwrap_or_else(|| now.date_naive()),
        description: request.description.clone(),
        category: request.category.clone(),
        due_date: request.due_date,
        difficulty: request.difficulty,
    };

    data.tasks.push(task.clone());
    Ok(task)
}

/// Remove a task by id. Deletion is not un-completion: a completed task's
/// stat contribution stays.
pub fn delete_task(data: &mut UserData, task_id: &Uuid) -> Result<(), ProgressError> {
    let before = data.tasks.len();
    data.tasks.retain(|t| t.id != *task_id);

    if data.tasks.len() == before {
        return Err(ProgressError::TaskNotFound);
    }
    Ok(())
}

const TITLE_POOLS: [(TaskKind, [&str; 4]); 4] = [
    (
        TaskKind::Listening,
        [
            "Academic Lecture",
            "Conversation Practice",
            "News Report",
            "Podcast Analysis",
        ],
    ),
    (
        TaskKind::Reading,
        [
            "Science Article",
            "Academic Passage",
            "News Editorial",
            "Research Summary",
        ],
    ),
    (
        TaskKind::Writing,
        [
            "Essay Practice",
            "Letter Writing",
            "Report Writing",
            "Vocabulary Builder",
        ],
    ),
    (
        TaskKind::Speaking,
        [
            "Describe a Photo",
            "Part 2 Cue Card",
            "Part 3 Discussion",
            "Pronunciation Drill",
        ],
    ),
];

/// Replace the task list with a fresh daily set: one task per skill, dated
/// `today`, titles/durations/points drawn from the injected random source.
/// Stats are untouched.
pub fn generate_daily_tasks<R: Rng>(data: &mut UserData, rng: &mut R, today: NaiveDate) {
    data.tasks = TITLE_POOLS
        .iter()
        .map(|(kind, pool)| {
            let topic = pool.choose(rng).copied().unwrap_or(pool[0]);
            Task {
                id: Uuid::new_v4(),
                title: format!("{}: {}", kind.label(), topic),
                kind: *kind,
                duration_minutes: rng.gen_range(10..=24),
                points: rng.gen_range(15..=29),
                completed: false,
                completed_at: None,
                date: today,
                description: None,
                category: None,
                due_date: None,
                difficulty: None,
            }
        })
        .collect();
}

/// Flip study-group membership, adjusting the member count. Returns the new
/// joined flag.
pub fn toggle_study_group(data: &mut UserData, group_id: &str) -> Result<bool, ProgressError> {
    let group = data
        .study_groups
        .iter_mut()
        .find(|g| g.id == group_id)
        .ok_or(ProgressError::GroupNotFound)?;

    group.joined = !group.joined;
    group.members += if group.joined { 1 } else { -1 };
    Ok(group.joined)
}

pub fn mark_notification_read(
    data: &mut UserData,
    notification_id: &Uuid,
) -> Result<(), ProgressError> {
    let notification = data
        .notifications
        .iter_mut()
        .find(|n| n.id == *notification_id)
        .ok_or(ProgressError::NotificationNotFound)?;

    notification.read = true;
    Ok(())
}

/// Prepend a notification, keeping at most `MAX_NOTIFICATIONS` entries.
pub fn add_notification(
    data: &mut UserData,
    title: &str,
    message: &str,
    kind: NotificationKind,
    now: DateTime<Utc>,
) -> Uuid {
    let notification = Notification {
        id: Uuid::new_v4(),
        title: title.to_string(),
        message: message.to_string(),
        kind,
        read: false,
        created_at: now,
    };
    let id = notification.id;

    data.notifications.insert(0, notification);
    data.notifications.truncate(MAX_NOTIFICATIONS);
    id
}

/// Re-derive `level` and `points_to_next_level` from `total_points`.
pub fn apply_level(stats: &mut UserStats) {
    stats.level = (stats.total_points / POINTS_PER_LEVEL) as i32 + 1;
    stats.points_to_next_level = i64::from(stats.level) * POINTS_PER_LEVEL - stats.total_points;
}

/// Calendar-day streak continuity. Only the first completion of a new day
/// moves the streak: same-day repeats are no-ops, a one-day step increments,
/// anything else restarts at 1.
fn advance_streak(stats: &mut UserStats, today: NaiveDate) {
    match stats.last_study_date {
        Some(last) if last == today => return,
        Some(last) if last + Duration::days(1) == today => stats.streak += 1,
        _ => stats.streak = 1,
    }

    stats.last_study_date = Some(today);
    stats.longest_streak = stats.longest_streak.max(stats.streak);
}

/// Adjust today's weekly-goal tally. If the stored week no longer contains
/// `today` (the aggregate survived into a new week), the week is rebuilt
/// before a positive tally; a negative tally against a stale week is dropped.
fn tally_weekly_goal(data: &mut UserData, today: NaiveDate, delta: i32) {
    if !data.weekly_goals.iter().any(|g| g.date == today) {
        if delta <= 0 {
            return;
        }
        data.weekly_goals = defaults::default_weekly_goals(today);
    }

    if let Some(goal) = data.weekly_goals.iter_mut().find(|g| g.date == today) {
        goal.tasks = (goal.tasks + delta).max(0);
        goal.completed = goal.tasks >= DAILY_GOAL_TASKS;
    }
}

/// Recompute progress for every locked achievement from the stat its kind
/// tracks, unlocking and crediting the reward for any that reach their
/// target. Unlocks are one-way; rewards are credited exactly once. Returns
/// the unlocked titles and appends a notification per unlock.
fn run_achievement_pass(data: &mut UserData, now: DateTime<Utc>) -> Vec<String> {
    let streak = i64::from(data.stats.streak);
    let tasks_completed = i64::from(data.stats.tasks_completed);

    let mut bonus = 0;
    let mut unlocked = Vec::new();

    for achievement in &mut data.achievements {
        if achievement.unlocked {
            continue;
        }

        match achievement.kind {
            shared::AchievementKind::StreakDays => achievement.progress = streak,
            shared::AchievementKind::TasksCompleted => achievement.progress = tasks_completed,
            shared::AchievementKind::FirstTask => achievement.progress = tasks_completed.min(1),
            // Not driven by task completion.
            shared::AchievementKind::MockTestBand | shared::AchievementKind::EarlyBird => continue,
        }

        if achievement.progress >= achievement.total {
            achievement.unlocked = true;
            achievement.unlocked_at = Some(now);
            bonus += achievement.points_reward;
            unlocked.push(achievement.title.clone());
        }
    }

    data.stats.total_points += bonus;

    for title in &unlocked {
        add_notification(
            data,
            "Achievement Unlocked!",
            &format!("You've earned \"{}\"!", title),
            NotificationKind::Success,
            now,
        );
    }

    unlocked
}
