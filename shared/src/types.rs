use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Points needed to advance one level. `level` is always derived as
/// `total_points / POINTS_PER_LEVEL + 1`.
pub const POINTS_PER_LEVEL: i64 = 1000;

/// Completions per day needed to mark a weekly-goal entry as done.
pub const DAILY_GOAL_TASKS: i32 = 3;

/// Maximum notifications retained per user, newest first.
pub const MAX_NOTIFICATIONS: usize = 20;

// ============================================================================
// User Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Short avatar glyph shown in place of a picture, e.g. initials "JD".
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

// ============================================================================
// Stats
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    /// Consecutive calendar days with at least one completion.
    pub streak: i32,
    /// Historical maximum of `streak`. Never decreases.
    pub longest_streak: i32,
    pub total_points: i64,
    /// Derived: `total_points / POINTS_PER_LEVEL + 1`.
    pub level: i32,
    /// Derived: `level * POINTS_PER_LEVEL - total_points`.
    pub points_to_next_level: i64,
    pub total_study_hours: f64,
    pub tasks_completed: i32,
    pub mock_tests_taken: i32,
    pub days_to_exam: i32,
    pub target_band: f64,
    pub current_band: f64,
    /// Date of the most recent completion that advanced the streak.
    pub last_study_date: Option<NaiveDate>,
}

// ============================================================================
// Task Types
// ============================================================================

/// The four IELTS skill areas. Doubles as the task category and the
/// per-skill proficiency axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Listening,
    Reading,
    Writing,
    Speaking,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [
        TaskKind::Listening,
        TaskKind::Reading,
        TaskKind::Writing,
        TaskKind::Speaking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Listening => "listening",
            TaskKind::Reading => "reading",
            TaskKind::Writing => "writing",
            TaskKind::Speaking => "speaking",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Listening => "Listening",
            TaskKind::Reading => "Reading",
            TaskKind::Writing => "Writing",
            TaskKind::Speaking => "Speaking",
        }
    }
}

impl FromStr for TaskKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "listening" => Ok(TaskKind::Listening),
            "reading" => Ok(TaskKind::Reading),
            "writing" => Ok(TaskKind::Writing),
            "speaking" => Ok(TaskKind::Speaking),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub kind: TaskKind,
    pub duration_minutes: i32,
    pub points: i64,
    pub completed: bool,
    /// Set iff `completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// The day the task was assigned.
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub kind: TaskKind,
    pub duration_minutes: i32,
    pub points: i64,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub difficulty: Option<Difficulty>,
}

impl CreateTaskRequest {
    /// Reject malformed specs before any state is touched.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.duration_minutes <= 0 {
            return Err(ValidationError::NonPositiveDuration);
        }
        if self.points <= 0 {
            return Err(ValidationError::NonPositivePoints);
        }
        Ok(())
    }
}

// ============================================================================
// Achievement Types
// ============================================================================

/// Which stat an achievement tracks. This is the static id -> stat table;
/// unlock checks never infer the tracked stat from description text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    /// Tracks `stats.streak`.
    StreakDays,
    /// Tracks `stats.tasks_completed`.
    TasksCompleted,
    /// Unlocks on the first completed task.
    FirstTask,
    /// Tracks mock-test band scores; not driven by task completion.
    MockTestBand,
    /// Tracks early-morning sessions; not driven by task completion.
    EarlyBird,
}

impl AchievementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementKind::StreakDays => "streak_days",
            AchievementKind::TasksCompleted => "tasks_completed",
            AchievementKind::FirstTask => "first_task",
            AchievementKind::MockTestBand => "mock_test_band",
            AchievementKind::EarlyBird => "early_bird",
        }
    }
}

impl FromStr for AchievementKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "streak_days" => Ok(AchievementKind::StreakDays),
            "tasks_completed" => Ok(AchievementKind::TasksCompleted),
            "first_task" => Ok(AchievementKind::FirstTask),
            "mock_test_band" => Ok(AchievementKind::MockTestBand),
            "early_bird" => Ok(AchievementKind::EarlyBird),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    /// Stable slug, e.g. "week_warrior".
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: AchievementKind,
    /// One-way: once true, never reverts.
    pub unlocked: bool,
    /// Set once at the unlock transition, immutable thereafter.
    pub unlocked_at: Option<DateTime<Utc>>,
    pub progress: i64,
    pub total: i64,
    /// Credited to `total_points` exactly once, at unlock.
    pub points_reward: i64,
}

// ============================================================================
// Weekly Goals
// ============================================================================

/// One entry per calendar day of the current week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyGoal {
    /// Short day label: "Sun" .. "Sat".
    pub day: String,
    pub date: NaiveDate,
    /// Completions tallied on this date.
    pub tasks: i32,
    /// True once `tasks >= DAILY_GOAL_TASKS`.
    pub completed: bool,
}

// ============================================================================
// Skill Progress
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillProgress {
    pub skill: TaskKind,
    /// IELTS band score, 0.0 - 9.0.
    pub score: f64,
    /// 0 - 100 percentage derived from the score.
    pub progress: i32,
}

impl SkillProgress {
    pub fn from_score(skill: TaskKind, score: f64) -> Self {
        Self {
            skill,
            score,
            progress: (score * 10.0).round() as i32,
        }
    }
}

// ============================================================================
// Study Groups
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyGroup {
    /// Stable slug, e.g. "speaking-practice-circle".
    pub id: String,
    pub name: String,
    pub members: i32,
    pub active: bool,
    pub joined: bool,
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(NotificationKind::Info),
            "success" => Ok(NotificationKind::Success),
            "warning" => Ok(NotificationKind::Warning),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddNotificationRequest {
    pub title: String,
    pub message: String,
    pub kind: Option<NotificationKind>,
}

// ============================================================================
// Aggregate
// ============================================================================

/// The full per-user document. One consistency unit: every mutation loads,
/// transforms and persists the whole aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub user: User,
    pub stats: UserStats,
    pub tasks: Vec<Task>,
    pub achievements: Vec<Achievement>,
    pub weekly_goals: Vec<WeeklyGoal>,
    pub skill_progress: Vec<SkillProgress>,
    pub study_groups: Vec<StudyGroup>,
    pub notifications: Vec<Notification>,
}

// ============================================================================
// Policy
// ============================================================================

/// What un-completing a task rolls back beyond points/counters/hours.
/// Streak state and achievement unlocks are one-way under both variants:
/// their prior values are not retained in the aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UncompleteBehavior {
    /// Reverse nothing beyond the point/counter/hour deltas.
    #[default]
    Ratchet,
    /// Additionally decrement today's weekly-goal tally.
    RollbackDailyTally,
}

impl UncompleteBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            UncompleteBehavior::Ratchet => "ratchet",
            UncompleteBehavior::RollbackDailyTally => "rollback-daily-tally",
        }
    }
}

impl FromStr for UncompleteBehavior {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ratchet" => Ok(UncompleteBehavior::Ratchet),
            "rollback-daily-tally" | "rollback_daily_tally" => {
                Ok(UncompleteBehavior::RollbackDailyTally)
            }
            _ => Err(()),
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title must not be empty")]
    EmptyTitle,
    #[error("Duration must be positive")]
    NonPositiveDuration,
    #[error("Points must be positive")]
    NonPositivePoints,
    #[error("Name must not be empty")]
    EmptyName,
    #[error("Email address is not valid")]
    InvalidEmail,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleTaskResponse {
    pub success: bool,
    pub points_earned: Option<i64>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGroupResponse {
    pub joined: bool,
}

// ============================================================================
// Tests
// ============================================================================
