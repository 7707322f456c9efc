//! User lifecycle: registration with the default aggregate, profile edits
//! and resets. Credential handling lives outside this service; callers are
//! trusted to supply the authenticated user id.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::services::progress::{self, apply_level};
use crate::services::store::{self, StoreError};
use shared::defaults::avatar_from_name;
use shared::{
    CreateUserRequest, SkillProgress, TaskKind, UpdateProfileRequest, User, UserData,
    ValidationError,
};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Register a user and persist their default aggregate.
pub async fn create_user(
    pool: &SqlitePool,
    request: &CreateUserRequest,
) -> Result<UserData, UserError> {
    let name = request.name.trim();
    let email = request.email.trim();

    if name.is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ValidationError::InvalidEmail.into());
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        avatar: avatar_from_name(name),
        created_at: now,
        last_login: now,
    };

    let data = UserData::new_for_user(user, now);
    store::create(pool, &data).await?;

    Ok(data)
}

pub async fn get_user_data(pool: &SqlitePool, user_id: &Uuid) -> Result<UserData, UserError> {
    Ok(store::load(pool, user_id).await?.data)
}

/// Edit display name and/or avatar glyph. Independent of the progress
/// engine: no derived state changes.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &Uuid,
    request: &UpdateProfileRequest,
) -> Result<User, UserError> {
    let name = request.name.clone();
    let avatar = request.avatar.clone();

    let user = store::mutate(pool, user_id, move |data| {
        if let Some(ref name) = name {
            data.user.name = name.clone();
        }
        if let Some(ref avatar) = avatar {
            data.user.avatar = avatar.clone();
        }
        Ok(data.user.clone())
    })
    .await?;

    Ok(user)
}

/// Wipe progress back to the default aggregate, keeping the identity.
pub async fn reset_user_data(pool: &SqlitePool, user_id: &Uuid) -> Result<UserData, UserError> {
    let data = store::mutate(pool, user_id, |data| {
        *data = UserData::new_for_user(data.user.clone(), Utc::now());
        Ok(data.clone())
    })
    .await?;

    Ok(data)
}

const DEMO_EMAIL: &str = "demo@studytrack.dev";

/// Create the demo account with pre-populated progress, if it does not
/// already exist. Returns the demo user id.
pub async fn seed_demo_user(pool: &SqlitePool) -> Result<Uuid, UserError> {
    if let Some(existing) = store::find_user_id_by_email(pool, DEMO_EMAIL).await? {
        return Ok(existing);
    }

    let request = CreateUserRequest {
        name: "Demo User".to_string(),
        email: DEMO_EMAIL.to_string(),
    };
    let data = create_user(pool, &request).await?;
    let user_id = data.user.id;

    store::mutate(pool, &user_id, |data| {
        seed_demo_progress(data, Utc::now());
        Ok(())
    })
    .await?;

    Ok(user_id)
}

fn seed_demo_progress(data: &mut UserData, now: DateTime<Utc>) {
    data.stats.streak = 12;
    data.stats.longest_streak = 15;
    data.stats.total_points = 2450;
    data.stats.tasks_completed = 32;
    data.stats.total_study_hours = 48.0;
    data.stats.mock_tests_taken = 3;
    data.stats.current_band = 7.0;
    data.stats.days_to_exam = 24;
    data.stats.last_study_date = Some(now.date_naive());
    apply_level(&mut data.stats);

    for achievement in &mut data.achievements {
        match achievement.id.as_str() {
            "week_warrior" => {
                achievement.unlocked = true;
                achievement.unlocked_at = Some(now);
                achievement.progress = achievement.total;
            }
            "first_steps" => {
                achievement.unlocked = true;
                achievement.unlocked_at = Some(now);
                achievement.progress = 1;
            }
            "task_master" => achievement.progress = 32,
            _ => {}
        }
    }

    if let Some(task) = data.tasks.first_mut() {
        task.completed = true;
        task.completed_at = Some(now);
    }

    data.skill_progress = vec![
        SkillProgress::from_score(TaskKind::Listening, 7.5),
        SkillProgress::from_score(TaskKind::Reading, 7.0),
        SkillProgress::from_score(TaskKind::Writing, 6.5),
        SkillProgress::from_score(TaskKind::Speaking, 7.0),
    ];

    progress::add_notification(
        data,
        "Welcome back!",
        "Your demo progress has been restored",
        shared::NotificationKind::Info,
        now,
    );
}
