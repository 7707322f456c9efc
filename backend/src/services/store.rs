//! The state store: one JSON document per user, keyed by user id.
//!
//! `save` is a compare-and-swap on a monotonic version counter, so a stale
//! writer fails with `Conflict` instead of silently losing the other
//! writer's update. Every public mutation routes through the progress
//! engine and persists the whole aggregate.

use chrono::Utc;
use rand::thread_rng;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::UserDataRow;
use crate::services::progress::{self, ProgressError, ToggleOutcome};
use shared::{
    AddNotificationRequest, CreateTaskRequest, NotificationKind, Task, UncompleteBehavior,
    UserData,
};

/// Conflict retries before a mutation gives up. Callers are expected to
/// serialize writes per user, so contention here is rare.
const SAVE_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User not found")]
    NotFound,
    #[error("User data was modified concurrently")]
    Conflict,
    #[error("A user with this email already exists")]
    DuplicateEmail,
    #[error("Database error: {0}")]
    Database(sqlx::Error),
    #[error("Corrupt user data: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            _ => StoreError::Database(e),
        }
    }
}

/// An aggregate together with the version it was read at.
#[derive(Debug, Clone)]
pub struct VersionedUserData {
    pub version: i64,
    pub data: UserData,
}

/// Insert a brand-new aggregate at version 1.
pub async fn create(pool: &SqlitePool, data: &UserData) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(data)?;

    sqlx::query(
        r#"
        INSERT INTO user_data (user_id, email, version, data, updated_at)
        VALUES (?, ?, 1, ?, ?)
        "#,
    )
    .bind(data.user.id.to_string())
    .bind(&data.user.email)
    .bind(&encoded)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load(pool: &SqlitePool, user_id: &Uuid) -> Result<VersionedUserData, StoreError> {
    let row: Option<UserDataRow> = sqlx::query_as("SELECT * FROM user_data WHERE user_id = ?")
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;

    let row = row.ok_or(StoreError::NotFound)?;
    Ok(VersionedUserData {
        version: row.version,
        data: row.decode()?,
    })
}

/// Persist the full aggregate if nobody else wrote since `expected_version`.
/// Returns the new version.
pub async fn save(
    pool: &SqlitePool,
    user_id: &Uuid,
    expected_version: i64,
    data: &UserData,
) -> Result<i64, StoreError> {
    let encoded = serde_json::to_string(data)?;

    let result = sqlx::query(
        r#"
        UPDATE user_data SET version = version + 1, email = ?, data = ?, updated_at = ?
        WHERE user_id = ? AND version = ?
        "#,
    )
    .bind(&data.user.email)
    .bind(&encoded)
    .bind(Utc::now())
    .bind(user_id.to_string())
    .bind(expected_version)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_data WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_one(pool)
            .await?;

        return Err(if exists > 0 {
            StoreError::Conflict
        } else {
            StoreError::NotFound
        });
    }

    Ok(expected_version + 1)
}

pub async fn find_user_id_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<Uuid>, StoreError> {
    let id: Option<String> = sqlx::query_scalar("SELECT user_id FROM user_data WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(id.and_then(|s| Uuid::parse_str(&s).ok()))
}

/// Load-transform-save cycle behind every mutation: apply a progress-engine
/// transform to the freshly loaded aggregate and persist the result,
/// retrying a few times when a concurrent writer wins the version race.
pub async fn mutate<T, F>(pool: &SqlitePool, user_id: &Uuid, mut apply: F) -> Result<T, StoreError>
where
    F: FnMut(&mut UserData) -> Result<T, ProgressError>,
{
    let mut attempts = 0;
    loop {
        let VersionedUserData { version, mut data } = load(pool, user_id).await?;
        let outcome = apply(&mut data)?;

        match save(pool, user_id, version, &data).await {
            Ok(_) => return Ok(outcome),
            Err(StoreError::Conflict) if attempts < SAVE_RETRIES => {
                attempts += 1;
                log::warn!(
                    "Version conflict for user {} (attempt {}), retrying",
                    user_id,
                    attempts
                );
            }
            Err(e) => return Err(e),
        }
    }
}

// ============================================================================
// Mutations, one per user-facing operation
// ============================================================================

pub async fn toggle_task(
    pool: &SqlitePool,
    user_id: &Uuid,
    task_id: &Uuid,
    behavior: UncompleteBehavior,
) -> Result<ToggleOutcome, StoreError> {
    mutate(pool, user_id, |data| {
        progress::toggle_task(data, task_id, Utc::now(), behavior)
    })
    .await
}

pub async fn create_task(
    pool: &SqlitePool,
    user_id: &Uuid,
    request: &CreateTaskRequest,
) -> Result<Task, StoreError> {
    mutate(pool, user_id, |data| {
        progress::create_task(data, request, Utc::now())
    })
    .await
}

pub async fn delete_task(
    pool: &SqlitePool,
    user_id: &Uuid,
    task_id: &Uuid,
) -> Result<(), StoreError> {
    mutate(pool, user_id, |data| progress::delete_task(data, task_id)).await
}

/// Replace the task list with a freshly generated daily set.
pub async fn generate_new_tasks(
    pool: &SqlitePool,
    user_id: &Uuid,
) -> Result<Vec<Task>, StoreError> {
    mutate(pool, user_id, |data| {
        progress::generate_daily_tasks(data, &mut thread_rng(), Utc::now().date_naive());
        Ok(data.tasks.clone())
    })
    .await
}

pub async fn toggle_study_group(
    pool: &SqlitePool,
    user_id: &Uuid,
    group_id: &str,
) -> Result<bool, StoreError> {
    mutate(pool, user_id, |data| {
        progress::toggle_study_group(data, group_id)
    })
    .await
}

pub async fn mark_notification_read(
    pool: &SqlitePool,
    user_id: &Uuid,
    notification_id: &Uuid,
) -> Result<(), StoreError> {
    mutate(pool, user_id, |data| {
        progress::mark_notification_read(data, notification_id)
    })
    .await
}

pub async fn add_notification(
    pool: &SqlitePool,
    user_id: &Uuid,
    request: &AddNotificationRequest,
) -> Result<Uuid, StoreError> {
    mutate(pool, user_id, |data| {
        Ok(progress::add_notification(
            data,
            &request.title,
            &request.message,
            request.kind.unwrap_or(NotificationKind::Info),
            Utc::now(),
        ))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::{TaskKind, User};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        // A single connection, otherwise every pooled connection sees its
        // own private in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        pool
    }

    fn sample_user_data(email: &str) -> UserData {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let user = User {
            id: Uuid::new_v4(),
            name: "Demo User".to_string(),
            email: email.to_string(),
            avatar: "DU".to_string(),
            created_at: now,
            last_login: now,
        };
        UserData::new_for_user(user, now)
    }

    #[actix_rt::test]
    async fn test_create_and_load_roundtrip() {
        let pool = test_pool().await;
        let data = sample_user_data("demo@example.com");

        create(&pool, &data).await.unwrap();
        let loaded = load(&pool, &data.user.id).await.unwrap();

        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.data.user.email, "demo@example.com");
        assert_eq!(loaded.data.tasks.len(), 4);
    }

    #[actix_rt::test]
    async fn test_load_missing_user() {
        let pool = test_pool().await;
        let result = load(&pool, &Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[actix_rt::test]
    async fn test_duplicate_email_rejected() {
        let pool = test_pool().await;
        create(&pool, &sample_user_data("same@example.com"))
            .await
            .unwrap();

        let result = create(&pool, &sample_user_data("same@example.com")).await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail)));
    }

    #[actix_rt::test]
    async fn test_save_bumps_version_and_detects_staleness() {
        let pool = test_pool().await;
        let mut data = sample_user_data("demo@example.com");
        create(&pool, &data).await.unwrap();

        data.stats.total_points = 100;
        let new_version = save(&pool, &data.user.id, 1, &data).await.unwrap();
        assert_eq!(new_version, 2);

        // A writer still holding version 1 must not clobber version 2.
        let stale = save(&pool, &data.user.id, 1, &data).await;
        assert!(matches!(stale, Err(StoreError::Conflict)));

        let loaded = load(&pool, &data.user.id).await.unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.data.stats.total_points, 100);
    }

    #[actix_rt::test]
    async fn test_save_missing_user() {
        let pool = test_pool().await;
        let data = sample_user_data("ghost@example.com");
        let result = save(&pool, &data.user.id, 1, &data).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[actix_rt::test]
    async fn test_find_user_id_by_email() {
        let pool = test_pool().await;
        let data = sample_user_data("findme@example.com");
        create(&pool, &data).await.unwrap();

        let found = find_user_id_by_email(&pool, "findme@example.com")
            .await
            .unwrap();
        assert_eq!(found, Some(data.user.id));

        let missing = find_user_id_by_email(&pool, "nobody@example.com")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[actix_rt::test]
    async fn test_toggle_task_persists_derived_state() {
        let pool = test_pool().await;
        let data = sample_user_data("demo@example.com");
        let user_id = data.user.id;
        let task = data
            .tasks
            .iter()
            .find(|t| t.kind == TaskKind::Writing)
            .unwrap()
            .clone();
        create(&pool, &data).await.unwrap();

        let outcome = toggle_task(&pool, &user_id, &task.id, UncompleteBehavior::Ratchet)
            .await
            .unwrap();
        assert!(outcome.completed);
        assert_eq!(outcome.points_delta, task.points);

        let loaded = load(&pool, &user_id).await.unwrap();
        assert_eq!(loaded.version, 2);
        // Task points plus the First Steps unlock bonus.
        assert_eq!(loaded.data.stats.total_points, task.points + 10);
        assert_eq!(loaded.data.stats.tasks_completed, 1);
        assert_eq!(loaded.data.stats.streak, 1);
    }

    #[actix_rt::test]
    async fn test_toggle_unknown_task_leaves_aggregate_unversioned() {
        let pool = test_pool().await;
        let data = sample_user_data("demo@example.com");
        let user_id = data.user.id;
        create(&pool, &data).await.unwrap();

        let result = toggle_task(&pool, &user_id, &Uuid::new_v4(), UncompleteBehavior::Ratchet)
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Progress(ProgressError::TaskNotFound))
        ));

        let loaded = load(&pool, &user_id).await.unwrap();
        assert_eq!(loaded.version, 1);
    }

    #[actix_rt::test]
    async fn test_create_and_delete_task() {
        let pool = test_pool().await;
        let data = sample_user_data("demo@example.com");
        let user_id = data.user.id;
        create(&pool, &data).await.unwrap();

        let request = CreateTaskRequest {
            title: "Essay outline".to_string(),
            kind: TaskKind::Writing,
            duration_minutes: 30,
            points: 25,
            date: None,
            description: None,
            category: None,
            due_date: None,
            difficulty: None,
        };

        let task = create_task(&pool, &user_id, &request).await.unwrap();
        let loaded = load(&pool, &user_id).await.unwrap();
        assert_eq!(loaded.data.tasks.len(), 5);

        delete_task(&pool, &user_id, &task.id).await.unwrap();
        let loaded = load(&pool, &user_id).await.unwrap();
        assert_eq!(loaded.data.tasks.len(), 4);
        assert!(!loaded.data.tasks.iter().any(|t| t.id == task.id));
    }

    #[actix_rt::test]
    async fn test_generate_new_tasks_replaces_list() {
        let pool = test_pool().await;
        let data = sample_user_data("demo@example.com");
        let user_id = data.user.id;
        let old_ids: Vec<Uuid> = data.tasks.iter().map(|t| t.id).collect();
        create(&pool, &data).await.unwrap();

        let tasks = generate_new_tasks(&pool, &user_id).await.unwrap();

        assert_eq!(tasks.len(), 4);
        assert!(tasks.iter().all(|t| !old_ids.contains(&t.id)));

        let loaded = load(&pool, &user_id).await.unwrap();
        assert_eq!(loaded.data.tasks.len(), 4);
        // Stats survive a regeneration untouched.
        assert_eq!(loaded.data.stats.total_points, 0);
    }

    #[actix_rt::test]
    async fn test_group_and_notification_mutations() {
        let pool = test_pool().await;
        let data = sample_user_data("demo@example.com");
        let user_id = data.user.id;
        let group_id = data.study_groups[0].id.clone();
        create(&pool, &data).await.unwrap();

        assert!(toggle_study_group(&pool, &user_id, &group_id).await.unwrap());

        let request = AddNotificationRequest {
            title: "Study Reminder".to_string(),
            message: "Keep your streak alive".to_string(),
            kind: None,
        };
        let notification_id = add_notification(&pool, &user_id, &request).await.unwrap();
        mark_notification_read(&pool, &user_id, &notification_id)
            .await
            .unwrap();

        let loaded = load(&pool, &user_id).await.unwrap();
        assert!(loaded.data.study_groups[0].joined);
        assert_eq!(loaded.data.notifications.len(), 1);
        assert!(loaded.data.notifications[0].read);
        assert_eq!(loaded.data.notifications[0].kind, NotificationKind::Info);
    }
}
