use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use shared::UserData;

/// Database model for the per-user aggregate document.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserDataRow {
    pub user_id: String,
    pub email: String,
    pub version: i64,
    /// The full `UserData` aggregate as JSON.
    pub data: String,
    pub updated_at: DateTime<Utc>,
}

impl UserDataRow {
    pub fn decode(&self) -> Result<UserData, serde_json::Error> {
        serde_json::from_str(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::User;
    use uuid::Uuid;

    #[test]
    fn test_row_decode_roundtrip() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let user = User {
            id: Uuid::new_v4(),
            name: "Demo User".to_string(),
            email: "demo@example.com".to_string(),
            avatar: "DU".to_string(),
            created_at: now,
            last_login: now,
        };
        let data = UserData::new_for_user(user.clone(), now);

        let row = UserDataRow {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            version: 1,
            data: serde_json::to_string(&data).unwrap(),
            updated_at: now,
        };

        let decoded = row.decode().unwrap();
        assert_eq!(decoded.user.id, user.id);
        assert_eq!(decoded.tasks.len(), 4);
        assert_eq!(decoded.stats.level, 1);
    }

    #[test]
    fn test_row_decode_rejects_garbage() {
        let row = UserDataRow {
            user_id: Uuid::new_v4().to_string(),
            email: "x@example.com".to_string(),
            version: 1,
            data: "{not json".to_string(),
            updated_at: Utc::now(),
        };
        assert!(row.decode().is_err());
    }
}
