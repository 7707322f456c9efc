use sqlx::SqlitePool;

use crate::config::Config;

pub mod user_data;

pub use user_data::*;

/// Application state shared across all handlers
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}
