use std::env;

use shared::UncompleteBehavior;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub uncomplete_behavior: UncompleteBehavior,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a number"),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:studytrack.db?mode=rwc".to_string()),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            uncomplete_behavior: env::var("UNCOMPLETE_BEHAVIOR")
                .ok()
                .map(|raw| {
                    raw.parse()
                        .expect("UNCOMPLETE_BEHAVIOR must be 'ratchet' or 'rollback-daily-tally'")
                })
                .unwrap_or_default(),
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .map(|raw| raw == "1" || raw.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure config tests run serially (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("HOST");
        env::remove_var("PORT");
        env::remove_var("DATABASE_URL");
        env::remove_var("CORS_ORIGINS");
        env::remove_var("UNCOMPLETE_BEHAVIOR");
        env::remove_var("SEED_DEMO_DATA");
    }

    #[test]
    fn test_config_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let config = Config::from_env().unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "sqlite:studytrack.db?mode=rwc");
        assert_eq!(config.cors_origins, vec!["http://localhost".to_string()]);
        assert_eq!(config.uncomplete_behavior, UncompleteBehavior::Ratchet);
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn test_config_from_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("HOST", "0.0.0.0");
        env::set_var("PORT", "3000");
        env::set_var("DATABASE_URL", "sqlite:test.db");
        env::set_var("CORS_ORIGINS", "http://localhost:8081, https://app.example.com");
        env::set_var("UNCOMPLETE_BEHAVIOR", "rollback-daily-tally");
        env::set_var("SEED_DEMO_DATA", "true");

        let config = Config::from_env().unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_url, "sqlite:test.db");
        assert_eq!(
            config.cors_origins,
            vec![
                "http://localhost:8081".to_string(),
                "https://app.example.com".to_string()
            ]
        );
        assert_eq!(
            config.uncomplete_behavior,
            UncompleteBehavior::RollbackDailyTally
        );
        assert!(config.seed_demo_data);

        // Clean up
        clear_env();
    }
}
