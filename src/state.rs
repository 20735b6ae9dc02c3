use crate::config::AppConfig;
use sqlx::sqlite::SqliteConnectOptions;
use std::sync::Arc;

/// Shared, read-only application state. Holds connection *options* only;
/// every request opens its own connection through [`crate::db::RequestConnection`].
#[derive(Clone)]
pub struct AppState {
    pub db: SqliteConnectOptions,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let db = SqliteConnectOptions::new().filename(&config.database_path);
        Self { db, config }
    }
}
