use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_path: String,
    pub host: String,
    pub port: u16,
    /// Verbose logging and error details in 500 responses. Off unless `APP_DEBUG` says otherwise.
    pub debug: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("DATABASE_PATH").unwrap_or_else(|| "users.db".into());
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("APP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a valid port: {raw:?}"))?,
            None => 5000,
        };
        let debug = lookup("APP_DEBUG").map(|v| parse_flag(&v)).unwrap_or(false);

        Ok(Self {
            database_path,
            host,
            port,
            debug,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "user_service=debug,axum=debug,tower_http=debug,sqlx=debug"
        } else {
            "user_service=info,axum=info,tower_http=info"
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
