//! Creates the users table and inserts the demo accounts.
//!
//! `DATABASE_PATH` (default `users.db`) selects the file. Running it twice
//! duplicates the seed rows.

use user_service::{bootstrap, config::AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "user_service=info".into()))
        .init();

    let config = AppConfig::from_env()?;
    tracing::warn!("seeding demo accounts with well-known passwords; do not use for production data");

    let ids = bootstrap::initialize(&config.database_path).await?;
    tracing::info!(database = %config.database_path, ?ids, "database initialized with sample data");
    Ok(())
}
