//! One-shot database setup: schema creation and demo seed rows.
//!
//! Not idempotent. Running [`initialize`] twice against the same file inserts
//! the seed users again under new ids.

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection},
    ConnectOptions, Connection, Executor,
};
use tracing::info;

use crate::{auth::password::hash_password, users::repo_types::User};

pub const SCHEMA: &str = include_str!("../schema.sql");

/// Demo accounts `(name, email, plaintext password)`.
///
/// Local/demo seeding only. Real deployments must provision credentials from a
/// secret store instead of literals in source.
pub const DEMO_USERS: [(&str, &str, &str); 3] = [
    ("John Doe", "john@example.com", "password123"),
    ("Jane Smith", "jane@example.com", "secret456"),
    ("Bob Johnson", "bob@example.com", "qwerty789"),
];

pub async fn create_schema(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    (&mut *conn)
        .execute(SCHEMA)
        .await
        .context("execute schema.sql")?;
    Ok(())
}

/// Inserts [`DEMO_USERS`] with freshly hashed passwords and returns their ids.
pub async fn seed_demo_users(conn: &mut SqliteConnection) -> anyhow::Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(DEMO_USERS.len());
    for (name, email, password) in DEMO_USERS {
        let hash = hash_password(password)
            .with_context(|| format!("hash seed password for {email}"))?;
        let id = User::create(conn, name, email, &hash).await?;
        info!(user_id = id, %email, "seeded user");
        ids.push(id);
    }
    Ok(ids)
}

/// Creates the database file if needed, applies the schema and inserts the seed rows.
pub async fn initialize(database_path: &str) -> anyhow::Result<Vec<i64>> {
    let mut conn = SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true)
        .connect()
        .await
        .with_context(|| format!("open {database_path}"))?;
    create_schema(&mut conn).await?;
    let ids = seed_demo_users(&mut conn).await?;
    conn.close().await.context("close bootstrap connection")?;
    Ok(ids)
}
