use anyhow::Context;
use sqlx::SqliteConnection;

use crate::users::repo_types::{User, UserRecord};

impl User {
    /// All users in storage order.
    pub async fn list_all(conn: &mut SqliteConnection) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT id, name, email FROM users")
            .fetch_all(&mut *conn)
            .await
            .context("list users")?;
        Ok(users)
    }

    pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .with_context(|| format!("find user {id}"))?;
        Ok(user)
    }

    /// Insert a user and return the generated id. `password_hash` must already be hashed.
    pub async fn create(
        conn: &mut SqliteConnection,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<i64> {
        let done = sqlx::query("INSERT INTO users (name, email, password) VALUES (?, ?, ?)")
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .execute(&mut *conn)
            .await
            .context("insert user")?;
        Ok(done.last_insert_rowid())
    }

    /// Overwrites both fields; callers merge partial updates beforehand.
    /// `None` stores NULL.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET name = ?, email = ? WHERE id = ?")
            .bind(name)
            .bind(email)
            .bind(id)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("update user {id}"))?;
        Ok(())
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("delete user {id}"))?;
        Ok(())
    }

    /// Substring match on `name` via `LIKE '%needle%'`.
    ///
    /// `%` and `_` in `needle` are passed through unescaped and act as
    /// wildcards. Matching is ASCII case-insensitive (SQLite's default `LIKE`).
    pub async fn search_by_name(
        conn: &mut SqliteConnection,
        needle: &str,
    ) -> anyhow::Result<Vec<User>> {
        let pattern = format!("%{needle}%");
        let users =
            sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE name LIKE ?")
                .bind(pattern)
                .fetch_all(&mut *conn)
                .await
                .context("search users by name")?;
        Ok(users)
    }
}

impl UserRecord {
    /// Full row for credential checks. Emails are not unique in the schema;
    /// the oldest matching row wins.
    pub async fn find_by_email(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password
            FROM users
            WHERE email = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await
        .context("find user by email")?;
        Ok(user)
    }
}
