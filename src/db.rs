use std::convert::Infallible;

use anyhow::Context;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection},
    ConnectOptions,
};
use tracing::debug;

use crate::state::AppState;

enum ConnState {
    Unopened,
    Open(SqliteConnection),
    Closed,
}

/// A database connection bound to one request.
///
/// Extraction never touches the database; the connection is opened by the
/// first [`RequestConnection::acquire`] call and closed when the handle is
/// dropped at the end of the handler, whichever way the handler exits.
pub struct RequestConnection {
    options: SqliteConnectOptions,
    state: ConnState,
}

impl RequestConnection {
    pub fn new(options: SqliteConnectOptions) -> Self {
        Self {
            options,
            state: ConnState::Unopened,
        }
    }

    pub async fn acquire(&mut self) -> anyhow::Result<&mut SqliteConnection> {
        if let ConnState::Unopened = self.state {
            let conn = self
                .options
                .connect()
                .await
                .context("open database connection")?;
            debug!("database connection opened");
            self.state = ConnState::Open(conn);
        }
        match &mut self.state {
            ConnState::Open(conn) => Ok(conn),
            _ => anyhow::bail!("request connection already closed"),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ConnState::Open(_))
    }
}

impl Drop for RequestConnection {
    fn drop(&mut self) {
        // Dropping the sqlx connection shuts down its worker and closes the handle.
        if let ConnState::Open(_) = std::mem::replace(&mut self.state, ConnState::Closed) {
            debug!("database connection released");
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequestConnection {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::new(state.db.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::{sqlite::SqliteLockingMode, Connection, Row};
    use std::time::Duration;

    fn options_for(dir: &tempfile::TempDir) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(dir.path().join("conn.db"))
            .create_if_missing(true)
    }

    #[tokio::test]
    async fn opens_lazily_and_reuses_connection() {
        let dir = tempfile::tempdir().unwrap();
        let mut handle = RequestConnection::new(options_for(&dir));
        assert!(!handle.is_open());

        sqlx::query("CREATE TEMP TABLE scratch (v INTEGER)")
            .execute(&mut *handle.acquire().await.unwrap())
            .await
            .unwrap();
        assert!(handle.is_open());

        // A TEMP table is only visible on the connection that created it.
        let row = sqlx::query("SELECT COUNT(*) AS n FROM scratch")
            .fetch_one(&mut *handle.acquire().await.unwrap())
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("n"), 0);
    }

    async fn exclusive_db() -> (tempfile::TempDir, SqliteConnectOptions) {
        let dir = tempfile::tempdir().unwrap();
        let mut setup = options_for(&dir).connect().await.unwrap();
        sqlx::query("CREATE TABLE scratch (v INTEGER)")
            .execute(&mut setup)
            .await
            .unwrap();
        setup.close().await.unwrap();

        // EXCLUSIVE keeps the file lock until the connection is closed, so a
        // second writer succeeds only after release.
        let options = options_for(&dir).locking_mode(SqliteLockingMode::Exclusive);
        (dir, options)
    }

    async fn write_from_other_connection(
        dir: &tempfile::TempDir,
        wait: Duration,
    ) -> sqlx::Result<()> {
        let mut conn = SqliteConnectOptions::new()
            .filename(dir.path().join("conn.db"))
            .busy_timeout(wait)
            .connect()
            .await?;
        sqlx::query("INSERT INTO scratch (v) VALUES (2)")
            .execute(&mut conn)
            .await?;
        conn.close().await
    }

    #[tokio::test]
    async fn drop_releases_connection() {
        let (dir, options) = exclusive_db().await;
        let mut handle = RequestConnection::new(options);
        sqlx::query("INSERT INTO scratch (v) VALUES (1)")
            .execute(&mut *handle.acquire().await.unwrap())
            .await
            .unwrap();

        assert!(write_from_other_connection(&dir, Duration::ZERO).await.is_err());

        drop(handle);
        write_from_other_connection(&dir, Duration::from_secs(5))
            .await
            .expect("write after release");
    }

    async fn write_then_fail(
        mut handle: RequestConnection,
        dir: &tempfile::TempDir,
    ) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO scratch (v) VALUES (1)")
            .execute(&mut *handle.acquire().await?)
            .await?;
        assert!(write_from_other_connection(dir, Duration::ZERO).await.is_err());
        sqlx::query("INSERT INTO no_such_table (v) VALUES (1)")
            .execute(&mut *handle.acquire().await?)
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn error_return_releases_connection() {
        let (dir, options) = exclusive_db().await;
        let err = write_then_fail(RequestConnection::new(options), &dir)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("no_such_table"));

        write_from_other_connection(&dir, Duration::from_secs(5))
            .await
            .expect("write after failed request");
    }

    #[tokio::test]
    async fn unopened_handle_holds_nothing() {
        let (dir, options) = exclusive_db().await;
        let handle = RequestConnection::new(options);
        write_from_other_connection(&dir, Duration::ZERO)
            .await
            .expect("no lock before first acquire");
        drop(handle);
    }

    #[tokio::test]
    async fn open_failure_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let options = SqliteConnectOptions::new().filename(dir.path().join("missing.db"));
        let mut handle = RequestConnection::new(options);
        assert!(handle.acquire().await.is_err());
        assert!(!handle.is_open());
    }
}
