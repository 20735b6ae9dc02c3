use serde::Serialize;
use sqlx::FromRow;

/// Public projection of a user row. `name` and `email` are nullable columns
/// and serialize as `null` when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Full row, including the stored hash. Only used to check credentials, never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>, // Argon2 PHC string
}
