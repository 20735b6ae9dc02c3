use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::password::hash_password_blocking,
    db::RequestConnection,
    error::ApiError,
    state::AppState,
    users::{
        dto::{
            CreateUserRequest, CreatedUserResponse, MessageResponse, SearchParams,
            UpdateUserRequest,
        },
        repo_types::User,
    },
};

const CREATE_REQUIRED: &str = "Invalid data. Name, email, and password are required.";
const UPDATE_REQUIRED: &str = "Invalid data. Name or email is required.";
const SEARCH_REQUIRED: &str = "Please provide a name to search";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/user/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/search", get(search_users))
}

/// A non-integer id never names a user.
fn user_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            warn!(error = %rejection, "non-integer user id");
            Err(ApiError::user_not_found())
        }
    }
}

async fn existing_user(conn: &mut RequestConnection, id: i64) -> Result<User, ApiError> {
    User::find_by_id(conn.acquire().await?, id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = id, "user not found");
            ApiError::user_not_found()
        })
}

#[instrument(skip(conn))]
pub async fn list_users(mut conn: RequestConnection) -> Result<Json<Vec<User>>, ApiError> {
    let users = User::list_all(conn.acquire().await?).await?;
    Ok(Json(users))
}

#[instrument(skip(conn, path))]
pub async fn get_user(
    mut conn: RequestConnection,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let id = user_id(path)?;
    let user = existing_user(&mut conn, id).await?;
    Ok(Json(user))
}

#[instrument(skip(conn, payload))]
pub async fn create_user(
    mut conn: RequestConnection,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedUserResponse>), ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(error = %rejection, "invalid create payload");
        ApiError::validation(CREATE_REQUIRED)
    })?;

    let hash = hash_password_blocking(payload.password).await?;
    let user_id = User::create(
        conn.acquire().await?,
        &payload.name,
        &payload.email,
        &hash,
    )
    .await?;

    info!(user_id, email = %payload.email, "user created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            message: "User created",
            user_id,
        }),
    ))
}

#[instrument(skip(conn, path, payload))]
pub async fn update_user(
    mut conn: RequestConnection,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = user_id(path)?;
    let current = existing_user(&mut conn, id).await?;

    let changes = match payload {
        Ok(Json(changes)) if !changes.is_empty() => changes,
        Ok(_) => {
            warn!(user_id = id, "update without name or email");
            return Err(ApiError::validation(UPDATE_REQUIRED));
        }
        Err(rejection) => {
            warn!(user_id = id, error = %rejection, "invalid update payload");
            return Err(ApiError::validation(UPDATE_REQUIRED));
        }
    };

    let name = changes.name.unwrap_or(current.name);
    let email = changes.email.unwrap_or(current.email);
    User::update(
        conn.acquire().await?,
        id,
        name.as_deref(),
        email.as_deref(),
    )
    .await?;

    info!(user_id = id, "user updated");
    Ok(Json(MessageResponse::new("User updated")))
}

#[instrument(skip(conn, path))]
pub async fn delete_user(
    mut conn: RequestConnection,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = user_id(path)?;
    existing_user(&mut conn, id).await?;
    User::delete(conn.acquire().await?, id).await?;

    info!(user_id = id, "user deleted");
    Ok(Json(MessageResponse::new(format!("User {id} deleted"))))
}

#[instrument(skip(conn, params))]
pub async fn search_users(
    mut conn: RequestConnection,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<User>>, ApiError> {
    let needle = match params {
        Ok(Query(SearchParams { name: Some(name) })) if !name.is_empty() => name,
        _ => {
            warn!("search without name");
            return Err(ApiError::validation(SEARCH_REQUIRED));
        }
    };

    let users = User::search_by_name(conn.acquire().await?, &needle).await?;
    Ok(Json(users))
}
