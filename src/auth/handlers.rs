use axum::{extract::rejection::JsonRejection, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse},
        password::{dummy_hash, verify_password_blocking},
    },
    db::RequestConnection,
    error::ApiError,
    state::AppState,
    users::repo_types::UserRecord,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Stateless credential check. Unknown email and wrong password give the same 401.
#[instrument(skip(conn, payload))]
pub async fn login(
    mut conn: RequestConnection,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(error = %rejection, "invalid login payload");
        ApiError::validation("Email and password are required.")
    })?;

    let user = UserRecord::find_by_email(conn.acquire().await?, &payload.email).await?;

    // Exactly one Argon2 verification per attempt, known email or not.
    let stored_hash = match &user {
        Some(u) => u.password.clone().unwrap_or_default(),
        None => dummy_hash().to_string(),
    };
    let matches = verify_password_blocking(payload.password, stored_hash).await?;

    let user = match user {
        Some(u) if matches => u,
        Some(u) => {
            warn!(email = %payload.email, user_id = u.id, "login invalid password");
            return Err(ApiError::InvalidCredentials);
        }
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    info!(user_id = user.id, email = %payload.email, "user logged in");
    Ok(Json(LoginResponse {
        status: "success",
        user_id: user.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};
    use http_body_util::BodyExt;

    #[test]
    fn login_response_shape() {
        let json = serde_json::to_value(LoginResponse {
            status: "success",
            user_id: 1,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "status": "success", "user_id": 1 }));
    }

    #[tokio::test]
    async fn failed_login_body() {
        let res = ApiError::InvalidCredentials.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "failed", "error": "Invalid credentials" })
        );
    }
}
