// src/handlers/auth.rs

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, User},
    utils::jwt::sign_jwt,
};

/// Exchanges a personal id + role for a bearer token.
///
/// Accounts are provisioned elsewhere; this only looks them up.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, role, personal_id FROM users WHERE personal_id = ? AND role = ?",
    )
    .bind(&payload.personal_id)
    .bind(payload.role.as_str())
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::from(e)
    })?
    .ok_or_else(|| AppError::AuthError("Invalid credentials".to_string()))?;

    let token = sign_jwt(
        user.id,
        &user.name,
        user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": user,
    })))
}
