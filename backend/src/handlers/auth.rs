// src/handlers/auth.rs

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Map, Value, json};
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    models::user::{ChangePasswordRequest, LoginRequest, RegisterRequest, User},
    services::accounts,
    utils::jwt::Claims,
};

/// Registers a new user.
///
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = accounts::register(&pool, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (token, user) = accounts::authenticate(&pool, &config, &payload).await?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "is_admin": user.is_admin
    })))
}

/// Profile of the authenticated user.
pub async fn me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(claims.user_id()?)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Updates the caller's username, name or date of birth.
pub async fn update_me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    let user = accounts::update_details(&pool, claims.user_id()?, &payload).await?;
    Ok(Json(user))
}

/// Changes the caller's password. The current password must be given.
pub async fn change_password(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    accounts::change_password(&pool, claims.user_id()?, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
