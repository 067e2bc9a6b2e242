// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{error::AppError, services::stats, utils::jwt::Claims};

/// Totals over every attempt of the current user.
pub async fn summary(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(stats::attempt_summary(&pool, claims.user_id()?).await?))
}

/// Subject with the highest score total; `null` before the first attempt.
pub async fn top_subject(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(stats::top_subject_by_score(&pool, claims.user_id()?).await?))
}

pub async fn history(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(stats::attempt_history(&pool, claims.user_id()?).await?))
}
