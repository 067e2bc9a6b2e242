// src/handlers/catalog.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{error::AppError, models::branch::Branch};

/// Branches offered on the registration form. Public.
pub async fn list_branches(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let branches = sqlx::query_as::<_, Branch>("SELECT * FROM branches ORDER BY name")
        .fetch_all(&pool)
        .await?;

    Ok(Json(branches))
}
