// src/handlers/admin.rs
//
// Generic admin CRUD keyed by model name. Every handler resolves the model
// first, so an unknown name fails before any other work.

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    services::{
        crud::{self, ModelKind},
        stats,
    },
    utils::jwt::Claims,
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Lists the records of a model, filtered by `?q=` when given.
pub async fn list(
    State(pool): State<SqlitePool>,
    Path(model): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let kind = ModelKind::resolve(&model)?;
    let records = crud::list_or_search(&pool, kind, params.q.as_deref()).await?;
    Ok(Json(records))
}

/// The model's editable-field allow-list, for form rendering.
pub async fn fields(Path(model): Path<String>) -> Result<impl IntoResponse, AppError> {
    let kind = ModelKind::resolve(&model)?;
    Ok(Json(kind.fields()))
}

pub async fn create(
    State(pool): State<SqlitePool>,
    Path(model): Path<String>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    let kind = ModelKind::resolve(&model)?;
    let record = crud::add_or_edit(&pool, kind, None, &payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get(
    State(pool): State<SqlitePool>,
    Path((model, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = ModelKind::resolve(&model)?;
    Ok(Json(crud::find(&pool, kind, id).await?))
}

/// Full edit: the submitted fields overwrite the stored ones and the merged
/// record must pass form validation.
pub async fn update(
    State(pool): State<SqlitePool>,
    Path((model, id)): Path<(String, i64)>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    let kind = ModelKind::resolve(&model)?;
    let record = crud::add_or_edit(&pool, kind, Some(id), &payload).await?;
    Ok(Json(record))
}

/// Inline edit of individual fields.
pub async fn patch(
    State(pool): State<SqlitePool>,
    Path((model, id)): Path<(String, i64)>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    let kind = ModelKind::resolve(&model)?;
    let record = crud::inline_edit(&pool, kind, id, &payload).await?;
    Ok(Json(record))
}

/// Deletes a record. Admins cannot delete their own account.
pub async fn delete(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((model, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = ModelKind::resolve(&model)?;
    crud::delete(&pool, kind, id, claims.user_id()?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Summary, top subject and history of any user. Only `users/{id}/stats` exists.
pub async fn user_stats(
    State(pool): State<SqlitePool>,
    Path((model, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    if ModelKind::resolve(&model)? != ModelKind::User {
        return Err(AppError::NotFound(format!("No stats for model '{model}'")));
    }
    crud::find(&pool, ModelKind::User, id).await?;
    Ok(Json(stats::user_stats(&pool, id).await?))
}
