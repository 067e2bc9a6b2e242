// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    config::Config,
    error::AppError,
    models::{
        quiz::{QuizListParams, QuizOverview},
        score::{ResultParams, StartQuizResponse, SubmissionResponse, SubmitQuizRequest},
    },
    services::{
        accounts,
        attempt::{self, QuizAttempt},
    },
    utils::jwt::{Claims, sign_attempt_token, verify_attempt_token},
};

/// Lists the quizzes visible to the caller, optionally narrowed to a subject
/// or chapter. Visibility follows the caller's stored branch, not the token's.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = accounts::viewer(&pool, claims.user_id()?).await?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT
            q.id, q.name, q.chapter_id, c.name AS chapter_name,
            q.subject_id, s.name AS subject_name, q.time_limit,
            (SELECT COUNT(*) FROM questions qs WHERE qs.quiz_id = q.id) AS questions_available
        FROM quizzes q
        JOIN chapters c ON c.id = q.chapter_id
        JOIN subjects s ON s.id = q.subject_id
        WHERE 1 = 1
        "#,
    );

    if let (Some(branch_id), false) = (viewer.branch_id, viewer.is_admin) {
        builder.push(" AND s.branch_id = ");
        builder.push_bind(branch_id);
    }
    if let Some(subject_id) = params.subject_id {
        builder.push(" AND q.subject_id = ");
        builder.push_bind(subject_id);
    }
    if let Some(chapter_id) = params.chapter_id {
        builder.push(" AND q.chapter_id = ");
        builder.push_bind(chapter_id);
    }
    builder.push(" ORDER BY q.id");

    let quizzes = builder
        .build_query_as::<QuizOverview>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quizzes: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(quizzes))
}

/// Starts an attempt: returns the questions without their answers and a
/// single-use attempt token.
pub async fn start_quiz(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let viewer = accounts::viewer(&pool, user_id).await?;

    let attempt = QuizAttempt::new(quiz_id, user_id).start(&pool).await?;
    attempt.ensure_visible_to(&viewer)?;

    let attempt_token = sign_attempt_token(
        attempt.attempt_id(),
        quiz_id,
        user_id,
        &config.jwt_secret,
        config.attempt_token_ttl,
    )?;

    tracing::debug!(quiz = quiz_id, user = user_id, "quiz attempt started");

    let quiz = attempt.quiz();
    Ok(Json(StartQuizResponse {
        quiz_id,
        quiz_name: quiz.name.clone(),
        time_limit: quiz.time_limit,
        questions: attempt.public_questions(),
        attempt_token,
        expires_in: config.attempt_token_ttl,
    }))
}

/// Grades the submitted answers and records the score.
///
/// The attempt token must belong to this quiz and this user; it can be
/// redeemed once.
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let token = verify_attempt_token(&payload.attempt_token, &config.jwt_secret)?;
    if token.quiz_id != quiz_id || token.user_id != user_id {
        return Err(AppError::BadRequest(
            "Attempt token does not match this quiz".to_string(),
        ));
    }

    let attempt = QuizAttempt::resume(token.sub, quiz_id, user_id)
        .start(&pool)
        .await?;
    attempt.ensure_visible_to(&accounts::viewer(&pool, user_id).await?)?;

    let recorded = attempt.grade(&payload.answers).record(&pool).await?;

    let score = recorded.score();
    Ok(Json(SubmissionResponse {
        score_id: score.id,
        correct_count: score.correct_count,
        result: recorded.result(),
    }))
}

/// Result view for a given score on a quiz.
pub async fn attempt_result(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Query(params): Query<ResultParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(attempt::attempt_result(&pool, quiz_id, params.score).await?))
}
