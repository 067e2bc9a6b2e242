// src/models/score.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::question::PublicQuestion;

/// Represents the 'scores' table in the database.
/// One row per recorded quiz attempt; rows are never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Score {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    #[serde(skip)]
    pub attempt_id: String,
    /// Sum of marks of the correctly answered questions.
    pub score: i64,
    /// Sum of marks of every question at grading time.
    pub max_score: i64,
    pub correct_count: i64,
    pub question_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO returned when an attempt starts.
#[derive(Debug, Serialize)]
pub struct StartQuizResponse {
    pub quiz_id: i64,
    pub quiz_name: String,
    pub time_limit: i64,
    pub questions: Vec<PublicQuestion>,
    pub attempt_token: String,
    pub expires_in: u64, // seconds
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    /// The token received from the start endpoint.
    pub attempt_token: String,

    /// User's answers map.
    /// Key: Question ID
    /// Value: chosen option slot (1-4)
    #[serde(default)]
    pub answers: HashMap<i64, i64>,
}

#[derive(Debug, Deserialize)]
pub struct ResultParams {
    pub score: i64,
}

/// Result view of one attempt.
#[derive(Debug, Serialize)]
pub struct AttemptResult {
    pub quiz_id: i64,
    pub quiz_name: String,
    pub score: i64,
    pub max_score: i64,
    pub question_count: i64,
    pub percentage: f64,
}

/// Response of a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub score_id: i64,
    pub correct_count: i64,
    #[serde(flatten)]
    pub result: AttemptResult,
}

/// Score total of one subject for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct SubjectTotal {
    pub subject_id: i64,
    pub subject_name: String,
    pub total_score: i64,
}

/// Aggregate over every attempt of one user.
///
/// `wrong_answers` counts questions, not attempts: every question of every
/// attempt that was not answered correctly (including unanswered ones).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct AttemptSummary {
    pub attempts: i64,
    pub total_score: i64,
    pub max_score: i64,
    pub correct_answers: i64,
    pub wrong_answers: i64,
    pub points_missed: i64,
}

/// One recorded attempt joined with its quiz and subject.
#[derive(Debug, Serialize, FromRow)]
pub struct HistoryEntry {
    pub score_id: i64,
    pub quiz_id: i64,
    pub quiz_name: String,
    pub subject_name: String,
    pub score: i64,
    pub max_score: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Everything the profile page shows for one user.
#[derive(Debug, Serialize)]
pub struct UserStats {
    pub summary: AttemptSummary,
    pub top_subject: Option<SubjectTotal>,
    pub history: Vec<HistoryEntry>,
}
