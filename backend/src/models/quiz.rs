// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,

    pub name: String,

    pub chapter_id: i64,

    /// Always equal to the chapter's subject; never written directly by callers.
    pub subject_id: i64,

    /// Declared number of questions.
    pub question_count: i64,

    /// Time limit in seconds. Advisory only, shown to the quiz taker.
    pub time_limit: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Query parameters for browsing quizzes.
#[derive(Debug, Default, Deserialize)]
pub struct QuizListParams {
    pub subject_id: Option<i64>,
    pub chapter_id: Option<i64>,
}

/// A quiz joined with its chapter and subject, as listed to quiz takers.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizOverview {
    pub id: i64,
    pub name: String,
    pub chapter_id: i64,
    pub chapter_name: String,
    pub subject_id: i64,
    pub subject_name: String,
    pub time_limit: i64,
    /// Number of questions actually stored for the quiz.
    pub questions_available: i64,
}
