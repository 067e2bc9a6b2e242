// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub quiz_id: i64,

    /// The text content of the question.
    pub question_text: String,

    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,

    /// Slot of the correct option, 1 through 4.
    pub correct_option: i64,

    /// Points awarded when answered correctly.
    pub marks: i64,
}

/// DTO for sending question to quiz takers (excludes the correct option).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub options: [String; 4],
    pub marks: i64,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text.clone(),
            options: [
                q.option1.clone(),
                q.option2.clone(),
                q.option3.clone(),
                q.option4.clone(),
            ],
            marks: q.marks,
        }
    }
}
