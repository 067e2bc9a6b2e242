// src/services/attempt.rs

//! One pass through a quiz, from start to recorded score.
//!
//! The attempt is a typestate machine:
//! `NotStarted -> InProgress -> Graded -> Recorded`. Each transition consumes
//! the previous state, so a graded attempt cannot be graded again and a
//! recorded one cannot be recorded twice.

use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        question::{PublicQuestion, Question},
        quiz::Quiz,
        score::{AttemptResult, Score},
        user::Viewer,
    },
};

/// Outcome of grading one submission. Pure data, computed without side effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grade {
    pub score: i64,
    pub max_score: i64,
    pub correct_count: i64,
    pub question_count: i64,
}

fn percentage(score: i64, max_score: i64) -> f64 {
    if max_score <= 0 {
        return 0.0;
    }
    ((score as f64 / max_score as f64) * 10_000.0).round() / 100.0
}

/// Awards a question's marks iff the submitted option equals its correct option.
///
/// Questions absent from `answers` count as unanswered. Answers naming
/// questions outside `questions` are ignored.
pub fn grade(questions: &[Question], answers: &HashMap<i64, i64>) -> Grade {
    questions.iter().fold(Grade::default(), |mut acc, question| {
        acc.question_count += 1;
        acc.max_score += question.marks;
        if answers.get(&question.id) == Some(&question.correct_option) {
            acc.correct_count += 1;
            acc.score += question.marks;
        }
        acc
    })
}

#[derive(Debug)]
pub struct NotStarted {
    quiz_id: i64,
}

#[derive(Debug)]
pub struct InProgress {
    quiz: Quiz,
    branch_id: i64,
    questions: Vec<Question>,
}

#[derive(Debug)]
pub struct Graded {
    quiz: Quiz,
    grade: Grade,
}

#[derive(Debug)]
pub struct Recorded {
    quiz: Quiz,
    score: Score,
}

#[derive(Debug)]
pub struct QuizAttempt<S> {
    attempt_id: String,
    user_id: i64,
    state: S,
}

impl<S> QuizAttempt<S> {
    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }
}

impl QuizAttempt<NotStarted> {
    /// A fresh attempt with a new id.
    pub fn new(quiz_id: i64, user_id: i64) -> Self {
        Self::resume(uuid::Uuid::new_v4().to_string(), quiz_id, user_id)
    }

    /// An attempt whose id was handed out earlier (carried by its attempt token).
    pub fn resume(attempt_id: String, quiz_id: i64, user_id: i64) -> Self {
        Self {
            attempt_id,
            user_id,
            state: NotStarted { quiz_id },
        }
    }

    /// Loads the quiz and its questions in id order.
    pub async fn start(self, pool: &SqlitePool) -> Result<QuizAttempt<InProgress>, AppError> {
        let quiz_id = self.state.quiz_id;

        let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = ?")
            .bind(quiz_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No quiz with id {quiz_id}")))?;

        let branch_id: i64 = sqlx::query_scalar("SELECT branch_id FROM subjects WHERE id = ?")
            .bind(quiz.subject_id)
            .fetch_one(pool)
            .await?;

        let questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE quiz_id = ? ORDER BY id",
        )
        .bind(quiz_id)
        .fetch_all(pool)
        .await?;

        Ok(QuizAttempt {
            attempt_id: self.attempt_id,
            user_id: self.user_id,
            state: InProgress {
                quiz,
                branch_id,
                questions,
            },
        })
    }
}

impl QuizAttempt<InProgress> {
    pub fn quiz(&self) -> &Quiz {
        &self.state.quiz
    }

    pub fn public_questions(&self) -> Vec<PublicQuestion> {
        self.state.questions.iter().map(PublicQuestion::from).collect()
    }

    /// Quizzes are visible to admins, to users without a branch and to users
    /// of the branch owning the quiz's subject.
    pub fn ensure_visible_to(&self, viewer: &Viewer) -> Result<(), AppError> {
        match viewer.branch_id {
            Some(branch_id) if !viewer.is_admin && branch_id != self.state.branch_id => Err(
                AppError::Forbidden("This quiz belongs to another branch".to_string()),
            ),
            _ => Ok(()),
        }
    }

    pub fn grade(self, answers: &HashMap<i64, i64>) -> QuizAttempt<Graded> {
        let grade = grade(&self.state.questions, answers);
        QuizAttempt {
            attempt_id: self.attempt_id,
            user_id: self.user_id,
            state: Graded {
                quiz: self.state.quiz,
                grade,
            },
        }
    }
}

impl QuizAttempt<Graded> {
    /// Appends the score row. An attempt id can be recorded only once.
    pub async fn record(self, pool: &SqlitePool) -> Result<QuizAttempt<Recorded>, AppError> {
        let grade = self.state.grade;

        let score = sqlx::query_as::<_, Score>(
            r#"
            INSERT INTO scores
            (quiz_id, user_id, attempt_id, score, max_score, correct_count, question_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(self.state.quiz.id)
        .bind(self.user_id)
        .bind(&self.attempt_id)
        .bind(grade.score)
        .bind(grade.max_score)
        .bind(grade.correct_count)
        .bind(grade.question_count)
        .bind(chrono::Utc::now())
        .fetch_one(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("This attempt has already been submitted".to_string())
            }
            _ => {
                tracing::error!("Failed to record score: {:?}", e);
                AppError::from(e)
            }
        })?;

        tracing::info!(
            quiz = score.quiz_id,
            user = score.user_id,
            score = score.score,
            "quiz attempt recorded"
        );

        Ok(QuizAttempt {
            attempt_id: self.attempt_id,
            user_id: self.user_id,
            state: Recorded {
                quiz: self.state.quiz,
                score,
            },
        })
    }
}

impl QuizAttempt<Recorded> {
    pub fn score(&self) -> &Score {
        &self.state.score
    }

    pub fn result(&self) -> AttemptResult {
        let score = &self.state.score;
        AttemptResult {
            quiz_id: self.state.quiz.id,
            quiz_name: self.state.quiz.name.clone(),
            score: score.score,
            max_score: score.max_score,
            question_count: score.question_count,
            percentage: percentage(score.score, score.max_score),
        }
    }
}

/// Result view of a score for a quiz, measured against the quiz's current questions.
pub async fn attempt_result(
    pool: &SqlitePool,
    quiz_id: i64,
    score: i64,
) -> Result<AttemptResult, AppError> {
    if score < 0 {
        return Err(AppError::BadRequest("Score cannot be negative".to_string()));
    }

    let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No quiz with id {quiz_id}")))?;

    let (question_count, max_score): (i64, i64) =
        sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(marks), 0) FROM questions WHERE quiz_id = ?")
            .bind(quiz_id)
            .fetch_one(pool)
            .await?;

    Ok(AttemptResult {
        quiz_id,
        quiz_name: quiz.name,
        score,
        max_score,
        question_count,
        percentage: percentage(score, max_score),
    })
}
