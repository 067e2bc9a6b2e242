// src/services/stats.rs
//
// Read-only aggregates over recorded scores. Every function is scoped to one
// user and never mutates.

use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::score::{AttemptSummary, HistoryEntry, SubjectTotal, UserStats},
};

/// Per-subject score totals of a user, ordered by subject id. Subjects the
/// user never attempted are absent.
pub async fn subject_totals(pool: &SqlitePool, user_id: i64) -> Result<Vec<SubjectTotal>, AppError> {
    let totals = sqlx::query_as::<_, SubjectTotal>(
        r#"
        SELECT s.id AS subject_id, s.name AS subject_name, SUM(sc.score) AS total_score
        FROM scores sc
        JOIN quizzes q ON q.id = sc.quiz_id
        JOIN subjects s ON s.id = q.subject_id
        WHERE sc.user_id = ?
        GROUP BY s.id, s.name
        ORDER BY s.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(totals)
}

/// Highest total wins; ties go to the lowest subject id.
pub fn top_subject(totals: &[SubjectTotal]) -> Option<&SubjectTotal> {
    totals.iter().fold(None, |best: Option<&SubjectTotal>, current| match best {
        Some(best)
            if best.total_score > current.total_score
                || (best.total_score == current.total_score && best.subject_id < current.subject_id) =>
        {
            Some(best)
        }
        _ => Some(current),
    })
}

pub async fn top_subject_by_score(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<SubjectTotal>, AppError> {
    let totals = subject_totals(pool, user_id).await?;
    Ok(top_subject(&totals).cloned())
}

/// Totals over every attempt of a user. All zeros when there are none.
pub async fn attempt_summary(pool: &SqlitePool, user_id: i64) -> Result<AttemptSummary, AppError> {
    let summary = sqlx::query_as::<_, AttemptSummary>(
        r#"
        SELECT
            COUNT(*) AS attempts,
            COALESCE(SUM(score), 0) AS total_score,
            COALESCE(SUM(max_score), 0) AS max_score,
            COALESCE(SUM(correct_count), 0) AS correct_answers,
            COALESCE(SUM(question_count - correct_count), 0) AS wrong_answers,
            COALESCE(SUM(max_score - score), 0) AS points_missed
        FROM scores
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(summary)
}

/// Every recorded attempt of a user, oldest first.
pub async fn attempt_history(pool: &SqlitePool, user_id: i64) -> Result<Vec<HistoryEntry>, AppError> {
    let history = sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT
            sc.id AS score_id,
            sc.quiz_id,
            q.name AS quiz_name,
            s.name AS subject_name,
            sc.score,
            sc.max_score,
            sc.created_at
        FROM scores sc
        JOIN quizzes q ON q.id = sc.quiz_id
        JOIN subjects s ON s.id = q.subject_id
        WHERE sc.user_id = ?
        ORDER BY sc.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(history)
}

pub async fn user_stats(pool: &SqlitePool, user_id: i64) -> Result<UserStats, AppError> {
    let summary = attempt_summary(pool, user_id).await?;
    let top_subject = top_subject_by_score(pool, user_id).await?;
    let history = attempt_history(pool, user_id).await?;

    tracing::debug!(user = user_id, attempts = summary.attempts, "user stats computed");

    Ok(UserStats {
        summary,
        top_subject,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(subject_id: i64, total_score: i64) -> SubjectTotal {
        SubjectTotal {
            subject_id,
            subject_name: format!("Subject {subject_id}"),
            total_score,
        }
    }

    #[test]
    fn no_attempts_means_no_top_subject() {
        assert_eq!(top_subject(&[]), None);
    }

    #[test]
    fn highest_total_wins() {
        let totals = [total(1, 10), total(2, 25), total(3, 5)];
        assert_eq!(top_subject(&totals).map(|t| t.subject_id), Some(2));
    }

    #[test]
    fn ties_resolve_to_lowest_subject_id() {
        let totals = [total(4, 20), total(2, 20), total(9, 20)];
        assert_eq!(top_subject(&totals).map(|t| t.subject_id), Some(2));
    }

    #[test]
    fn zero_totals_still_count_as_attempted() {
        let totals = [total(3, 0)];
        assert_eq!(top_subject(&totals), Some(&totals[0]));
    }
}
