use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::Mistake;

/// Active mistakes, most recent first.
pub async fn list_active<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Mistake>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT m.id, m.user_id, m.question_id, q.text AS question_text, m.user_answer,
                   m.score, m.feedback, m.category, m.recorded_at, m.mastered_at
            FROM mistakes m
            JOIN questions q ON q.id = m.question_id
            WHERE m.user_id = $1 AND m.mastered_at IS NULL
            ORDER BY m.recorded_at DESC, m.id
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Record a mistake, replacing the previous entry for the same question and
/// reactivating it if it had been mastered.
pub async fn upsert<'e, E>(
    executor: E,
    user_id: Uuid,
    question_id: Uuid,
    user_answer: &str,
    score: Option<i32>,
    feedback: Option<&str>,
    category: &str,
) -> Result<Mistake, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            WITH m AS (
                INSERT INTO mistakes (user_id, question_id, user_answer, score, feedback, category)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (user_id, question_id) DO UPDATE
                SET user_answer = EXCLUDED.user_answer,
                    score = EXCLUDED.score,
                    feedback = EXCLUDED.feedback,
                    category = EXCLUDED.category,
                    recorded_at = NOW(),
                    mastered_at = NULL
                RETURNING *
            )
            SELECT m.id, m.user_id, m.question_id, q.text AS question_text, m.user_answer,
                   m.score, m.feedback, m.category, m.recorded_at, m.mastered_at
            FROM m
            JOIN questions q ON q.id = m.question_id
        "#,
    )
    .bind(user_id)
    .bind(question_id)
    .bind(user_answer)
    .bind(score)
    .bind(feedback)
    .bind(category)
    .fetch_one(executor)
    .await
}

/// Returns `false` when there is no active mistake for the question.
pub async fn mark_mastered<'e, E>(
    executor: E,
    user_id: Uuid,
    question_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE mistakes
            SET mastered_at = NOW()
            WHERE user_id = $1 AND question_id = $2 AND mastered_at IS NULL
        "#,
    )
    .bind(user_id)
    .bind(question_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}
