use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{Answer, AnswerHistoryFilter, AnswerHistoryRow, NewAnswer};

/// Fails with a unique violation on `idx_answers_one_per_mock_question` when a
/// mock interview question was already answered.
pub async fn insert_answer<'e, E>(executor: E, answer: &NewAnswer) -> Result<Answer, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO answers
                (user_id, question_id, parent_answer_id, follow_up_id, mock_session_id,
                 answer_text, time_spent, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, question_id, parent_answer_id, follow_up_id, mock_session_id,
                      answer_text, time_spent, metadata, score, feedback, submitted_at, scored_at
        "#,
    )
    .bind(answer.user_id)
    .bind(answer.question_id)
    .bind(answer.parent_answer_id)
    .bind(answer.follow_up_id)
    .bind(answer.mock_session_id)
    .bind(&answer.answer_text)
    .bind(answer.time_spent)
    .bind(&answer.metadata)
    .fetch_one(executor)
    .await
}

pub async fn find_for_user<'e, E>(
    executor: E,
    answer_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Answer>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, question_id, parent_answer_id, follow_up_id, mock_session_id,
                   answer_text, time_spent, metadata, score, feedback, submitted_at, scored_at
            FROM answers
            WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(answer_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn store_score<'e, E>(
    executor: E,
    answer_id: Uuid,
    score: i32,
    feedback: &serde_json::Value,
) -> Result<Answer, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE answers
            SET score = $2, feedback = $3, scored_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, question_id, parent_answer_id, follow_up_id, mock_session_id,
                      answer_text, time_spent, metadata, score, feedback, submitted_at, scored_at
        "#,
    )
    .bind(answer_id)
    .bind(score)
    .bind(feedback)
    .fetch_one(executor)
    .await
}

/// Answers of a user with their question, newest first.
pub async fn history<'e, E>(
    executor: E,
    user_id: Uuid,
    filter: &AnswerHistoryFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<AnswerHistoryRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT a.id, a.user_id, a.question_id, a.parent_answer_id, a.follow_up_id,
                   a.mock_session_id, a.answer_text, a.time_spent, a.metadata, a.score,
                   a.feedback, a.submitted_at, a.scored_at,
                   q.text AS question_text, q.category
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE a.user_id = $1
              AND ($2::uuid IS NULL OR a.question_id = $2)
              AND ($3::text IS NULL OR q.category = $3)
              AND ($4::timestamptz IS NULL OR a.submitted_at >= $4)
              AND ($5::timestamptz IS NULL OR a.submitted_at < $5)
            ORDER BY a.submitted_at DESC, a.id
            LIMIT $6 OFFSET $7
        "#,
    )
    .bind(user_id)
    .bind(filter.question_id)
    .bind(filter.category.as_deref())
    .bind(filter.start)
    .bind(filter.end)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_history<'e, E>(
    executor: E,
    user_id: Uuid,
    filter: &AnswerHistoryFilter,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE a.user_id = $1
              AND ($2::uuid IS NULL OR a.question_id = $2)
              AND ($3::text IS NULL OR q.category = $3)
              AND ($4::timestamptz IS NULL OR a.submitted_at >= $4)
              AND ($5::timestamptz IS NULL OR a.submitted_at < $5)
        "#,
    )
    .bind(user_id)
    .bind(filter.question_id)
    .bind(filter.category.as_deref())
    .bind(filter.start)
    .bind(filter.end)
    .fetch_one(executor)
    .await
}
