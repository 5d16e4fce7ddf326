use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{MockSession, MockSessionItem};

#[allow(clippy::too_many_arguments)]
pub async fn create_session<'e, E>(
    executor: E,
    user_id: Uuid,
    role: &str,
    custom_topic: Option<&str>,
    duration_minutes: i32,
    question_count: i32,
    started_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> Result<MockSession, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO mock_interview_sessions
                (user_id, role, custom_topic, duration_minutes, question_count, started_at, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, role, custom_topic, duration_minutes, question_count, status,
                      started_at, ends_at, completed_at, overall_score
        "#,
    )
    .bind(user_id)
    .bind(role)
    .bind(custom_topic)
    .bind(duration_minutes)
    .bind(question_count)
    .bind(started_at)
    .bind(ends_at)
    .fetch_one(executor)
    .await
}

pub async fn add_session_question<'e, E>(
    executor: E,
    session_id: Uuid,
    question_id: Uuid,
    position: i32,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO mock_interview_questions (session_id, question_id, position)
            VALUES ($1, $2, $3)
        "#,
    )
    .bind(session_id)
    .bind(question_id)
    .bind(position)
    .execute(executor)
    .await?;
    Ok(())
}

/// Lock the session row for the rest of the transaction.
pub async fn find_for_user_for_update<'e, E>(
    executor: E,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<Option<MockSession>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, role, custom_topic, duration_minutes, question_count, status,
                   started_at, ends_at, completed_at, overall_score
            FROM mock_interview_sessions
            WHERE id = $1 AND user_id = $2
            FOR UPDATE
        "#,
    )
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_for_user<'e, E>(
    executor: E,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<Option<MockSession>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, role, custom_topic, duration_minutes, question_count, status,
                   started_at, ends_at, completed_at, overall_score
            FROM mock_interview_sessions
            WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn session_has_question<'e, E>(
    executor: E,
    session_id: Uuid,
    question_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT EXISTS(
                SELECT 1 FROM mock_interview_questions
                WHERE session_id = $1 AND question_id = $2
            )
        "#,
    )
    .bind(session_id)
    .bind(question_id)
    .fetch_one(executor)
    .await
}

/// Session questions in order, each with the answer given in the session.
pub async fn list_items<'e, E>(
    executor: E,
    session_id: Uuid,
) -> Result<Vec<MockSessionItem>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT miq.position, q.id AS question_id, q.text, q.difficulty, q.category,
                   q.reference_answer, a.id AS answer_id, a.answer_text, a.score, a.feedback,
                   a.time_spent
            FROM mock_interview_questions miq
            JOIN questions q ON q.id = miq.question_id
            LEFT JOIN answers a
                   ON a.mock_session_id = miq.session_id AND a.question_id = miq.question_id
            WHERE miq.session_id = $1
            ORDER BY miq.position
        "#,
    )
    .bind(session_id)
    .fetch_all(executor)
    .await
}

pub async fn mark_expired<'e, E>(executor: E, session_id: Uuid) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE mock_interview_sessions
            SET status = 'expired'
            WHERE id = $1 AND status = 'in_progress'
        "#,
    )
    .bind(session_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Move an `in_progress` or `expired` session to `completed`.
/// Returns `None` when the session was already completed.
pub async fn complete<'e, E>(
    executor: E,
    session_id: Uuid,
    overall_score: i32,
) -> Result<Option<MockSession>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE mock_interview_sessions
            SET status = 'completed', completed_at = NOW(), overall_score = $2
            WHERE id = $1 AND status IN ('in_progress', 'expired')
            RETURNING id, user_id, role, custom_topic, duration_minutes, question_count, status,
                      started_at, ends_at, completed_at, overall_score
        "#,
    )
    .bind(session_id)
    .bind(overall_score)
    .fetch_optional(executor)
    .await
}

/// Expire every `in_progress` session past its deadline.
pub async fn expire_overdue<'e, E>(executor: E) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE mock_interview_sessions
            SET status = 'expired'
            WHERE status = 'in_progress' AND ends_at < NOW()
        "#,
    )
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}
