use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::Question;

/// Favorited question ids, newest first.
pub async fn list_ids<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT question_id
            FROM favorites
            WHERE user_id = $1
            ORDER BY created_at DESC, question_id
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Favorited questions, grouped by category for export.
pub async fn list_questions<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<Question>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT q.id, q.owner_id, q.text, q.difficulty, q.category, q.reference_answer,
                   q.resources, q.tags, q.source, q.created_at, q.updated_at
            FROM favorites f
            JOIN questions q ON q.id = f.question_id
            WHERE f.user_id = $1
            ORDER BY q.category, f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Returns `false` when the question was already a favorite.
pub async fn add<'e, E>(executor: E, user_id: Uuid, question_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO favorites (user_id, question_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, question_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(question_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn remove<'e, E>(
    executor: E,
    user_id: Uuid,
    question_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND question_id = $2")
        .bind(user_id)
        .bind(question_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}
