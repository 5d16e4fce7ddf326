use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{PracticeSet, Question};

pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<PracticeSet>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT ps.id, ps.user_id, ps.name, ps.description, ps.is_public,
                   COALESCE(
                       ARRAY(SELECT psq.question_id FROM practice_set_questions psq
                             WHERE psq.practice_set_id = ps.id
                             ORDER BY psq.added_at, psq.question_id),
                       '{}'
                   ) AS question_ids,
                   ps.created_at, ps.updated_at
            FROM practice_sets ps
            WHERE ps.user_id = $1
            ORDER BY ps.updated_at DESC, ps.id
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn find_by_id<'e, E>(
    executor: E,
    practice_set_id: Uuid,
) -> Result<Option<PracticeSet>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT ps.id, ps.user_id, ps.name, ps.description, ps.is_public,
                   COALESCE(
                       ARRAY(SELECT psq.question_id FROM practice_set_questions psq
                             WHERE psq.practice_set_id = ps.id
                             ORDER BY psq.added_at, psq.question_id),
                       '{}'
                   ) AS question_ids,
                   ps.created_at, ps.updated_at
            FROM practice_sets ps
            WHERE ps.id = $1
        "#,
    )
    .bind(practice_set_id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e, E>(
    executor: E,
    user_id: Uuid,
    name: &str,
    description: Option<&str>,
    is_public: bool,
) -> Result<Uuid, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            INSERT INTO practice_sets (user_id, name, description, is_public)
            VALUES ($1, $2, $3, $4)
            RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(description)
    .bind(is_public)
    .fetch_one(executor)
    .await
}

/// Update the given fields of a set owned by `user_id`. `description` is
/// cleared when `Some(None)`. Returns `false` when no such set exists.
pub async fn update<'e, E>(
    executor: E,
    practice_set_id: Uuid,
    user_id: Uuid,
    name: Option<&str>,
    description: Option<Option<&str>>,
    is_public: Option<bool>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE practice_sets
            SET name = COALESCE($3, name),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                is_public = COALESCE($6, is_public),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(practice_set_id)
    .bind(user_id)
    .bind(name)
    .bind(description.is_some())
    .bind(description.flatten())
    .bind(is_public)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn delete<'e, E>(
    executor: E,
    practice_set_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM practice_sets WHERE id = $1 AND user_id = $2")
        .bind(practice_set_id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Returns `false` when the question is already in the set.
pub async fn add_question<'e, E>(
    executor: E,
    practice_set_id: Uuid,
    question_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO practice_set_questions (practice_set_id, question_id)
            VALUES ($1, $2)
            ON CONFLICT (practice_set_id, question_id) DO NOTHING
        "#,
    )
    .bind(practice_set_id)
    .bind(question_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn touch<'e, E>(executor: E, practice_set_id: Uuid) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE practice_sets SET updated_at = NOW() WHERE id = $1")
        .bind(practice_set_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Questions of a set in the order they were added.
pub async fn list_questions<'e, E>(
    executor: E,
    practice_set_id: Uuid,
) -> Result<Vec<Question>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT q.id, q.owner_id, q.text, q.difficulty, q.category, q.reference_answer,
                   q.resources, q.tags, q.source, q.created_at, q.updated_at
            FROM practice_set_questions psq
            JOIN questions q ON q.id = psq.question_id
            WHERE psq.practice_set_id = $1
            ORDER BY psq.added_at, psq.question_id
        "#,
    )
    .bind(practice_set_id)
    .fetch_all(executor)
    .await
}
