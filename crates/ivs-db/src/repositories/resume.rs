use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::Resume;

pub async fn insert<'e, E>(
    executor: E,
    resume_id: Uuid,
    user_id: Uuid,
    file_name: &str,
    stored_path: &str,
    content_type: &str,
    size_bytes: i64,
) -> Result<Resume, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO resumes (id, user_id, file_name, stored_path, content_type, size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, file_name, stored_path, content_type, size_bytes, uploaded_at
        "#,
    )
    .bind(resume_id)
    .bind(user_id)
    .bind(file_name)
    .bind(stored_path)
    .bind(content_type)
    .bind(size_bytes)
    .fetch_one(executor)
    .await
}

pub async fn find_for_user<'e, E>(
    executor: E,
    resume_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Resume>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, file_name, stored_path, content_type, size_bytes, uploaded_at
            FROM resumes
            WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(resume_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}
