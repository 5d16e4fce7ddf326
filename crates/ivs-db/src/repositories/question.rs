use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{
    CategoryCount, FollowUp, NewFollowUp, NewQuestion, Question, QuestionFilter,
};

/// Build an `ILIKE` pattern matching `query` anywhere, with wildcards escaped.
fn contains_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Find a question the user can see: a bank question or one generated for them.
pub async fn find_visible<'e, E>(
    executor: E,
    question_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Question>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, owner_id, text, difficulty, category, reference_answer,
                   resources, tags, source, created_at, updated_at
            FROM questions
            WHERE id = $1 AND (owner_id IS NULL OR owner_id = $2)
        "#,
    )
    .bind(question_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Visible questions among `question_ids`, in the order the ids were given.
pub async fn find_visible_by_ids<'e, E>(
    executor: E,
    user_id: Uuid,
    question_ids: &[Uuid],
) -> Result<Vec<Question>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, owner_id, text, difficulty, category, reference_answer,
                   resources, tags, source, created_at, updated_at
            FROM questions
            WHERE id = ANY($2) AND (owner_id IS NULL OR owner_id = $1)
            ORDER BY array_position($2, id)
        "#,
    )
    .bind(user_id)
    .bind(question_ids)
    .fetch_all(executor)
    .await
}

pub async fn list_visible<'e, E>(
    executor: E,
    user_id: Uuid,
    filter: &QuestionFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Question>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, owner_id, text, difficulty, category, reference_answer,
                   resources, tags, source, created_at, updated_at
            FROM questions
            WHERE (owner_id IS NULL OR owner_id = $1)
              AND ($2::text IS NULL OR category = $2)
              AND ($3::text IS NULL OR difficulty = $3)
              AND ($4::text IS NULL
                   OR text ILIKE $4
                   OR category ILIKE $4
                   OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE $4))
            ORDER BY category, created_at, id
            LIMIT $5 OFFSET $6
        "#,
    )
    .bind(user_id)
    .bind(filter.category.as_deref())
    .bind(filter.difficulty.as_deref())
    .bind(filter.query.as_deref().map(contains_pattern))
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_visible<'e, E>(
    executor: E,
    user_id: Uuid,
    filter: &QuestionFilter,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM questions
            WHERE (owner_id IS NULL OR owner_id = $1)
              AND ($2::text IS NULL OR category = $2)
              AND ($3::text IS NULL OR difficulty = $3)
              AND ($4::text IS NULL
                   OR text ILIKE $4
                   OR category ILIKE $4
                   OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE $4))
        "#,
    )
    .bind(user_id)
    .bind(filter.category.as_deref())
    .bind(filter.difficulty.as_deref())
    .bind(filter.query.as_deref().map(contains_pattern))
    .fetch_one(executor)
    .await
}

/// Shared bank questions in random order.
pub async fn list_bank<'e, E>(executor: E, limit: i64) -> Result<Vec<Question>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, owner_id, text, difficulty, category, reference_answer,
                   resources, tags, source, created_at, updated_at
            FROM questions
            WHERE owner_id IS NULL
            ORDER BY random()
            LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(executor)
    .await
}

pub async fn list_categories<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<CategoryCount>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT category, COUNT(*) AS question_count
            FROM questions
            WHERE owner_id IS NULL OR owner_id = $1
            GROUP BY category
            ORDER BY category
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn list_follow_ups<'e, E>(
    executor: E,
    question_ids: &[Uuid],
) -> Result<Vec<FollowUp>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, question_id, text, reference_answer, position
            FROM follow_ups
            WHERE question_id = ANY($1)
            ORDER BY question_id, position, id
        "#,
    )
    .bind(question_ids)
    .fetch_all(executor)
    .await
}

pub async fn find_follow_up<'e, E>(
    executor: E,
    follow_up_id: Uuid,
) -> Result<Option<FollowUp>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, question_id, text, reference_answer, position
            FROM follow_ups
            WHERE id = $1
        "#,
    )
    .bind(follow_up_id)
    .fetch_optional(executor)
    .await
}

pub async fn insert_question<'e, E>(
    executor: E,
    question: &NewQuestion,
) -> Result<Question, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO questions
                (owner_id, text, difficulty, category, reference_answer, resources, tags, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, owner_id, text, difficulty, category, reference_answer,
                      resources, tags, source, created_at, updated_at
        "#,
    )
    .bind(question.owner_id)
    .bind(&question.text)
    .bind(&question.difficulty)
    .bind(&question.category)
    .bind(&question.reference_answer)
    .bind(&question.resources)
    .bind(&question.tags)
    .bind(&question.source)
    .fetch_one(executor)
    .await
}

pub async fn insert_follow_up<'e, E>(
    executor: E,
    question_id: Uuid,
    follow_up: &NewFollowUp,
    position: i32,
) -> Result<FollowUp, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO follow_ups (question_id, text, reference_answer, position)
            VALUES ($1, $2, $3, $4)
            RETURNING id, question_id, text, reference_answer, position
        "#,
    )
    .bind(question_id)
    .bind(&follow_up.text)
    .bind(&follow_up.reference_answer)
    .bind(position)
    .fetch_one(executor)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("tcp"), "%tcp%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\"), "%c:\\\\%");
    }
}
