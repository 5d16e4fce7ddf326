use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{CategoryScores, DailyScores, UserTotals};

pub async fn user_totals<'e, E>(executor: E, user_id: Uuid) -> Result<UserTotals, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                (SELECT COUNT(*) FROM answers WHERE user_id = $1) AS total_answered,
                (SELECT COUNT(*) FROM answers WHERE user_id = $1 AND score IS NOT NULL)
                    AS scored_answers,
                (SELECT AVG(score)::float8 FROM answers WHERE user_id = $1) AS average_score,
                (SELECT COALESCE(SUM(time_spent), 0)::bigint FROM answers WHERE user_id = $1)
                    AS total_time_spent,
                (SELECT COUNT(*) FROM mock_interview_sessions
                    WHERE user_id = $1 AND status = 'completed') AS mock_interviews_completed,
                (SELECT COUNT(*) FROM favorites WHERE user_id = $1) AS favorites_count,
                (SELECT COUNT(*) FROM mistakes WHERE user_id = $1 AND mastered_at IS NULL)
                    AS mistakes_count,
                (SELECT COUNT(*) FROM practice_sets WHERE user_id = $1) AS practice_sets_count
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

pub async fn category_scores<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<CategoryScores>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT q.category,
                   COUNT(*) AS total_answered,
                   COALESCE(array_agg(a.score) FILTER (WHERE a.score IS NOT NULL), '{}') AS scores
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE a.user_id = $1
            GROUP BY q.category
            ORDER BY q.category
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Per-day answer counts and scores since `since`, oldest first.
pub async fn daily_scores<'e, E>(
    executor: E,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<Vec<DailyScores>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT (submitted_at AT TIME ZONE 'UTC')::date AS day,
                   COUNT(*) AS answers_count,
                   COALESCE(array_agg(score) FILTER (WHERE score IS NOT NULL), '{}') AS scores
            FROM answers
            WHERE user_id = $1 AND submitted_at >= $2
            GROUP BY day
            ORDER BY day
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(executor)
    .await
}

pub async fn count_answers_before<'e, E>(
    executor: E,
    user_id: Uuid,
    before: DateTime<Utc>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*) FROM answers WHERE user_id = $1 AND submitted_at < $2
        "#,
    )
    .bind(user_id)
    .bind(before)
    .fetch_one(executor)
    .await
}

/// Every distinct day (UTC) the user submitted an answer.
pub async fn active_days<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<NaiveDate>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT DISTINCT (submitted_at AT TIME ZONE 'UTC')::date AS day
            FROM answers
            WHERE user_id = $1
            ORDER BY day
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}
