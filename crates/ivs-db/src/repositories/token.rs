use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::RefreshTokenRecord;

pub async fn store_refresh_token<'e, E>(
    executor: E,
    user_id: Uuid,
    token_hash: &str,
    device_info: Option<&str>,
    ip_address: Option<&str>,
    expires_at: DateTime<Utc>,
) -> Result<Uuid, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            INSERT INTO refresh_tokens (user_id, token_hash, device_info, ip_address, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(device_info)
    .bind(ip_address)
    .bind(expires_at)
    .fetch_one(executor)
    .await
}

/// Lock the token row for the rest of the transaction.
pub async fn find_refresh_token_by_hash<'e, E>(
    executor: E,
    token_hash: &str,
) -> Result<Option<RefreshTokenRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, expires_at, device_info, ip_address
            FROM refresh_tokens
            WHERE token_hash = $1
            FOR UPDATE
        "#,
    )
    .bind(token_hash)
    .fetch_optional(executor)
    .await
}

pub async fn delete_refresh_token<'e, E>(executor: E, token_id: Uuid) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
        .bind(token_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete a token only if it belongs to `user_id`.
pub async fn delete_user_refresh_token_by_hash<'e, E>(
    executor: E,
    user_id: Uuid,
    token_hash: &str,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1 AND user_id = $2")
        .bind(token_hash)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_all_user_refresh_tokens<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Returns the number of deleted tokens.
pub async fn cleanup_expired_refresh_tokens<'e, E>(executor: E) -> Result<i32, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar("SELECT cleanup_expired_refresh_tokens()")
        .fetch_one(executor)
        .await
}
