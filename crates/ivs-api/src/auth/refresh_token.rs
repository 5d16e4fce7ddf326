//! Opaque, single-use refresh tokens.
//!
//! Clients hold a random URL-safe token; the database only stores its
//! SHA-256 hex digest.

use base64::Engine;
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use ivs_db::repositories::token as token_repo;

use crate::error::ApiError;

/// Client identification stored alongside a refresh token
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Generate a token and its digest. The token goes to the client, the digest to
/// the database.
pub fn generate_refresh_token() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);

    let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
    let token_hash = hash_refresh_token(&token);

    (token, token_hash)
}

pub fn hash_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Create and store a refresh token inside `tx`, returning the plain token.
pub async fn issue(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    device: &DeviceInfo,
    expiry_days: i64,
) -> Result<String, ApiError> {
    let (token, token_hash) = generate_refresh_token();
    let expires_at = Utc::now() + Duration::days(expiry_days);

    token_repo::store_refresh_token(
        &mut **tx,
        user_id,
        &token_hash,
        device.user_agent.as_deref(),
        device.ip_address.as_deref(),
        expires_at,
    )
    .await?;

    Ok(token)
}

/// Outcome of presenting a refresh token
#[derive(Debug)]
pub enum Rotation {
    Rotated { user_id: Uuid, token: String },
    /// The token had expired and was deleted
    Expired,
}

/// Consume `token` and issue its replacement inside `tx`.
///
/// Unknown tokens fail. Expired ones are deleted, so the caller should commit
/// `tx` on [`Rotation::Expired`] before rejecting the request.
pub async fn rotate(
    tx: &mut Transaction<'_, Postgres>,
    token: &str,
    expiry_days: i64,
) -> Result<Rotation, ApiError> {
    let record = token_repo::find_refresh_token_by_hash(&mut **tx, &hash_refresh_token(token))
        .await?
        .ok_or_else(|| ApiError::Auth("Invalid refresh token".to_string()))?;

    token_repo::delete_refresh_token(&mut **tx, record.id).await?;

    if record.expires_at < Utc::now() {
        return Ok(Rotation::Expired);
    }

    let device = DeviceInfo {
        user_agent: record.device_info,
        ip_address: record.ip_address,
    };
    let token = issue(tx, record.user_id, &device, expiry_days).await?;

    Ok(Rotation::Rotated {
        user_id: record.user_id,
        token,
    })
}

/// Revoke one of the user's tokens. Tokens of other users are left alone.
pub async fn revoke(pool: &PgPool, user_id: Uuid, token: &str) -> Result<bool, ApiError> {
    let rows =
        token_repo::delete_user_refresh_token_by_hash(pool, user_id, &hash_refresh_token(token))
            .await?;
    Ok(rows > 0)
}

/// Logout from all devices
pub async fn revoke_all(pool: &PgPool, user_id: Uuid) -> Result<u64, ApiError> {
    Ok(token_repo::delete_all_user_refresh_tokens(pool, user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_shape() {
        let (token, hash) = generate_refresh_token();

        // 32 bytes in unpadded base64
        assert_eq!(token.len(), 43);
        assert!(!token.contains('='));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_refresh_token(&token));
    }

    #[test]
    fn test_tokens_are_unique() {
        let (a, _) = generate_refresh_token();
        let (b, _) = generate_refresh_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_known_value() {
        assert_eq!(
            hash_refresh_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
