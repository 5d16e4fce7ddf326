use chrono::Utc;
use uuid::Uuid;

use ivs_db::repositories::user as user_repo;

use super::{
    jwt::{self, AccessToken},
    middleware::AuthUser,
    models::{
        AuthResponse, LoginRequest, LogoutRequest, LogoutResponse, RefreshRequest,
        RegisterRequest, TokenPair, UserResponse,
    },
    refresh_token::{self as rt, DeviceInfo, Rotation},
};
use crate::{error::ApiError, metrics::record_auth_event, state::ApiState, validation::validate_request};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const TOKEN_TYPE: &str = "Bearer";

pub async fn register(
    state: &ApiState,
    request: RegisterRequest,
    device: &DeviceInfo,
) -> Result<AuthResponse, ApiError> {
    validate_request(&request)?;

    let username = request.username.trim().to_string();
    let email = request.email.trim().to_lowercase();
    let password_hash = hash_password(request.password, state.auth.bcrypt_cost).await?;

    let mut tx = state.pool.begin().await?;

    let user = match user_repo::create_user(&mut *tx, &username, &email, &password_hash).await {
        Ok(user) => user,
        Err(sqlx::Error::Database(db_err)) if db_err.constraint() == Some("users_email_key") => {
            record_auth_event("register", false);
            return Err(ApiError::Conflict("Email is already registered".to_string()));
        }
        Err(sqlx::Error::Database(db_err)) if db_err.constraint() == Some("users_username_key") => {
            record_auth_event("register", false);
            return Err(ApiError::Conflict("Username is already taken".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let refresh_token =
        rt::issue(&mut tx, user.id, device, state.auth.refresh_token_expiry_days).await?;
    tx.commit().await?;

    let access = jwt::generate_access_token(
        user.id,
        &user.email,
        &user.role,
        &state.auth.jwt_secret,
        state.auth.jwt_expiry_hours,
    )?;

    tracing::info!(user_id = %user.id, "User registered");
    record_auth_event("register", true);

    Ok(auth_response(state, access, refresh_token, user.into()))
}

pub async fn login(
    state: &ApiState,
    request: LoginRequest,
    device: &DeviceInfo,
) -> Result<AuthResponse, ApiError> {
    validate_request(&request)?;

    let email = request.email.trim().to_lowercase();
    let Some(credentials) = user_repo::find_credentials_by_email(&state.pool, &email).await? else {
        record_auth_event("login", false);
        return Err(ApiError::Auth(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(request.password, credentials.password_hash).await? {
        tracing::info!(user_id = %credentials.id, "Login rejected: wrong password");
        record_auth_event("login", false);
        return Err(ApiError::Auth(INVALID_CREDENTIALS.to_string()));
    }

    let user = user_repo::find_profile_by_id(&state.pool, credentials.id)
        .await?
        .ok_or_else(|| ApiError::Auth(INVALID_CREDENTIALS.to_string()))?;

    let mut tx = state.pool.begin().await?;
    let refresh_token =
        rt::issue(&mut tx, user.id, device, state.auth.refresh_token_expiry_days).await?;
    tx.commit().await?;

    let access = jwt::generate_access_token(
        user.id,
        &user.email,
        &user.role,
        &state.auth.jwt_secret,
        state.auth.jwt_expiry_hours,
    )?;

    record_auth_event("login", true);
    Ok(auth_response(state, access, refresh_token, user.into()))
}

/// Exchange a refresh token for a new access token and a new refresh token.
pub async fn refresh(state: &ApiState, request: RefreshRequest) -> Result<TokenPair, ApiError> {
    validate_request(&request)?;

    let mut tx = state.pool.begin().await?;
    let rotation = rt::rotate(
        &mut tx,
        request.refresh_token.trim(),
        state.auth.refresh_token_expiry_days,
    )
    .await;

    let (user_id, refresh_token) = match rotation {
        Ok(Rotation::Rotated { user_id, token }) => (user_id, token),
        Ok(Rotation::Expired) => {
            tx.commit().await?;
            record_auth_event("refresh", false);
            return Err(ApiError::Auth("Refresh token expired".to_string()));
        }
        Err(e) => {
            record_auth_event("refresh", false);
            return Err(e);
        }
    };

    let (email, role) = user_repo::find_email_and_role(&mut *tx, user_id)
        .await?
        .ok_or_else(|| ApiError::Auth("User not found".to_string()))?;
    tx.commit().await?;

    let access = jwt::generate_access_token(
        user_id,
        &email,
        &role,
        &state.auth.jwt_secret,
        state.auth.jwt_expiry_hours,
    )?;

    record_auth_event("refresh", true);
    Ok(TokenPair {
        token: access.token,
        refresh_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: expires_in(state),
    })
}

/// Revoke refresh tokens and deny-list the access token used for the call.
pub async fn logout(
    state: &ApiState,
    user: &AuthUser,
    request: LogoutRequest,
) -> Result<LogoutResponse, ApiError> {
    let revoked_refresh_tokens = if request.all_devices {
        rt::revoke_all(&state.pool, user.user_id).await?
    } else {
        match request.refresh_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => {
                u64::from(rt::revoke(&state.pool, user.user_id, token).await?)
            }
            _ => 0,
        }
    };

    let access_token_revoked = match &state.cache {
        Some(cache) => {
            let ttl = (user.expires_at - Utc::now()).num_seconds().max(0);
            cache.revoke(&user.token_id, ttl.unsigned_abs()).await?;
            true
        }
        None => false,
    };

    tracing::info!(
        user_id = %user.user_id,
        revoked_refresh_tokens,
        access_token_revoked,
        "User logged out"
    );
    record_auth_event("logout", true);

    Ok(LogoutResponse {
        revoked_refresh_tokens,
        access_token_revoked,
    })
}

pub async fn profile(state: &ApiState, user_id: Uuid) -> Result<UserResponse, ApiError> {
    user_repo::find_profile_by_id(&state.pool, user_id)
        .await?
        .map(UserResponse::from)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

fn auth_response(
    state: &ApiState,
    access: AccessToken,
    refresh_token: String,
    user: UserResponse,
) -> AuthResponse {
    AuthResponse {
        token: access.token,
        refresh_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: expires_in(state),
        user,
    }
}

fn expires_in(state: &ApiState) -> i64 {
    state.auth.jwt_expiry_hours * 3600
}

/// bcrypt is CPU bound, so it runs on the blocking pool.
async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(ApiError::from)
}

async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("password check task failed: {e}")))?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_password_hash_roundtrip() {
        let hash = hash_password("password1".to_string(), 4).await.expect("hash");
        assert!(hash.starts_with("$2"));
        assert!(verify_password("password1".to_string(), hash.clone()).await.expect("verify"));
        assert!(!verify_password("password2".to_string(), hash).await.expect("verify"));
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_an_error() {
        assert!(verify_password("password1".to_string(), "not-a-hash".to_string()).await.is_err());
    }
}
