use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::jwt::{Claims, verify_access_token};
use crate::{error::ApiError, state::ApiState};

/// Authenticated caller, placed in request extensions by [`require_auth`].
///
/// # Example
/// ```
/// use ivs_api::{auth::AuthUser, error::ApiError};
///
/// async fn protected_route(auth_user: AuthUser) -> Result<String, ApiError> {
///     Ok(auth_user.user_id.to_string())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    /// `jti` of the access token used for this request
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<Claims> for AuthUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::Auth("Invalid user ID in token".to_string()))?;

        Ok(Self {
            user_id,
            expires_at: claims.expires_at(),
            email: claims.email,
            role: claims.role,
            token_id: claims.jti,
        })
    }
}

/// Token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Bearer gate for protected routes.
pub async fn require_auth(
    State(state): State<ApiState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ApiError::Auth("Missing or malformed Authorization header".to_string()))?;

    let claims = verify_access_token(token, &state.auth.jwt_secret)?;

    if let Some(cache) = &state.cache {
        if cache.is_revoked(&claims.jti).await? {
            return Err(ApiError::Auth("Token has been revoked".to_string()));
        }
    }

    let user = AuthUser::try_from(claims)?;
    tracing::debug!(user_id = %user.user_id, "Authenticated request");

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::Auth("Not authenticated".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("valid header"),
        );
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_auth_user_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims {
            sub: user_id.to_string(),
            email: "a@example.com".to_string(),
            role: "admin".to_string(),
            jti: "token-1".to_string(),
            iat: 0,
            exp: 3600,
        };

        let user = AuthUser::try_from(claims).expect("valid claims");
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.role, "admin");
        assert_eq!(user.token_id, "token-1");
        assert_eq!(user.expires_at.timestamp(), 3600);
    }

    #[test]
    fn test_auth_user_rejects_bad_subject() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            email: String::new(),
            role: "user".to_string(),
            jti: String::new(),
            iat: 0,
            exp: 0,
        };
        assert!(AuthUser::try_from(claims).is_err());
    }
}
