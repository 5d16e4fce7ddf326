use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Token id, used to revoke a single token
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// A signed access token and the claims it carries
#[derive(Debug)]
pub struct AccessToken {
    pub token: String,
    pub claims: Claims,
}

pub fn generate_access_token(
    user_id: Uuid,
    email: &str,
    role: &str,
    jwt_secret: &str,
    expiry_hours: i64,
) -> Result<AccessToken, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(expiry_hours)).timestamp(),
    };

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;

    Ok(AccessToken { token, claims })
}

/// Check the signature and expiry of an HS256 token.
pub fn verify_access_token(token: &str, jwt_secret: &str) -> Result<Claims, ApiError> {
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Auth("Invalid or expired token".to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_jwt_secret_minimum_32_characters_long";

    #[test]
    fn test_generate_and_verify_access_token() {
        let user_id = Uuid::new_v4();

        let issued = generate_access_token(user_id, "test@example.com", "user", SECRET, 24)
            .expect("Failed to generate token");
        let claims = verify_access_token(&issued.token, SECRET).expect("Failed to verify token");

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, "user");
        assert_eq!(claims.jti, issued.claims.jti);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_token_ids_are_unique() {
        let user_id = Uuid::new_v4();
        let a = generate_access_token(user_id, "a@example.com", "user", SECRET, 1).expect("token");
        let b = generate_access_token(user_id, "a@example.com", "user", SECRET, 1).expect("token");
        assert_ne!(a.claims.jti, b.claims.jti);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = generate_access_token(Uuid::new_v4(), "a@example.com", "user", SECRET, 1)
            .expect("token");

        let result = verify_access_token(&issued.token, "wrong_jwt_secret_minimum_32_characters_long");
        assert!(matches!(result, Err(ApiError::Auth(msg)) if msg.contains("Invalid or expired")));
    }

    #[test]
    fn test_expired_token_rejected() {
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "a@example.com".to_string(),
            role: "user".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: (past - Duration::hours(1)).timestamp(),
            exp: past.timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("Failed to encode");

        assert!(verify_access_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_access_token("invalid.jwt.token", SECRET).is_err());
    }

    #[test]
    fn test_expires_at() {
        let issued = generate_access_token(Uuid::new_v4(), "a@example.com", "admin", SECRET, 2)
            .expect("token");
        assert_eq!(issued.claims.expires_at().timestamp(), issued.claims.exp);
    }
}
