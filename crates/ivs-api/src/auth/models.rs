use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use ivs_db::models::UserProfile;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 30, message = "Username must be 3 to 30 characters long"),
        custom(function = validate_username_chars)
    )]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(
        length(min = 8, max = 128, message = "Password must be 8 to 128 characters long"),
        custom(function = validate_password_strength)
    )]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email cannot be empty"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Logout body. Both fields are optional and an empty body is accepted.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub all_devices: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for UserResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    /// Number of refresh tokens deleted
    pub revoked_refresh_tokens: u64,
    pub access_token_revoked: bool,
}

fn validate_username_chars(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Ok(());
    }

    Err(ValidationError::new("username_chars").with_message(Cow::Borrowed(
        "Username can only contain letters, numbers, underscores, and hyphens",
    )))
}

fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_letter && has_digit {
        return Ok(());
    }

    Err(ValidationError::new("password_strength").with_message(Cow::Borrowed(
        "Password must contain at least one letter and one number",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ApiError, validation::validate_request};

    fn register(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn message(request: &RegisterRequest) -> String {
        match validate_request(request) {
            Err(ApiError::Validation(msg)) => msg,
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(validate_request(&register("jane_doe", "jane@example.com", "password1")).is_ok());
        assert!(validate_request(&register("a-b", "a@b.io", "abcdefg8")).is_ok());
    }

    #[test]
    fn test_username_rules() {
        assert!(message(&register("ab", "a@example.com", "password1")).contains("3 to 30"));
        assert!(
            message(&register(&"a".repeat(31), "a@example.com", "password1")).contains("3 to 30")
        );
        assert!(
            message(&register("<script>", "a@example.com", "password1"))
                .contains("letters, numbers, underscores")
        );
    }

    #[test]
    fn test_email_rules() {
        assert!(message(&register("jane", "not-an-email", "password1")).contains("Invalid email"));
        assert!(message(&register("jane", "", "password1")).contains("Invalid email"));
    }

    #[test]
    fn test_password_rules() {
        assert!(message(&register("jane", "j@example.com", "short1")).contains("8 to 128"));
        assert!(
            message(&register("jane", "j@example.com", "onlyletters")).contains("at least one letter")
        );
        assert!(
            message(&register("jane", "j@example.com", "12345678")).contains("at least one letter")
        );
        assert!(
            message(&register("jane", "j@example.com", &format!("a1{}", "x".repeat(127))))
                .contains("8 to 128")
        );
    }

    #[test]
    fn test_logout_body_defaults() {
        let body: LogoutRequest = serde_json::from_str("{}").expect("valid body");
        assert!(body.refresh_token.is_none());
        assert!(!body.all_devices);

        let body: LogoutRequest =
            serde_json::from_str(r#"{"refreshToken":"abc","allDevices":true}"#).expect("valid body");
        assert_eq!(body.refresh_token.as_deref(), Some("abc"));
        assert!(body.all_devices);
    }
}
