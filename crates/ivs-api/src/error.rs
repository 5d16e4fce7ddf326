use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Question not found")]
    QuestionNotFound,
    #[error("Practice set not found")]
    PracticeSetNotFound,
    #[error("Question already favorited")]
    AlreadyFavorited,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),
    #[error("File too large: {0}")]
    FileTooLarge(String),
    #[error("AI service error: {0}")]
    AiService(String),
    #[error("Too many requests")]
    RateLimited,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    message: String,
    code: u16,
    error_code: &'static str,
    timestamp: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::InvalidFileFormat(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::QuestionNotFound | Self::PracticeSetNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::AlreadyFavorited | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::AiService(_) => StatusCode::BAD_GATEWAY,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_)
            | Self::Jwt(_)
            | Self::Bcrypt(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine readable code sent as `errorCode`
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "INVALID_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::QuestionNotFound => "QUESTION_NOT_FOUND",
            Self::PracticeSetNotFound => "PRACTICE_SET_NOT_FOUND",
            Self::AlreadyFavorited => "ALREADY_FAVORITED",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidFileFormat(_) => "INVALID_FILE_FORMAT",
            Self::FileTooLarge(_) => "FILE_TOO_LARGE",
            Self::AiService(_) => "AI_SERVICE_ERROR",
            Self::RateLimited => "RATE_LIMITED",
            Self::Cache(_) => "SERVICE_UNAVAILABLE",
            Self::Database(_)
            | Self::Jwt(_)
            | Self::Bcrypt(_)
            | Self::Io(_)
            | Self::Internal(_) => "UNKNOWN_ERROR",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Auth(msg)
            | Self::Forbidden(msg)
            | Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::InvalidFileFormat(msg)
            | Self::FileTooLarge(msg) => msg.clone(),
            Self::AiService(_) => "AI service is unavailable, please try again later".to_string(),
            Self::Cache(_) => "Service temporarily unavailable".to_string(),
            Self::Database(_)
            | Self::Jwt(_)
            | Self::Bcrypt(_)
            | Self::Io(_)
            | Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            Self::Database(e) => tracing::error!("Database error: {e}"),
            Self::Cache(e) => tracing::error!("Cache error: {e}"),
            Self::Jwt(e) => tracing::error!("JWT error: {e}"),
            Self::Bcrypt(e) => tracing::error!("Password hashing error: {e}"),
            Self::Io(e) => tracing::error!("I/O error: {e}"),
            Self::Internal(e) => tracing::error!("Internal error: {e}"),
            Self::AiService(e) => tracing::warn!("AI service error: {e}"),
            _ => tracing::debug!(status = %status, "Request failed: {self}"),
        }

        let body = ErrorBody {
            success: false,
            message: self.client_message(),
            code: status.as_u16(),
            error_code: self.error_code(),
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::FileTooLarge("Uploaded file is too large".to_string())
        } else {
            Self::Validation(err.body_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        (
            status,
            serde_json::from_slice(&bytes).expect("Body is not JSON"),
        )
    }

    #[test]
    fn test_status_and_code_mapping() {
        let cases = [
            (ApiError::Auth("x".into()), 401, "UNAUTHORIZED"),
            (ApiError::Forbidden("x".into()), 403, "FORBIDDEN"),
            (ApiError::Validation("x".into()), 400, "INVALID_REQUEST"),
            (ApiError::NotFound("x".into()), 404, "NOT_FOUND"),
            (ApiError::QuestionNotFound, 404, "QUESTION_NOT_FOUND"),
            (ApiError::PracticeSetNotFound, 404, "PRACTICE_SET_NOT_FOUND"),
            (ApiError::AlreadyFavorited, 409, "ALREADY_FAVORITED"),
            (ApiError::Conflict("x".into()), 409, "CONFLICT"),
            (ApiError::InvalidFileFormat("x".into()), 400, "INVALID_FILE_FORMAT"),
            (ApiError::FileTooLarge("x".into()), 413, "FILE_TOO_LARGE"),
            (ApiError::AiService("x".into()), 502, "AI_SERVICE_ERROR"),
            (ApiError::RateLimited, 429, "RATE_LIMITED"),
            (ApiError::Internal("x".into()), 500, "UNKNOWN_ERROR"),
        ];

        for (error, status, code) in cases {
            assert_eq!(error.status().as_u16(), status, "status for {error:?}");
            assert_eq!(error.error_code(), code, "code for {error:?}");
        }
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let (status, body) = body_json(ApiError::QuestionNotFound).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], 404);
        assert_eq!(body["errorCode"], "QUESTION_NOT_FOUND");
        assert_eq!(body["message"], "Question not found");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (status, body) =
            body_json(ApiError::Internal("connection string leaked".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["errorCode"], "UNKNOWN_ERROR");
    }

    #[tokio::test]
    async fn test_validation_message_is_passed_through() {
        let (_, body) = body_json(ApiError::Validation("Page must be at least 1".into())).await;
        assert_eq!(body["message"], "Page must be at least 1");
    }
}
