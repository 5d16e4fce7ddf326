use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;

/// Success envelope: `{success, data, message, code, timestamp}`
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    message: String,
    data: T,
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    success: bool,
    data: &'a T,
    message: &'a str,
    code: u16,
    timestamp: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: "Success".to_string(),
            data,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: "Created".to_string(),
            data,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            success: true,
            data: &self.data,
            message: &self.message,
            code: self.status.as_u16(),
            timestamp: Utc::now().to_rfc3339(),
        };

        (self.status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_created_envelope() {
        let response = ApiResponse::created(json!({"id": 1}))
            .with_message("Practice set created")
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("Body is not JSON");

        assert_eq!(body["success"], true);
        assert_eq!(body["code"], 201);
        assert_eq!(body["data"]["id"], 1);
        assert_eq!(body["message"], "Practice set created");
        assert!(body["timestamp"].is_string());
    }
}
