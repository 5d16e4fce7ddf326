//! Per-IP rate limiting for credential and AI endpoints.

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

use crate::error::ApiError;

/// Credential endpoints: one token every 200ms, bursts of 10
pub const AUTH_REPLENISH_MS: u64 = 200;
pub const AUTH_BURST_SIZE: u32 = 10;

/// AI-backed endpoints, one shared bucket: one token every 2s, bursts of 5
pub const AI_REPLENISH_MS: u64 = 2000;
pub const AI_BURST_SIZE: u32 = 5;

/// Limit `router` per client IP.
///
/// The IP is taken from `X-Forwarded-For`, `X-Real-IP` or `Forwarded`, and
/// from the peer address otherwise, so the server must be started with
/// connect info.
pub fn limit<S>(router: Router<S>, replenish_ms: u64, burst_size: u32) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let Some(config) = GovernorConfigBuilder::default()
        .per_millisecond(replenish_ms)
        .burst_size(burst_size)
        .key_extractor(SmartIpKeyExtractor)
        .use_headers()
        .finish()
    else {
        tracing::error!(
            replenish_ms,
            burst_size,
            "Invalid rate limit settings, routes are not rate limited"
        );
        return router;
    };

    router
        .layer(GovernorLayer::new(Arc::new(config)))
        .layer(middleware::map_response(rate_limited_envelope))
}

/// Give the limiter's plain-text 429 the standard error body, keeping its
/// retry headers.
async fn rate_limited_envelope(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let (parts, _) = response.into_parts();
    let mut limited = ApiError::RateLimited.into_response();
    for (name, value) in parts.headers.iter() {
        if name.as_str().starts_with("x-ratelimit") || name == axum::http::header::RETRY_AFTER {
            limited.headers_mut().insert(name.clone(), value.clone());
        }
    }
    limited
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn request() -> Request<Body> {
        Request::builder()
            .uri("/limited")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .expect("Failed to build request")
    }

    #[tokio::test]
    async fn test_burst_then_rate_limited_envelope() {
        let app = limit(
            Router::new().route("/limited", get(|| async { "OK" })),
            60_000,
            2,
        );

        for _ in 0..2 {
            let response = app.clone().oneshot(request()).await.expect("Request failed");
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.oneshot(request()).await.expect("Request failed");
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("Body is not JSON");
        assert_eq!(body["errorCode"], "RATE_LIMITED");
        assert_eq!(body["code"], 429);
    }
}
