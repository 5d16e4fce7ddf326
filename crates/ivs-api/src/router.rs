use axum::{Json, Router, middleware, response::IntoResponse, routing::get};
use chrono::Utc;
use serde_json::json;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    docs::ApiDoc,
    error::ApiError,
    metrics::track_metrics,
    middleware::{
        cors::create_cors_layer, recovery::catch_panic_layer,
        request_id::request_id_middleware, security_headers::apply_security_headers,
    },
    state::ApiState,
    v1,
};

/// The whole HTTP surface except `/metrics`.
///
/// Layers, outermost first: panic recovery, request id, tracing, metrics,
/// CORS, security headers.
pub fn router(state: ApiState, allowed_origins: &[String]) -> Router {
    let environment = state.environment;

    let mut app = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1::routes(state.clone()))
        .fallback(handler_404);

    if environment.is_production() {
        tracing::info!("Swagger UI disabled in production");
    } else {
        app = app.merge(
            SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
    }

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    apply_security_headers(app.with_state(state), environment)
        .layer(create_cors_layer(allowed_origins))
        .layer(middleware::from_fn(track_metrics))
        .layer(trace_layer)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(catch_panic_layer())
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn handler_404() -> ApiError {
    ApiError::NotFound("The requested resource was not found".to_string())
}
