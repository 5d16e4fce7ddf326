use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use uuid::Uuid;

use super::{
    model::{
        EndResponse, MockAnswerRequest, MockAnswerResponse, ReportResponse, SessionResponse,
        StartRequest,
    },
    service,
};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    extract::{AppJson, AppPath},
    response::ApiResponse,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/mock-interview", post(start_mock_interview))
        .route("/mock-interview/{session_id}/end", post(end_mock_interview))
        .route("/mock-interview/{session_id}/report", get(mock_interview_report))
}

/// Routes calling the AI provider, rate limited together in [`crate::v1`]
pub fn ai_routes() -> Router<ApiState> {
    Router::new().route("/mock-interview/{session_id}/answers", post(submit_mock_answer))
}

#[utoipa::path(
    post,
    path = "/api/v1/mock-interview",
    tag = "mock-interview",
    security(("bearer" = [])),
    request_body = StartRequest,
    responses(
        (status = 201, description = "Session started", body = SessionResponse),
        (status = 400, description = "Invalid settings or not enough questions"),
    )
)]
pub async fn start_mock_interview(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppJson(request): AppJson<StartRequest>,
) -> Result<ApiResponse<SessionResponse>, ApiError> {
    let session = service::start(&state, auth_user.user_id, request).await?;
    Ok(ApiResponse::created(session).with_message("Mock interview started"))
}

#[utoipa::path(
    post,
    path = "/api/v1/mock-interview/{sessionId}/answers",
    tag = "mock-interview",
    security(("bearer" = [])),
    params(("sessionId" = Uuid, Path, description = "Session id")),
    request_body = MockAnswerRequest,
    responses(
        (status = 201, description = "Answer recorded and scored", body = MockAnswerResponse),
        (status = 400, description = "Question not in session or invalid answer"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Session closed, time is up or question already answered"),
        (status = 429, description = "Rate limited"),
        (status = 502, description = "AI provider failure, the answer is not kept"),
    )
)]
pub async fn submit_mock_answer(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppPath(session_id): AppPath<Uuid>,
    AppJson(request): AppJson<MockAnswerRequest>,
) -> Result<ApiResponse<MockAnswerResponse>, ApiError> {
    let answer = service::submit_answer(&state, auth_user.user_id, session_id, request).await?;
    Ok(ApiResponse::created(answer).with_message("Answer submitted successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/mock-interview/{sessionId}/end",
    tag = "mock-interview",
    security(("bearer" = [])),
    params(("sessionId" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session completed", body = EndResponse),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Already completed"),
    )
)]
pub async fn end_mock_interview(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppPath(session_id): AppPath<Uuid>,
) -> Result<ApiResponse<EndResponse>, ApiError> {
    let ended = service::end(&state, auth_user.user_id, session_id).await?;
    Ok(ApiResponse::ok(ended).with_message("Mock interview completed"))
}

#[utoipa::path(
    get,
    path = "/api/v1/mock-interview/{sessionId}/report",
    tag = "mock-interview",
    security(("bearer" = [])),
    params(("sessionId" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Per-question results and summary", body = ReportResponse),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Session not completed yet"),
    )
)]
pub async fn mock_interview_report(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppPath(session_id): AppPath<Uuid>,
) -> Result<ApiResponse<ReportResponse>, ApiError> {
    let report = service::report(&state, auth_user.user_id, session_id).await?;
    Ok(ApiResponse::ok(report))
}
