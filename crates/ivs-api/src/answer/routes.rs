use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use uuid::Uuid;

use super::{
    model::{
        AnswerResponse, AnswerStatistics, HistoryPage, HistoryQuery, ScoreResponse,
        SubmitAnswerRequest,
    },
    service,
};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    response::ApiResponse,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/answers", post(submit_answer))
        .route("/answers/history", get(answer_history))
        .route("/answers/statistics", get(answer_statistics))
}

/// Routes calling the AI provider, rate limited together in [`crate::v1`]
pub fn ai_routes() -> Router<ApiState> {
    Router::new().route("/answers/{id}/ai-score", post(score_answer))
}

#[utoipa::path(
    post,
    path = "/api/v1/answers",
    tag = "answers",
    security(("bearer" = [])),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 201, description = "Answer stored", body = AnswerResponse),
        (status = 400, description = "Invalid answer"),
        (status = 404, description = "Question, parent answer or follow-up not found"),
    )
)]
pub async fn submit_answer(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppJson(request): AppJson<SubmitAnswerRequest>,
) -> Result<ApiResponse<AnswerResponse>, ApiError> {
    let answer = service::submit(&state, auth_user.user_id, request).await?;
    Ok(ApiResponse::created(answer).with_message("Answer submitted successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/answers/{id}/ai-score",
    tag = "answers",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Answer id")),
    responses(
        (status = 200, description = "Score and feedback", body = ScoreResponse),
        (status = 404, description = "Answer not found"),
        (status = 429, description = "Rate limited"),
        (status = 502, description = "AI provider failed"),
    )
)]
pub async fn score_answer(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ApiResponse<ScoreResponse>, ApiError> {
    let score = service::score(&state, auth_user.user_id, id).await?;
    Ok(ApiResponse::ok(score).with_message("Answer scored successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/answers/history",
    tag = "answers",
    security(("bearer" = [])),
    params(
        ("questionId" = Option<Uuid>, Query, description = "Only answers to this question"),
        ("category" = Option<String>, Query, description = "Only answers in this category"),
        ("startDate" = Option<String>, Query, description = "YYYY-MM-DD or RFC 3339"),
        ("endDate" = Option<String>, Query, description = "YYYY-MM-DD (inclusive) or RFC 3339"),
        ("page" = Option<i64>, Query, description = "Page number, from 1"),
        ("pageSize" = Option<i64>, Query, description = "Page size, at most 100"),
    ),
    responses((status = 200, description = "Answers, newest first", body = HistoryPage))
)]
pub async fn answer_history(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppQuery(query): AppQuery<HistoryQuery>,
) -> Result<ApiResponse<HistoryPage>, ApiError> {
    let page = service::history(&state, auth_user.user_id, &query).await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/answers/statistics",
    tag = "answers",
    security(("bearer" = [])),
    responses((status = 200, description = "Answer totals per category and recent days", body = AnswerStatistics))
)]
pub async fn answer_statistics(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<AnswerStatistics>, ApiError> {
    let statistics = service::statistics(&state, auth_user.user_id).await?;
    Ok(ApiResponse::ok(statistics))
}
