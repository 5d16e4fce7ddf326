//! Mistake book: questions the user answered poorly, until marked mastered.

use axum::{
    Router,
    extract::State,
    routing::{delete, get},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use ivs_db::{
    models::Mistake,
    repositories::{mistake as mistake_repo, question as question_repo},
};

use crate::{
    ApiState,
    answer::model::MAX_ANSWER_CHARS,
    auth::AuthUser,
    error::ApiError,
    export::{self, ExportFile, ExportFormat, ExportQuery, ExportQuestion},
    extract::{AppJson, AppPath, AppQuery},
    response::ApiResponse,
    validation::{non_blank, required_text, validate_request},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/mistakes", get(list_mistakes).post(record_mistake))
        .route("/mistakes/export", get(export_mistakes))
        .route("/mistakes/{question_id}", delete(master_mistake))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MistakeRequest {
    pub question_id: Uuid,
    pub user_answer: String,
    #[validate(range(min = 0, max = 100, message = "score must be between 0 and 100"))]
    pub score: Option<i32>,
    #[validate(length(max = 10000, message = "feedback must be at most 10000 characters"))]
    pub feedback: Option<String>,
    /// Defaults to the question's category
    #[validate(length(max = 100, message = "category must be at most 100 characters"))]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MistakeResponse {
    pub question_id: Uuid,
    pub question_text: String,
    pub user_answer: String,
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub category: String,
    /// When the mistake was last recorded
    pub timestamp: DateTime<Utc>,
}

impl From<Mistake> for MistakeResponse {
    fn from(mistake: Mistake) -> Self {
        Self {
            question_id: mistake.question_id,
            question_text: mistake.question_text,
            user_answer: mistake.user_answer,
            score: mistake.score,
            feedback: mistake.feedback,
            category: mistake.category,
            timestamp: mistake.recorded_at,
        }
    }
}

impl MistakeResponse {
    fn to_export(&self) -> (String, ExportQuestion) {
        (
            self.category.clone(),
            ExportQuestion {
                text: self.question_text.clone(),
                user_answer: Some(self.user_answer.clone()),
                score: self.score,
                ..Default::default()
            },
        )
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/mistakes",
    tag = "mistakes",
    security(("bearer" = [])),
    responses((status = 200, description = "Active mistakes, newest first", body = [MistakeResponse]))
)]
pub async fn list_mistakes(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<Vec<MistakeResponse>>, ApiError> {
    let mistakes = mistake_repo::list_active(&state.pool, auth_user.user_id).await?;
    Ok(ApiResponse::ok(mistakes.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/mistakes",
    tag = "mistakes",
    security(("bearer" = [])),
    request_body = MistakeRequest,
    responses(
        (status = 201, description = "Mistake recorded or reactivated", body = MistakeResponse),
        (status = 404, description = "Question not found"),
    )
)]
pub async fn record_mistake(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppJson(request): AppJson<MistakeRequest>,
) -> Result<ApiResponse<MistakeResponse>, ApiError> {
    validate_request(&request)?;
    let user_answer = required_text(&request.user_answer, "User answer", MAX_ANSWER_CHARS)?;

    let question = question_repo::find_visible(&state.pool, request.question_id, auth_user.user_id)
        .await?
        .ok_or(ApiError::QuestionNotFound)?;
    let category = non_blank(request.category.as_deref()).unwrap_or(question.category);

    let mistake = mistake_repo::upsert(
        &state.pool,
        auth_user.user_id,
        question.id,
        &user_answer,
        request.score,
        non_blank(request.feedback.as_deref()).as_deref(),
        &category,
    )
    .await?;

    Ok(ApiResponse::created(mistake.into()).with_message("Mistake recorded"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/mistakes/{questionId}",
    tag = "mistakes",
    security(("bearer" = [])),
    params(("questionId" = Uuid, Path, description = "Question id")),
    responses(
        (status = 200, description = "Marked as mastered"),
        (status = 404, description = "No active mistake for this question"),
    )
)]
pub async fn master_mistake(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppPath(question_id): AppPath<Uuid>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    if !mistake_repo::mark_mastered(&state.pool, auth_user.user_id, question_id).await? {
        return Err(ApiError::NotFound("Mistake not found".to_string()));
    }

    Ok(
        ApiResponse::ok(serde_json::json!({ "questionId": question_id, "mastered": true }))
            .with_message("Mistake marked as mastered"),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/mistakes/export",
    tag = "mistakes",
    security(("bearer" = [])),
    params(("format" = Option<String>, Query, description = "json (default) or txt")),
    responses(
        (status = 200, description = "Active mistakes as an attachment"),
        (status = 400, description = "No mistakes or unsupported format"),
    )
)]
pub async fn export_mistakes(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppQuery(query): AppQuery<ExportQuery>,
) -> Result<ExportFile, ApiError> {
    let format = ExportFormat::parse(query.format.as_deref())?;

    let mistakes: Vec<MistakeResponse> = mistake_repo::list_active(&state.pool, auth_user.user_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    if mistakes.is_empty() {
        return Err(ApiError::Validation("No data to export".to_string()));
    }

    let groups = export::group_by_category(mistakes.iter().map(MistakeResponse::to_export));
    ExportFile::from_groups("mistakes", format, &mistakes, &groups)
}
