use axum::{
    Router,
    extract::State,
    routing::{get, put},
};
use uuid::Uuid;

use super::{
    model::{
        AddQuestionRequest, CreatePracticeSetRequest, PracticeSetResponse,
        UpdatePracticeSetRequest,
    },
    service,
};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    export::{ExportFile, ExportFormat, ExportQuery},
    extract::{AppJson, AppPath, AppQuery},
    question::model::QuestionResponse,
    response::ApiResponse,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/practice-sets", get(list_practice_sets).post(create_practice_set))
        .route(
            "/practice-sets/{id}",
            put(update_practice_set).delete(delete_practice_set),
        )
        .route(
            "/practice-sets/{id}/questions",
            get(list_set_questions).post(add_set_question),
        )
        .route("/practice-sets/{id}/export", get(export_practice_set))
}

#[utoipa::path(
    get,
    path = "/api/v1/practice-sets",
    tag = "practice-sets",
    security(("bearer" = [])),
    responses((status = 200, description = "Own practice sets, recently updated first", body = [PracticeSetResponse]))
)]
pub async fn list_practice_sets(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<Vec<PracticeSetResponse>>, ApiError> {
    let sets = service::list(&state, auth_user.user_id).await?;
    Ok(ApiResponse::ok(sets))
}

#[utoipa::path(
    post,
    path = "/api/v1/practice-sets",
    tag = "practice-sets",
    security(("bearer" = [])),
    request_body = CreatePracticeSetRequest,
    responses(
        (status = 201, description = "Practice set created", body = PracticeSetResponse),
        (status = 400, description = "Invalid name or description"),
    )
)]
pub async fn create_practice_set(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppJson(request): AppJson<CreatePracticeSetRequest>,
) -> Result<ApiResponse<PracticeSetResponse>, ApiError> {
    let set = service::create(&state, auth_user.user_id, &request).await?;
    Ok(ApiResponse::created(set).with_message("Practice set created"))
}

#[utoipa::path(
    put,
    path = "/api/v1/practice-sets/{id}",
    tag = "practice-sets",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Practice set id")),
    request_body = UpdatePracticeSetRequest,
    responses(
        (status = 200, description = "Practice set updated", body = PracticeSetResponse),
        (status = 400, description = "Invalid or empty update"),
        (status = 404, description = "Unknown practice set"),
    )
)]
pub async fn update_practice_set(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdatePracticeSetRequest>,
) -> Result<ApiResponse<PracticeSetResponse>, ApiError> {
    let set = service::update(&state, auth_user.user_id, id, &request).await?;
    Ok(ApiResponse::ok(set).with_message("Practice set updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/practice-sets/{id}",
    tag = "practice-sets",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Practice set id")),
    responses(
        (status = 200, description = "Practice set deleted"),
        (status = 404, description = "Unknown practice set"),
    )
)]
pub async fn delete_practice_set(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    service::delete(&state, auth_user.user_id, id).await?;
    Ok(ApiResponse::ok(()).with_message("Practice set deleted"))
}

#[utoipa::path(
    get,
    path = "/api/v1/practice-sets/{id}/questions",
    tag = "practice-sets",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Practice set id")),
    responses(
        (status = 200, description = "Questions in the order they were added", body = [QuestionResponse]),
        (status = 404, description = "Unknown or private practice set"),
    )
)]
pub async fn list_set_questions(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ApiResponse<Vec<QuestionResponse>>, ApiError> {
    let questions = service::questions(&state, auth_user.user_id, id).await?;
    Ok(ApiResponse::ok(questions))
}

#[utoipa::path(
    post,
    path = "/api/v1/practice-sets/{id}/questions",
    tag = "practice-sets",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Practice set id")),
    request_body = AddQuestionRequest,
    responses(
        (status = 201, description = "Question added", body = PracticeSetResponse),
        (status = 404, description = "Unknown practice set or question"),
        (status = 409, description = "Question already in practice set"),
    )
)]
pub async fn add_set_question(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<AddQuestionRequest>,
) -> Result<ApiResponse<PracticeSetResponse>, ApiError> {
    let set = service::add_question(&state, auth_user.user_id, id, request.question_id).await?;
    Ok(ApiResponse::created(set).with_message("Question added to practice set"))
}

#[utoipa::path(
    get,
    path = "/api/v1/practice-sets/{id}/export",
    tag = "practice-sets",
    security(("bearer" = [])),
    params(
        ("id" = Uuid, Path, description = "Practice set id"),
        ("format" = Option<String>, Query, description = "json (default) or txt"),
    ),
    responses(
        (status = 200, description = "Practice set questions as an attachment"),
        (status = 400, description = "Empty set or unsupported format"),
        (status = 404, description = "Unknown or private practice set"),
    )
)]
pub async fn export_practice_set(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(query): AppQuery<ExportQuery>,
) -> Result<ExportFile, ApiError> {
    let format = ExportFormat::parse(query.format.as_deref())?;
    service::export(&state, auth_user.user_id, id, format).await
}
