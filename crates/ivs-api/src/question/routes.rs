use axum::{
    Router,
    extract::{DefaultBodyLimit, State, multipart::Multipart},
    routing::{get, post},
};
use uuid::Uuid;

use super::{
    model::{
        CategoryResponse, ExportRequest, GenerateResponse, ListQuery, QuestionPage,
        QuestionResponse, SearchRequest,
    },
    service::{self, GenerateInput},
};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    export::ExportFile,
    extract::{AppJson, AppMultipart, AppPath, AppQuery},
    response::ApiResponse,
    upload::{routes::MULTIPART_OVERHEAD_BYTES, service::read_resume_field},
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/questions", get(list_questions))
        .route("/questions/categories", get(list_categories))
        .route("/questions/search", post(search_questions))
        .route("/questions/export", post(export_questions))
        .route("/questions/{id}", get(get_question))
}

/// Routes calling the AI provider, rate limited together in [`crate::v1`]
pub fn ai_routes(state: &ApiState) -> Router<ApiState> {
    Router::new().route(
        "/questions/generate",
        post(generate).layer(DefaultBodyLimit::max(
            state.upload.max_bytes + MULTIPART_OVERHEAD_BYTES,
        )),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/questions",
    tag = "questions",
    security(("bearer" = [])),
    params(
        ("category" = Option<String>, Query, description = "Exact category name"),
        ("difficulty" = Option<String>, Query, description = "easy, medium or hard"),
        ("page" = Option<i64>, Query, description = "Page number, from 1"),
        ("pageSize" = Option<i64>, Query, description = "Page size, at most 100"),
    ),
    responses((status = 200, description = "Questions grouped by category", body = QuestionPage))
)]
pub async fn list_questions(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<ApiResponse<QuestionPage>, ApiError> {
    let page = service::list(&state, auth_user.user_id, &query).await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/questions/categories",
    tag = "questions",
    security(("bearer" = [])),
    responses((status = 200, description = "Categories with question counts", body = [CategoryResponse]))
)]
pub async fn list_categories(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<Vec<CategoryResponse>>, ApiError> {
    let categories = service::categories(&state, auth_user.user_id).await?;
    Ok(ApiResponse::ok(categories))
}

#[utoipa::path(
    get,
    path = "/api/v1/questions/{id}",
    tag = "questions",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question with follow-ups", body = QuestionResponse),
        (status = 404, description = "Unknown or not visible"),
    )
)]
pub async fn get_question(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ApiResponse<QuestionResponse>, ApiError> {
    let question = service::detail(&state, auth_user.user_id, id).await?;
    Ok(ApiResponse::ok(question))
}

#[utoipa::path(
    post,
    path = "/api/v1/questions/search",
    tag = "questions",
    security(("bearer" = [])),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matching questions grouped by category", body = QuestionPage),
        (status = 400, description = "Empty query"),
    )
)]
pub async fn search_questions(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppJson(request): AppJson<SearchRequest>,
) -> Result<ApiResponse<QuestionPage>, ApiError> {
    let page = service::search(&state, auth_user.user_id, &request).await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/questions/export",
    tag = "questions",
    security(("bearer" = [])),
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Attachment in the requested format"),
        (status = 400, description = "No ids or unsupported format"),
    )
)]
pub async fn export_questions(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppJson(request): AppJson<ExportRequest>,
) -> Result<ExportFile, ApiError> {
    service::export(&state, auth_user.user_id, &request).await
}

#[utoipa::path(
    post,
    path = "/api/v1/questions/generate",
    tag = "questions",
    security(("bearer" = [])),
    request_body(
        content_type = "multipart/form-data",
        description = "Fields: file (PDF), resumeId, resumeText, jobDescription, questionCount, includeFollowUps"
    ),
    responses(
        (status = 201, description = "Generated questions grouped by category", body = GenerateResponse),
        (status = 400, description = "Invalid form"),
        (status = 413, description = "Resume too large"),
        (status = 429, description = "Rate limited"),
        (status = 502, description = "AI provider failed"),
    )
)]
pub async fn generate(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppMultipart(multipart): AppMultipart,
) -> Result<ApiResponse<GenerateResponse>, ApiError> {
    let input = read_generate_form(multipart, state.upload.max_bytes).await?;
    let response = service::generate(&state, auth_user.user_id, input).await?;
    Ok(ApiResponse::created(response).with_message("Questions generated successfully"))
}

async fn read_generate_form(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<GenerateInput, ApiError> {
    let mut input = GenerateInput::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "file" => {
                // Browsers send an empty part when no file was picked
                if field.file_name().is_none_or(str::is_empty) {
                    continue;
                }
                input.resume = Some(read_resume_field(field, max_upload_bytes).await?);
            }
            "resumeId" => {
                let value = field.text().await?;
                input.resume_id = parse_optional_uuid(&value, "resumeId")?;
            }
            "resumeText" => input.resume_text = Some(field.text().await?),
            "jobDescription" => input.job_description = field.text().await?,
            "questionCount" => {
                let value = field.text().await?;
                input.question_count = value.trim().parse().map_err(|_| {
                    ApiError::Validation("questionCount must be a positive integer".to_string())
                })?;
            }
            "includeFollowUps" => {
                input.include_follow_ups = parse_bool(&field.text().await?, "includeFollowUps")?;
            }
            _ => {}
        }
    }

    Ok(input)
}

fn parse_optional_uuid(value: &str, field: &str) -> Result<Option<Uuid>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(value)
        .map(Some)
        .map_err(|_| ApiError::Validation(format!("{field} must be a valid UUID")))
}

fn parse_bool(value: &str, field: &str) -> Result<bool, ApiError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ApiError::Validation(format!("{field} must be true or false"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true", "f").expect("ok"));
        assert!(parse_bool(" ON ", "f").expect("ok"));
        assert!(!parse_bool("0", "f").expect("ok"));
        assert!(parse_bool("maybe", "f").is_err());
    }

    #[test]
    fn test_parse_optional_uuid() {
        assert_eq!(parse_optional_uuid("  ", "resumeId").expect("ok"), None);
        let id = Uuid::new_v4();
        assert_eq!(
            parse_optional_uuid(&id.to_string(), "resumeId").expect("ok"),
            Some(id)
        );
        assert!(parse_optional_uuid("abc", "resumeId").is_err());
    }
}
