use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    routing::post,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::service::{self, ResumeResponse};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    export::{ExportFile, ExportFormat, render_value, sanitize_file_stem},
    extract::{AppJson, AppMultipart},
    response::ApiResponse,
};

/// Room for form fields and multipart framing on top of the file size limit
pub const MULTIPART_OVERHEAD_BYTES: usize = 256 * 1024;

pub fn routes(state: &ApiState) -> Router<ApiState> {
    Router::new()
        .route(
            "/upload/resume",
            post(upload_resume).layer(DefaultBodyLimit::max(
                state.upload.max_bytes + MULTIPART_OVERHEAD_BYTES,
            )),
        )
        .route("/upload/export", post(export_data))
}

#[utoipa::path(
    post,
    path = "/api/v1/upload/resume",
    tag = "upload",
    security(("bearer" = [])),
    request_body(content_type = "multipart/form-data", description = "PDF in the `file` field"),
    responses(
        (status = 201, description = "Resume stored", body = ResumeResponse),
        (status = 400, description = "Missing file or not a PDF"),
        (status = 413, description = "File too large"),
    )
)]
pub async fn upload_resume(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppMultipart(mut multipart): AppMultipart,
) -> Result<ApiResponse<ResumeResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let upload = service::read_resume_field(field, state.upload.max_bytes).await?;
        let resume = service::store_resume(&state, auth_user.user_id, upload).await?;
        return Ok(ApiResponse::created(resume.into()).with_message("Resume uploaded successfully"));
    }

    Err(ApiError::Validation("No file uploaded".to_string()))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportDataRequest {
    pub file_name: Option<String>,
    /// `json` or `txt`
    pub format: Option<String>,
    #[serde(default)]
    pub data: Value,
}

#[utoipa::path(
    post,
    path = "/api/v1/upload/export",
    tag = "upload",
    security(("bearer" = [])),
    request_body = ExportDataRequest,
    responses(
        (status = 200, description = "Rendered file as an attachment"),
        (status = 400, description = "No data or unsupported format"),
    )
)]
pub async fn export_data(
    _auth_user: AuthUser,
    AppJson(request): AppJson<ExportDataRequest>,
) -> Result<ExportFile, ApiError> {
    let format = ExportFormat::parse(request.format.as_deref())?;
    let body = render_value(format, &request.data)?;
    let stem = sanitize_file_stem(request.file_name.as_deref(), "export");

    Ok(ExportFile::new(&stem, format, body))
}
