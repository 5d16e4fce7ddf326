//! Resume storage and validation.

use axum::{body::Bytes, extract::multipart::Field};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use ivs_db::{models::Resume, repositories::resume as resume_repo};

use crate::{error::ApiError, state::ApiState};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF-";

/// A validated resume read from a multipart field
#[derive(Debug)]
pub struct ResumeUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumeResponse {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Resume> for ResumeResponse {
    fn from(resume: Resume) -> Self {
        Self {
            id: resume.id,
            file_name: resume.file_name,
            content_type: resume.content_type,
            size: resume.size_bytes,
            uploaded_at: resume.uploaded_at,
        }
    }
}

/// Read a resume field, enforcing the PDF type and `max_bytes` while
/// streaming.
pub async fn read_resume_field(
    mut field: Field<'_>,
    max_bytes: usize,
) -> Result<ResumeUpload, ApiError> {
    let file_name = field
        .file_name()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("resume.pdf")
        .to_string();

    let content_type = field.content_type().unwrap_or_default();
    check_content_type(content_type)?;

    let mut buffer = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if buffer.len() + chunk.len() > max_bytes {
            return Err(too_large(max_bytes));
        }
        buffer.extend_from_slice(&chunk);
    }

    check_contents(&buffer)?;

    Ok(ResumeUpload {
        file_name,
        bytes: Bytes::from(buffer),
    })
}

fn check_content_type(content_type: &str) -> Result<(), ApiError> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case(PDF_CONTENT_TYPE) {
        Ok(())
    } else {
        Err(ApiError::InvalidFileFormat(
            "Only PDF files are accepted".to_string(),
        ))
    }
}

fn check_contents(bytes: &[u8]) -> Result<(), ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::Validation("Uploaded file is empty".to_string()));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ApiError::InvalidFileFormat(
            "File content is not a PDF document".to_string(),
        ));
    }
    Ok(())
}

fn too_large(max_bytes: usize) -> ApiError {
    ApiError::FileTooLarge(format!(
        "File exceeds the maximum size of {} KiB",
        max_bytes / 1024
    ))
}

/// Write the file to `UPLOAD_DIR/<user>/<id>.pdf` and record it.
pub async fn store_resume(
    state: &ApiState,
    user_id: Uuid,
    upload: ResumeUpload,
) -> Result<Resume, ApiError> {
    let resume_id = Uuid::new_v4();
    let dir = state.upload.dir.join(user_id.to_string());
    let path = dir.join(format!("{resume_id}.pdf"));

    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(&path, &upload.bytes).await?;

    let stored_path = path.to_string_lossy().into_owned();
    let size = i64::try_from(upload.bytes.len()).unwrap_or(i64::MAX);

    let resume = match resume_repo::insert(
        &state.pool,
        resume_id,
        user_id,
        &upload.file_name,
        &stored_path,
        PDF_CONTENT_TYPE,
        size,
    )
    .await
    {
        Ok(resume) => resume,
        Err(e) => {
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %stored_path, "Failed to remove orphaned upload: {remove_err}");
            }
            return Err(e.into());
        }
    };

    tracing::info!(%user_id, resume_id = %resume.id, size, "Resume stored");
    Ok(resume)
}

pub async fn find_resume(
    state: &ApiState,
    user_id: Uuid,
    resume_id: Uuid,
) -> Result<Resume, ApiError> {
    resume_repo::find_for_user(&state.pool, resume_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Resume not found".to_string()))
}
