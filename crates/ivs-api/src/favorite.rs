//! Favorite questions.

use axum::{
    Router,
    extract::State,
    routing::{delete, get},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use ivs_db::repositories::{favorite as favorite_repo, question as question_repo};

use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    export::{ExportFile, ExportFormat, ExportQuery},
    extract::{AppJson, AppPath, AppQuery},
    question::service::export_questions,
    response::ApiResponse,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/favorites", get(list_favorites).post(add_favorite))
        .route("/favorites/export", get(export_favorites))
        .route("/favorites/{question_id}", delete(remove_favorite))
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub question_id: Uuid,
}

#[utoipa::path(
    get,
    path = "/api/v1/favorites",
    tag = "favorites",
    security(("bearer" = [])),
    responses((status = 200, description = "Favorited question ids, newest first", body = [Uuid]))
)]
pub async fn list_favorites(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<ApiResponse<Vec<Uuid>>, ApiError> {
    let ids = favorite_repo::list_ids(&state.pool, auth_user.user_id).await?;
    Ok(ApiResponse::ok(ids))
}

#[utoipa::path(
    post,
    path = "/api/v1/favorites",
    tag = "favorites",
    security(("bearer" = [])),
    request_body = FavoriteRequest,
    responses(
        (status = 201, description = "Favorite added", body = FavoriteRequest),
        (status = 404, description = "Question not found"),
        (status = 409, description = "Already favorited"),
    )
)]
pub async fn add_favorite(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppJson(request): AppJson<FavoriteRequest>,
) -> Result<ApiResponse<FavoriteRequest>, ApiError> {
    question_repo::find_visible(&state.pool, request.question_id, auth_user.user_id)
        .await?
        .ok_or(ApiError::QuestionNotFound)?;

    if !favorite_repo::add(&state.pool, auth_user.user_id, request.question_id).await? {
        return Err(ApiError::AlreadyFavorited);
    }

    Ok(ApiResponse::created(request).with_message("Question added to favorites"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/favorites/{questionId}",
    tag = "favorites",
    security(("bearer" = [])),
    params(("questionId" = Uuid, Path, description = "Question id")),
    responses(
        (status = 200, description = "Favorite removed", body = FavoriteRequest),
        (status = 404, description = "Not a favorite"),
    )
)]
pub async fn remove_favorite(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppPath(question_id): AppPath<Uuid>,
) -> Result<ApiResponse<FavoriteRequest>, ApiError> {
    if !favorite_repo::remove(&state.pool, auth_user.user_id, question_id).await? {
        return Err(ApiError::NotFound("Favorite not found".to_string()));
    }

    Ok(ApiResponse::ok(FavoriteRequest { question_id })
        .with_message("Question removed from favorites"))
}

#[utoipa::path(
    get,
    path = "/api/v1/favorites/export",
    tag = "favorites",
    security(("bearer" = [])),
    params(("format" = Option<String>, Query, description = "json (default) or txt")),
    responses(
        (status = 200, description = "Favorited questions as an attachment"),
        (status = 400, description = "No favorites or unsupported format"),
    )
)]
pub async fn export_favorites(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    AppQuery(query): AppQuery<ExportQuery>,
) -> Result<ExportFile, ApiError> {
    let format = ExportFormat::parse(query.format.as_deref())?;

    let questions = favorite_repo::list_questions(&state.pool, auth_user.user_id).await?;
    if questions.is_empty() {
        return Err(ApiError::Validation("No data to export".to_string()));
    }

    export_questions("favorites", format, questions)
}
