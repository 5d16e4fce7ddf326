use uuid::Uuid;

use ivs_db::{
    models::PracticeSet,
    repositories::{practice_set as set_repo, question as question_repo},
};

use super::model::{
    CreatePracticeSetRequest, MAX_DESCRIPTION_CHARS, MAX_NAME_CHARS, PracticeSetResponse,
    UpdatePracticeSetRequest,
};
use crate::{
    error::ApiError,
    export::{ExportFile, ExportFormat, sanitize_file_stem},
    question::{model::QuestionResponse, service::export_questions},
    state::ApiState,
    validation::{non_blank, required_text},
};

fn description(value: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(text) = non_blank(value) else {
        return Ok(None);
    };
    if text.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ApiError::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(Some(text))
}

/// A set the caller owns. Sets of other users are reported as missing.
async fn owned(state: &ApiState, id: Uuid, user_id: Uuid) -> Result<PracticeSet, ApiError> {
    set_repo::find_by_id(&state.pool, id)
        .await?
        .filter(|set| set.user_id == user_id)
        .ok_or(ApiError::PracticeSetNotFound)
}

/// A set the caller owns, or any public set.
async fn readable(state: &ApiState, id: Uuid, user_id: Uuid) -> Result<PracticeSet, ApiError> {
    set_repo::find_by_id(&state.pool, id)
        .await?
        .filter(|set| set.user_id == user_id || set.is_public)
        .ok_or(ApiError::PracticeSetNotFound)
}

pub async fn list(state: &ApiState, user_id: Uuid) -> Result<Vec<PracticeSetResponse>, ApiError> {
    let sets = set_repo::list_for_user(&state.pool, user_id).await?;
    Ok(sets.into_iter().map(PracticeSetResponse::from).collect())
}

pub async fn create(
    state: &ApiState,
    user_id: Uuid,
    request: &CreatePracticeSetRequest,
) -> Result<PracticeSetResponse, ApiError> {
    let name = required_text(&request.name, "Name", MAX_NAME_CHARS)?;
    let description = description(request.description.as_deref())?;

    let id = set_repo::create(
        &state.pool,
        user_id,
        &name,
        description.as_deref(),
        request.is_public,
    )
    .await?;

    tracing::info!(user_id = %user_id, practice_set_id = %id, "Practice set created");
    owned(state, id, user_id).await.map(PracticeSetResponse::from)
}

pub async fn update(
    state: &ApiState,
    user_id: Uuid,
    id: Uuid,
    request: &UpdatePracticeSetRequest,
) -> Result<PracticeSetResponse, ApiError> {
    if request.is_empty() {
        return Err(ApiError::Validation("Nothing to update".to_string()));
    }

    let name = request
        .name
        .as_deref()
        .map(|name| required_text(name, "Name", MAX_NAME_CHARS))
        .transpose()?;
    let description = match &request.description {
        Some(value) => Some(description(value.as_deref())?),
        None => None,
    };

    let updated = set_repo::update(
        &state.pool,
        id,
        user_id,
        name.as_deref(),
        description.as_ref().map(Option::as_deref),
        request.is_public,
    )
    .await?;
    if !updated {
        return Err(ApiError::PracticeSetNotFound);
    }

    owned(state, id, user_id).await.map(PracticeSetResponse::from)
}

pub async fn delete(state: &ApiState, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
    if !set_repo::delete(&state.pool, id, user_id).await? {
        return Err(ApiError::PracticeSetNotFound);
    }
    tracing::info!(user_id = %user_id, practice_set_id = %id, "Practice set deleted");
    Ok(())
}

pub async fn questions(
    state: &ApiState,
    user_id: Uuid,
    id: Uuid,
) -> Result<Vec<QuestionResponse>, ApiError> {
    readable(state, id, user_id).await?;
    let questions = set_repo::list_questions(&state.pool, id).await?;
    Ok(questions.into_iter().map(QuestionResponse::from).collect())
}

pub async fn add_question(
    state: &ApiState,
    user_id: Uuid,
    id: Uuid,
    question_id: Uuid,
) -> Result<PracticeSetResponse, ApiError> {
    owned(state, id, user_id).await?;

    question_repo::find_visible(&state.pool, question_id, user_id)
        .await?
        .ok_or(ApiError::QuestionNotFound)?;

    if !set_repo::add_question(&state.pool, id, question_id).await? {
        return Err(ApiError::Conflict(
            "Question already in practice set".to_string(),
        ));
    }
    set_repo::touch(&state.pool, id).await?;

    owned(state, id, user_id).await.map(PracticeSetResponse::from)
}

pub async fn export(
    state: &ApiState,
    user_id: Uuid,
    id: Uuid,
    format: ExportFormat,
) -> Result<ExportFile, ApiError> {
    let set = readable(state, id, user_id).await?;

    let questions = set_repo::list_questions(&state.pool, id).await?;
    if questions.is_empty() {
        return Err(ApiError::Validation("No data to export".to_string()));
    }

    let stem = sanitize_file_stem(Some(&set.name), "practice-set");
    export_questions(&stem, format, questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_rules() {
        assert_eq!(description(None).expect("ok"), None);
        assert_eq!(description(Some("   ")).expect("ok"), None);
        assert_eq!(
            description(Some("  Backend basics ")).expect("ok"),
            Some("Backend basics".to_string())
        );
        assert!(description(Some(&"x".repeat(MAX_DESCRIPTION_CHARS))).is_ok());
        assert!(matches!(
            description(Some(&"x".repeat(MAX_DESCRIPTION_CHARS + 1))),
            Err(ApiError::Validation(_))
        ));
    }
}
