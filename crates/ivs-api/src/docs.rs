//! OpenAPI description served by Swagger UI outside production.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    answer, auth, export, favorite, mistake, mock_interview, practice_set, question, statistics,
    upload,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "IntelliView API", description = "Interview question practice"),
    paths(
        auth::routes::register,
        auth::routes::login,
        auth::routes::refresh,
        auth::routes::profile,
        auth::routes::logout,
        question::routes::list_questions,
        question::routes::list_categories,
        question::routes::get_question,
        question::routes::search_questions,
        question::routes::export_questions,
        question::routes::generate,
        answer::routes::submit_answer,
        answer::routes::score_answer,
        answer::routes::answer_history,
        answer::routes::answer_statistics,
        favorite::list_favorites,
        favorite::add_favorite,
        favorite::remove_favorite,
        favorite::export_favorites,
        mistake::list_mistakes,
        mistake::record_mistake,
        mistake::master_mistake,
        mistake::export_mistakes,
        practice_set::routes::list_practice_sets,
        practice_set::routes::create_practice_set,
        practice_set::routes::update_practice_set,
        practice_set::routes::delete_practice_set,
        practice_set::routes::list_set_questions,
        practice_set::routes::add_set_question,
        practice_set::routes::export_practice_set,
        mock_interview::routes::start_mock_interview,
        mock_interview::routes::submit_mock_answer,
        mock_interview::routes::end_mock_interview,
        mock_interview::routes::mock_interview_report,
        upload::routes::upload_resume,
        upload::routes::export_data,
        statistics::overview,
        statistics::category_stats,
        statistics::progress,
        statistics::activity,
    ),
    components(schemas(
        auth::models::RegisterRequest,
        auth::models::LoginRequest,
        auth::models::RefreshRequest,
        auth::models::LogoutRequest,
        auth::models::UserResponse,
        auth::models::AuthResponse,
        auth::models::TokenPair,
        auth::models::LogoutResponse,
        question::model::QuestionResponse,
        question::model::FollowUpResponse,
        question::model::QuestionGroup,
        question::model::QuestionPage,
        question::model::CategoryResponse,
        question::model::SearchRequest,
        question::model::SearchFilters,
        question::model::ExportRequest,
        question::model::GenerationSource,
        question::model::GenerateResponse,
        answer::model::SubmitAnswerRequest,
        answer::model::AnswerResponse,
        answer::model::ScoreSource,
        answer::model::Feedback,
        answer::model::ScoreResponse,
        answer::model::HistoryItem,
        answer::model::HistoryPage,
        answer::model::AnswerStatistics,
        answer::model::CategoryStat,
        answer::model::DailyActivity,
        favorite::FavoriteRequest,
        mistake::MistakeRequest,
        mistake::MistakeResponse,
        practice_set::model::CreatePracticeSetRequest,
        practice_set::model::UpdatePracticeSetRequest,
        practice_set::model::AddQuestionRequest,
        practice_set::model::PracticeSetResponse,
        mock_interview::model::SessionStatus,
        mock_interview::model::StartRequest,
        mock_interview::model::SessionQuestion,
        mock_interview::model::SessionResponse,
        mock_interview::model::MockAnswerRequest,
        mock_interview::model::MockAnswerResponse,
        mock_interview::model::EndResponse,
        mock_interview::model::ReportItem,
        mock_interview::model::ReportResponse,
        upload::routes::ExportDataRequest,
        upload::service::ResumeResponse,
        export::ExportFormat,
        statistics::Overview,
        statistics::CategoryStatistics,
        statistics::ProgressPoint,
        statistics::ActivityDay,
        statistics::Activity,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "questions", description = "Question bank, search and generation"),
        (name = "answers", description = "Answer submission and scoring"),
        (name = "favorites"),
        (name = "mistakes"),
        (name = "practice-sets"),
        (name = "mock-interview", description = "Timed interview sessions"),
        (name = "upload", description = "Resume upload and data export"),
        (name = "statistics"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_group() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/v1/auth/login",
            "/api/v1/questions/{id}",
            "/api/v1/answers/{id}/ai-score",
            "/api/v1/favorites/{questionId}",
            "/api/v1/mistakes/export",
            "/api/v1/practice-sets/{id}/questions",
            "/api/v1/mock-interview/{sessionId}/report",
            "/api/v1/upload/resume",
            "/api/v1/statistics/activity",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components are generated");
        assert!(components.security_schemes.contains_key("bearer"));
        assert!(components.schemas.contains_key("ReportResponse"));
    }
}
