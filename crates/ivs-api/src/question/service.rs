use std::collections::{HashMap, HashSet};

use serde_json::json;
use uuid::Uuid;

use ivs_db::{
    models::{FollowUp, NewFollowUp, NewQuestion, Question, QuestionFilter},
    repositories::question as question_repo,
};
use ivs_scoring::rank_by_relevance;

use super::model::{
    CategoryResponse, ExportRequest, FollowUpResponse, GenerateResponse, GenerationSource,
    ListQuery, QuestionPage, QuestionResponse, SearchRequest, group_by_category,
};
use crate::{
    ai::GenerationRequest,
    error::ApiError,
    export::{self, ExportFile, ExportFormat},
    state::ApiState,
    upload::service::{self as upload, ResumeUpload},
    validation::{PageParams, non_blank, parse_difficulty, required_text},
};

pub const MAX_GENERATED_QUESTIONS: u32 = 30;
pub const DEFAULT_GENERATED_QUESTIONS: u32 = 10;
pub const MAX_JOB_DESCRIPTION_CHARS: usize = 20_000;
pub const MAX_RESUME_TEXT_CHARS: usize = 20_000;
const MAX_SEARCH_QUERY_CHARS: usize = 200;
const MAX_EXPORT_QUESTIONS: usize = 500;
/// Bank questions considered when ranking by keyword overlap
const BANK_SAMPLE_SIZE: i64 = 1000;

pub async fn list(
    state: &ApiState,
    user_id: Uuid,
    query: &ListQuery,
) -> Result<QuestionPage, ApiError> {
    let filter = QuestionFilter {
        category: non_blank(query.category.as_deref()),
        difficulty: parse_difficulty(query.difficulty.as_deref())?,
        query: None,
    };
    page_of(state, user_id, &filter, query.page_params()).await
}

pub async fn search(
    state: &ApiState,
    user_id: Uuid,
    request: &SearchRequest,
) -> Result<QuestionPage, ApiError> {
    let text = required_text(&request.query, "Search query", MAX_SEARCH_QUERY_CHARS)?;
    let filters = &request.filters;

    let filter = QuestionFilter {
        category: non_blank(filters.category.as_deref()),
        difficulty: parse_difficulty(filters.difficulty.as_deref())?,
        query: Some(text),
    };
    let params = PageParams {
        page: filters.page,
        page_size: filters.page_size,
    };
    page_of(state, user_id, &filter, params).await
}

async fn page_of(
    state: &ApiState,
    user_id: Uuid,
    filter: &QuestionFilter,
    params: PageParams,
) -> Result<QuestionPage, ApiError> {
    let page = params.resolve()?;

    let total = question_repo::count_visible(&state.pool, user_id, filter).await?;
    let questions =
        question_repo::list_visible(&state.pool, user_id, filter, page.limit(), page.offset())
            .await?;

    Ok(QuestionPage {
        items: group_by_category(questions.into_iter().map(QuestionResponse::from).collect()),
        total,
        page: page.page,
        page_size: page.page_size,
    })
}

/// A visible question with its follow-ups.
pub async fn detail(
    state: &ApiState,
    user_id: Uuid,
    question_id: Uuid,
) -> Result<QuestionResponse, ApiError> {
    let question = question_repo::find_visible(&state.pool, question_id, user_id)
        .await?
        .ok_or(ApiError::QuestionNotFound)?;
    let follow_ups = question_repo::list_follow_ups(&state.pool, &[question_id]).await?;

    Ok(QuestionResponse::from(question)
        .with_follow_ups(follow_ups.into_iter().map(FollowUpResponse::from).collect()))
}

pub async fn categories(
    state: &ApiState,
    user_id: Uuid,
) -> Result<Vec<CategoryResponse>, ApiError> {
    let categories = question_repo::list_categories(&state.pool, user_id).await?;
    Ok(categories
        .into_iter()
        .map(|c| CategoryResponse::new(c.category, c.question_count))
        .collect())
}

pub async fn export(
    state: &ApiState,
    user_id: Uuid,
    request: &ExportRequest,
) -> Result<ExportFile, ApiError> {
    let format = ExportFormat::parse(request.format.as_deref())?;

    if request.question_ids.is_empty() {
        return Err(ApiError::Validation(
            "questionIds cannot be empty".to_string(),
        ));
    }
    if request.question_ids.len() > MAX_EXPORT_QUESTIONS {
        return Err(ApiError::Validation(format!(
            "At most {MAX_EXPORT_QUESTIONS} questions can be exported at once"
        )));
    }

    let mut ids = request.question_ids.clone();
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));

    let questions = question_repo::find_visible_by_ids(&state.pool, user_id, &ids).await?;
    if questions.is_empty() {
        return Err(ApiError::QuestionNotFound);
    }

    export_questions("questions", format, questions)
}

/// Render questions grouped by category, as JSON or text.
pub fn export_questions(
    file_stem: &str,
    format: ExportFormat,
    questions: Vec<Question>,
) -> Result<ExportFile, ApiError> {
    let responses: Vec<QuestionResponse> =
        questions.into_iter().map(QuestionResponse::from).collect();
    let text_groups = export::group_by_category(responses.iter().map(QuestionResponse::to_export));
    let groups = group_by_category(responses);

    ExportFile::from_groups(file_stem, format, &groups, &text_groups)
}

/// Validated input of `POST /questions/generate`
#[derive(Debug)]
pub struct GenerateInput {
    pub resume: Option<ResumeUpload>,
    pub resume_id: Option<Uuid>,
    pub resume_text: Option<String>,
    pub job_description: String,
    pub question_count: u32,
    pub include_follow_ups: bool,
}

impl Default for GenerateInput {
    fn default() -> Self {
        Self {
            resume: None,
            resume_id: None,
            resume_text: None,
            job_description: String::new(),
            question_count: DEFAULT_GENERATED_QUESTIONS,
            include_follow_ups: true,
        }
    }
}

impl GenerateInput {
    pub fn validate(&mut self) -> Result<(), ApiError> {
        self.job_description = required_text(
            &self.job_description,
            "Job description",
            MAX_JOB_DESCRIPTION_CHARS,
        )?;

        if let Some(text) = self.resume_text.take() {
            if !text.trim().is_empty() {
                self.resume_text =
                    Some(required_text(&text, "Resume text", MAX_RESUME_TEXT_CHARS)?);
            }
        }

        if !(1..=MAX_GENERATED_QUESTIONS).contains(&self.question_count) {
            return Err(ApiError::Validation(format!(
                "questionCount must be between 1 and {MAX_GENERATED_QUESTIONS}"
            )));
        }

        Ok(())
    }
}

/// Generate questions for a job description, with the AI provider when one is
/// configured and from the question bank otherwise.
pub async fn generate(
    state: &ApiState,
    user_id: Uuid,
    mut input: GenerateInput,
) -> Result<GenerateResponse, ApiError> {
    input.validate()?;

    let resume = match (input.resume.take(), input.resume_id) {
        (Some(upload), _) => Some(upload::store_resume(state, user_id, upload).await?),
        (None, Some(resume_id)) => Some(upload::find_resume(state, user_id, resume_id).await?),
        (None, None) => None,
    };
    let resume_id = resume.as_ref().map(|r| r.id);

    let (questions, source) = match &state.ai {
        Some(ai) => {
            let request = GenerationRequest {
                job_description: &input.job_description,
                resume_text: input.resume_text.as_deref(),
                resume_file_name: resume.as_ref().map(|r| r.file_name.as_str()),
                question_count: input.question_count,
                include_follow_ups: input.include_follow_ups,
            };
            let generated = ai.generate_questions(&request).await?;
            let questions = store_generated(state, user_id, generated, input.include_follow_ups).await?;
            (questions, GenerationSource::Ai)
        }
        None => {
            let query = match &input.resume_text {
                Some(resume_text) => format!("{} {resume_text}", input.job_description),
                None => input.job_description.clone(),
            };
            let picked = pick_bank_questions(state, Some(&query), input.question_count).await?;
            let questions = with_follow_ups(state, picked, input.include_follow_ups).await?;
            (questions, GenerationSource::Bank)
        }
    };

    tracing::info!(
        %user_id,
        count = questions.len(),
        source = ?source,
        "Generated interview questions"
    );

    Ok(GenerateResponse {
        total: questions.len(),
        items: group_by_category(questions),
        source,
        resume_id,
    })
}

async fn store_generated(
    state: &ApiState,
    user_id: Uuid,
    generated: Vec<crate::ai::GeneratedQuestion>,
    include_follow_ups: bool,
) -> Result<Vec<QuestionResponse>, ApiError> {
    let mut tx = state.pool.begin().await?;
    let mut stored = Vec::with_capacity(generated.len());

    for question in generated {
        let new_question = NewQuestion {
            owner_id: Some(user_id),
            text: question.text,
            difficulty: question.difficulty,
            category: question.category,
            reference_answer: question.reference_answer,
            resources: json!([]),
            tags: Vec::new(),
            source: "generated".to_string(),
        };
        let inserted = question_repo::insert_question(&mut *tx, &new_question).await?;

        let mut follow_ups = Vec::new();
        if include_follow_ups {
            for (position, follow_up) in (1..).zip(question.follow_ups) {
                let new_follow_up = NewFollowUp {
                    text: follow_up.text,
                    reference_answer: follow_up.reference_answer,
                };
                let follow_up =
                    question_repo::insert_follow_up(&mut *tx, inserted.id, &new_follow_up, position)
                        .await?;
                follow_ups.push(FollowUpResponse::from(follow_up));
            }
        }

        stored.push(QuestionResponse::from(inserted).with_follow_ups(follow_ups));
    }

    tx.commit().await?;
    Ok(stored)
}

/// Pick up to `count` bank questions, most relevant to `topic` first, padded
/// with random others.
pub async fn pick_bank_questions(
    state: &ApiState,
    topic: Option<&str>,
    count: u32,
) -> Result<Vec<Question>, ApiError> {
    let bank = question_repo::list_bank(&state.pool, BANK_SAMPLE_SIZE).await?;
    let count = count as usize;

    let picked = match topic.map(str::trim).filter(|t| !t.is_empty()) {
        Some(topic) => rank_by_relevance(topic, bank, |q| {
            format!("{} {} {}", q.text, q.category, q.tags.join(" "))
        })
        .into_iter()
        .map(|(question, _)| question)
        .take(count)
        .collect(),
        None => bank.into_iter().take(count).collect(),
    };

    Ok(picked)
}

async fn with_follow_ups(
    state: &ApiState,
    questions: Vec<Question>,
    include_follow_ups: bool,
) -> Result<Vec<QuestionResponse>, ApiError> {
    if !include_follow_ups {
        return Ok(questions.into_iter().map(QuestionResponse::from).collect());
    }

    let ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
    let follow_ups = question_repo::list_follow_ups(&state.pool, &ids).await?;
    let mut by_question = group_follow_ups(follow_ups);

    Ok(questions
        .into_iter()
        .map(|q| {
            let follow_ups = by_question.remove(&q.id).unwrap_or_default();
            QuestionResponse::from(q).with_follow_ups(follow_ups)
        })
        .collect())
}

fn group_follow_ups(follow_ups: Vec<FollowUp>) -> HashMap<Uuid, Vec<FollowUpResponse>> {
    let mut grouped: HashMap<Uuid, Vec<FollowUpResponse>> = HashMap::new();
    for follow_up in follow_ups {
        grouped
            .entry(follow_up.question_id)
            .or_default()
            .push(follow_up.into());
    }
    grouped
}
