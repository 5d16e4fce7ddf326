use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use ivs_db::{
    models::{MockSession, NewAnswer},
    repositories::{
        answer as answer_repo, mock_interview as mock_repo, question as question_repo,
    },
};
use ivs_scoring::Grade;

use super::model::{
    DEFAULT_DURATION_MINUTES, DEFAULT_QUESTION_COUNT, DEFAULT_ROLE, EndResponse,
    MockAnswerRequest, MockAnswerResponse, ReportItem, ReportResponse, SessionQuestion,
    SessionResponse, SessionStatus, StartRequest, answered_count, category_split,
    elapsed_seconds, overall_score, session_topic,
};
use crate::{
    answer::{
        model::MAX_ANSWER_CHARS,
        service::{evaluate_answer, store_feedback},
    },
    error::ApiError,
    question::service::pick_bank_questions,
    state::ApiState,
    validation::{non_blank, required_text, validate_request},
};

const ONE_ANSWER_PER_QUESTION: &str = "idx_answers_one_per_mock_question";

fn session_not_found() -> ApiError {
    ApiError::NotFound("Mock interview session not found".to_string())
}

pub async fn start(
    state: &ApiState,
    user_id: Uuid,
    request: StartRequest,
) -> Result<SessionResponse, ApiError> {
    validate_request(&request)?;

    let role = non_blank(request.role.as_deref()).unwrap_or_else(|| DEFAULT_ROLE.to_string());
    let custom_topic = non_blank(request.custom_topic.as_deref());
    let duration = request.duration.unwrap_or(DEFAULT_DURATION_MINUTES);
    let count = request.question_count.unwrap_or(DEFAULT_QUESTION_COUNT);

    let topic = session_topic(&role, custom_topic.as_deref());
    let questions = pick_bank_questions(state, topic.as_deref(), count.unsigned_abs()).await?;
    if questions.len() < count.unsigned_abs() as usize {
        return Err(ApiError::Validation(format!(
            "Not enough questions available: requested {count}, found {}",
            questions.len()
        )));
    }

    let started_at = Utc::now();
    let ends_at = started_at + Duration::minutes(i64::from(duration));

    let mut tx = state.pool.begin().await?;
    let session = mock_repo::create_session(
        &mut *tx,
        user_id,
        &role,
        custom_topic.as_deref(),
        duration,
        count,
        started_at,
        ends_at,
    )
    .await?;
    for (position, question) in (1..).zip(&questions) {
        mock_repo::add_session_question(&mut *tx, session.id, question.id, position).await?;
    }
    tx.commit().await?;

    tracing::info!(
        %user_id,
        session_id = %session.id,
        role = %session.role,
        questions = questions.len(),
        "Mock interview started"
    );

    Ok(SessionResponse {
        session_id: session.id,
        status: SessionStatus::parse(&session.status)?,
        role: session.role,
        duration_minutes: session.duration_minutes,
        started_at: session.started_at,
        ends_at: session.ends_at,
        questions: questions.into_iter().map(SessionQuestion::from).collect(),
    })
}

/// Record and score one answer of an open session. The answer is only kept
/// once it has been scored.
///
/// A submission after the deadline expires the session before it is
/// rejected.
pub async fn submit_answer(
    state: &ApiState,
    user_id: Uuid,
    session_id: Uuid,
    request: MockAnswerRequest,
) -> Result<MockAnswerResponse, ApiError> {
    validate_request(&request)?;
    let answer_text = required_text(&request.answer_text, "Answer", MAX_ANSWER_CHARS)?;

    let mut tx = state.pool.begin().await?;
    let session = mock_repo::find_for_user_for_update(&mut *tx, session_id, user_id)
        .await?
        .ok_or_else(session_not_found)?;

    if SessionStatus::parse(&session.status)? != SessionStatus::InProgress {
        return Err(ApiError::Conflict(
            "Mock interview session is not in progress".to_string(),
        ));
    }

    let now = Utc::now();
    if now > session.ends_at {
        mock_repo::mark_expired(&mut *tx, session.id).await?;
        tx.commit().await?;
        tracing::info!(%user_id, %session_id, "Late answer expired mock interview");
        return Err(ApiError::Conflict(
            "Mock interview time limit has passed".to_string(),
        ));
    }

    if !mock_repo::session_has_question(&mut *tx, session.id, request.question_id).await? {
        return Err(ApiError::Validation(
            "Question is not part of this mock interview".to_string(),
        ));
    }

    let question = question_repo::find_visible(&mut *tx, request.question_id, user_id)
        .await?
        .ok_or(ApiError::QuestionNotFound)?;

    let inserted = answer_repo::insert_answer(
        &mut *tx,
        &NewAnswer {
            user_id,
            question_id: question.id,
            parent_answer_id: None,
            follow_up_id: None,
            mock_session_id: Some(session.id),
            answer_text,
            time_spent: i32::try_from(request.time_spent).unwrap_or(i32::MAX),
            metadata: json!({}),
        },
    )
    .await;

    let answer = match inserted {
        Ok(answer) => answer,
        Err(sqlx::Error::Database(db_err))
            if db_err.constraint() == Some(ONE_ANSWER_PER_QUESTION) =>
        {
            return Err(ApiError::Conflict(
                "Question already answered in this mock interview".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    // An evaluation error drops `tx`, discarding the answer
    let feedback = evaluate_answer(
        state,
        &answer.answer_text,
        &question.text,
        &question.reference_answer,
    )
    .await?;
    let scored = store_feedback(&mut *tx, answer.id, &feedback).await?;
    tx.commit().await?;

    Ok(MockAnswerResponse {
        answer_id: scored.id,
        question_id: scored.question_id,
        score: feedback.score,
        feedback,
        remaining_seconds: remaining_seconds(&session),
    })
}

fn remaining_seconds(session: &MockSession) -> i64 {
    (session.ends_at - Utc::now()).num_seconds().max(0)
}

pub async fn end(
    state: &ApiState,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<EndResponse, ApiError> {
    let mut tx = state.pool.begin().await?;
    let session = mock_repo::find_for_user_for_update(&mut *tx, session_id, user_id)
        .await?
        .ok_or_else(session_not_found)?;

    if SessionStatus::parse(&session.status)? == SessionStatus::Completed {
        return Err(ApiError::Conflict(
            "Mock interview session already completed".to_string(),
        ));
    }

    let items = mock_repo::list_items(&mut *tx, session.id).await?;
    let score = overall_score(&items);

    let completed = mock_repo::complete(&mut *tx, session.id, score)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("Mock interview session already completed".to_string())
        })?;
    tx.commit().await?;

    tracing::info!(%user_id, %session_id, overall_score = score, "Mock interview completed");

    Ok(EndResponse {
        session_id: completed.id,
        status: SessionStatus::parse(&completed.status)?,
        overall_score: score,
        grade: Grade::from_score(score).as_str().to_string(),
        answered_count: answered_count(&items),
        total_questions: items.len(),
        completed_at: completed.completed_at,
    })
}

pub async fn report(
    state: &ApiState,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<ReportResponse, ApiError> {
    let session = mock_repo::find_for_user(&state.pool, session_id, user_id)
        .await?
        .ok_or_else(session_not_found)?;

    let status = SessionStatus::parse(&session.status)?;
    if status != SessionStatus::Completed {
        return Err(ApiError::Conflict(
            "Report is available once the mock interview is completed".to_string(),
        ));
    }

    let items = mock_repo::list_items(&state.pool, session.id).await?;
    let score = session.overall_score.unwrap_or_else(|| overall_score(&items));
    let (strong_categories, weak_categories) = category_split(&items);

    Ok(ReportResponse {
        session_id: session.id,
        elapsed_seconds: elapsed_seconds(&session, Utc::now()),
        role: session.role,
        custom_topic: session.custom_topic,
        status,
        started_at: session.started_at,
        completed_at: session.completed_at,
        overall_score: score,
        grade: Grade::from_score(score).as_str().to_string(),
        answered_count: answered_count(&items),
        total_questions: items.len(),
        strong_categories,
        weak_categories,
        items: items.into_iter().map(ReportItem::from).collect(),
    })
}
