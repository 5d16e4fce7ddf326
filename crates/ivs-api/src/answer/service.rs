use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde_json::{Value, json};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use ivs_db::{
    models::{Answer, AnswerHistoryFilter, NewAnswer},
    repositories::{answer as answer_repo, question as question_repo, statistics as stats_repo},
};
use ivs_scoring::{evaluate, evaluation::offers_follow_up, stats};

use super::model::{
    AnswerResponse, AnswerStatistics, CategoryStat, DailyActivity, Feedback, HistoryPage,
    HistoryQuery, MAX_ANSWER_CHARS, ScoreResponse, SubmitAnswerRequest,
};
use crate::{
    error::ApiError,
    metrics::record_scoring,
    question::model::FollowUpResponse,
    state::ApiState,
    validation::{PageParams, non_blank, required_text, validate_request},
};

/// Days covered by `recentActivity`
const RECENT_ACTIVITY_DAYS: u64 = 7;

pub async fn submit(
    state: &ApiState,
    user_id: Uuid,
    request: SubmitAnswerRequest,
) -> Result<AnswerResponse, ApiError> {
    validate_request(&request)?;
    let answer_text = required_text(&request.answer_text, "Answer", MAX_ANSWER_CHARS)?;
    let metadata = metadata_object(request.metadata)?;

    let (question_id, parent_answer_id, follow_up_id) =
        match (request.parent_answer_id, request.follow_up_question_id) {
            (Some(parent_id), Some(follow_up_id)) => {
                let parent = answer_repo::find_for_user(&state.pool, parent_id, user_id)
                    .await?
                    .ok_or_else(|| ApiError::NotFound("Parent answer not found".to_string()))?;
                let follow_up = question_repo::find_follow_up(&state.pool, follow_up_id)
                    .await?
                    .ok_or_else(|| {
                        ApiError::NotFound("Follow-up question not found".to_string())
                    })?;

                if follow_up.question_id != parent.question_id {
                    return Err(ApiError::Validation(
                        "Follow-up question does not belong to the parent answer's question"
                            .to_string(),
                    ));
                }
                (parent.question_id, Some(parent.id), Some(follow_up.id))
            }
            (None, None) => {
                let question_id = request.question_id.ok_or_else(|| {
                    ApiError::Validation("questionId is required".to_string())
                })?;
                question_repo::find_visible(&state.pool, question_id, user_id)
                    .await?
                    .ok_or(ApiError::QuestionNotFound)?;
                (question_id, None, None)
            }
            _ => {
                return Err(ApiError::Validation(
                    "parentAnswerId and followUpQuestionId must be provided together".to_string(),
                ));
            }
        };

    let answer = answer_repo::insert_answer(
        &state.pool,
        &NewAnswer {
            user_id,
            question_id,
            parent_answer_id,
            follow_up_id,
            mock_session_id: None,
            answer_text,
            time_spent: i32::try_from(request.time_spent).unwrap_or(i32::MAX),
            metadata,
        },
    )
    .await?;

    tracing::debug!(%user_id, answer_id = %answer.id, %question_id, "Answer submitted");
    Ok(answer.into())
}

fn metadata_object(metadata: Option<Value>) -> Result<Value, ApiError> {
    match metadata {
        None | Some(Value::Null) => Ok(json!({})),
        Some(value @ Value::Object(_)) => Ok(value),
        Some(_) => Err(ApiError::Validation(
            "metadata must be a JSON object".to_string(),
        )),
    }
}

/// Score one of the caller's answers and offer a follow-up when it earned one.
pub async fn score(
    state: &ApiState,
    user_id: Uuid,
    answer_id: Uuid,
) -> Result<ScoreResponse, ApiError> {
    let answer = answer_repo::find_for_user(&state.pool, answer_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Answer not found".to_string()))?;

    let question = question_repo::find_visible(&state.pool, answer.question_id, user_id)
        .await?
        .ok_or(ApiError::QuestionNotFound)?;

    let (prompt, reference) = match answer.follow_up_id {
        Some(follow_up_id) => {
            let follow_up = question_repo::find_follow_up(&state.pool, follow_up_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Follow-up question not found".to_string()))?;
            (follow_up.text, follow_up.reference_answer)
        }
        None => (question.text, question.reference_answer),
    };

    let (scored, feedback) = score_and_store(state, &answer, &prompt, &reference).await?;

    let is_follow_up_answer = answer.parent_answer_id.is_some() || answer.follow_up_id.is_some();
    let follow_up_question = if offers_follow_up(feedback.score) && !is_follow_up_answer {
        question_repo::list_follow_ups(&state.pool, &[answer.question_id])
            .await?
            .into_iter()
            .next()
            .map(FollowUpResponse::from)
    } else {
        None
    };

    let evaluated_at = scored.scored_at.unwrap_or_else(Utc::now);
    Ok(ScoreResponse::new(
        answer.id,
        feedback,
        follow_up_question,
        evaluated_at,
    ))
}

/// Evaluate `answer_text` against `reference`.
///
/// Uses the AI provider when configured. Provider failures are returned as
/// errors.
pub async fn evaluate_answer(
    state: &ApiState,
    answer_text: &str,
    question_text: &str,
    reference: &str,
) -> Result<Feedback, ApiError> {
    let evaluation = evaluate(answer_text, reference);

    let ai_score = match &state.ai {
        Some(ai) => Some(ai.score_answer(question_text, reference, answer_text).await?),
        None => None,
    };

    let feedback = Feedback::new(evaluation, ai_score);
    record_scoring(feedback.source.as_str());
    Ok(feedback)
}

/// Persist `feedback` as the score of `answer_id`.
pub async fn store_feedback<'e, E>(
    executor: E,
    answer_id: Uuid,
    feedback: &Feedback,
) -> Result<Answer, ApiError>
where
    E: Executor<'e, Database = Postgres>,
{
    let feedback_json = serde_json::to_value(feedback)
        .map_err(|e| ApiError::Internal(format!("failed to serialize feedback: {e}")))?;
    let scored = answer_repo::store_score(executor, answer_id, feedback.score, &feedback_json)
        .await?;

    tracing::debug!(
        %answer_id,
        score = feedback.score,
        source = feedback.source.as_str(),
        "Answer scored"
    );

    Ok(scored)
}

async fn score_and_store(
    state: &ApiState,
    answer: &Answer,
    question_text: &str,
    reference: &str,
) -> Result<(Answer, Feedback), ApiError> {
    let feedback = evaluate_answer(state, &answer.answer_text, question_text, reference).await?;
    let scored = store_feedback(&state.pool, answer.id, &feedback).await?;
    Ok((scored, feedback))
}

pub async fn history(
    state: &ApiState,
    user_id: Uuid,
    query: &HistoryQuery,
) -> Result<HistoryPage, ApiError> {
    let page = PageParams {
        page: query.page,
        page_size: query.page_size,
    }
    .resolve()?;

    let filter = AnswerHistoryFilter {
        question_id: query.question_id,
        category: non_blank(query.category.as_deref()),
        start: parse_date_bound(query.start_date.as_deref(), DateBound::Start)?,
        end: parse_date_bound(query.end_date.as_deref(), DateBound::End)?,
    };

    if let (Some(start), Some(end)) = (filter.start, filter.end) {
        if start > end {
            return Err(ApiError::Validation(
                "startDate must not be after endDate".to_string(),
            ));
        }
    }

    let total = answer_repo::count_history(&state.pool, user_id, &filter).await?;
    let rows =
        answer_repo::history(&state.pool, user_id, &filter, page.limit(), page.offset()).await?;

    Ok(HistoryPage {
        answers: rows.into_iter().map(Into::into).collect(),
        total,
        page: page.page,
        page_size: page.page_size,
    })
}

#[derive(Debug, Clone, Copy)]
enum DateBound {
    Start,
    End,
}

/// Accept RFC 3339 timestamps or plain dates. A plain end date includes the
/// whole day.
fn parse_date_bound(value: Option<&str>, bound: DateBound) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ApiError::Validation(format!(
            "Invalid date '{value}', expected YYYY-MM-DD or an RFC 3339 timestamp"
        ))
    })?;

    let instant = match bound {
        DateBound::Start => date.and_time(NaiveTime::MIN),
        DateBound::End => date
            .checked_add_days(Days::new(1))
            .unwrap_or(date)
            .and_time(NaiveTime::MIN)
            - chrono::Duration::microseconds(1),
    };

    Ok(Some(instant.and_utc()))
}

pub async fn statistics(state: &ApiState, user_id: Uuid) -> Result<AnswerStatistics, ApiError> {
    let totals = stats_repo::user_totals(&state.pool, user_id).await?;
    let categories = stats_repo::category_scores(&state.pool, user_id).await?;

    let today = Utc::now().date_naive();
    let since = today
        .checked_sub_days(Days::new(RECENT_ACTIVITY_DAYS - 1))
        .unwrap_or(today)
        .and_time(NaiveTime::MIN)
        .and_utc();
    let recent = stats_repo::daily_scores(&state.pool, user_id, since).await?;

    let category_stats = categories
        .into_iter()
        .map(|c| {
            let stat = CategoryStat {
                total_answered: c.total_answered,
                average_score: stats::mean(&c.scores).map(stats::round1),
                correct_rate: stats::round2(stats::correct_rate(&c.scores)),
            };
            (c.category, stat)
        })
        .collect();

    let recent_activity = recent
        .into_iter()
        .filter(|d| d.answers_count > 0)
        .map(|d| DailyActivity {
            date: d.day,
            answers_count: d.answers_count,
            average_score: stats::mean(&d.scores).map(stats::round1),
        })
        .collect();

    Ok(AnswerStatistics {
        total_answered: totals.total_answered,
        average_score: totals.average_score.map(stats::round1),
        total_time_spent: totals.total_time_spent,
        category_stats,
        recent_activity,
    })
}
