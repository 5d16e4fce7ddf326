use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use ivs_db::models::{MockSession, MockSessionItem, Question};
use ivs_scoring::stats;

use crate::{answer::model::Feedback, error::ApiError};

pub const DEFAULT_ROLE: &str = "general_tech";
pub const DEFAULT_DURATION_MINUTES: i32 = 30;
pub const DEFAULT_QUESTION_COUNT: i32 = 5;
pub const STRONG_CATEGORY_SCORE: f64 = 80.0;
pub const WEAK_CATEGORY_SCORE: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Expired,
}

impl SessionStatus {
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            other => Err(ApiError::Internal(format!(
                "unknown mock interview status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[validate(length(min = 1, max = 50, message = "Role must be 1 to 50 characters"))]
    pub role: Option<String>,
    /// Minutes
    #[validate(range(min = 5, max = 180, message = "Duration must be between 5 and 180 minutes"))]
    pub duration: Option<i32>,
    #[validate(range(min = 1, max = 20, message = "Question count must be between 1 and 20"))]
    pub question_count: Option<i32>,
    #[validate(length(max = 200, message = "Custom topic must be at most 200 characters"))]
    pub custom_topic: Option<String>,
}

/// Question as shown during a session, without its reference answer
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuestion {
    pub id: Uuid,
    pub text: String,
    pub difficulty: String,
    pub category: String,
}

impl From<Question> for SessionQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            text: q.text,
            difficulty: q.difficulty,
            category: q.category,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub role: String,
    pub duration_minutes: i32,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub questions: Vec<SessionQuestion>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MockAnswerRequest {
    pub question_id: Uuid,
    pub answer_text: String,
    /// Seconds
    #[serde(default)]
    #[validate(range(min = 0, max = 86400, message = "timeSpent must be between 0 and 86400 seconds"))]
    pub time_spent: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MockAnswerResponse {
    pub answer_id: Uuid,
    pub question_id: Uuid,
    pub score: i32,
    pub feedback: Feedback,
    pub remaining_seconds: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub overall_score: i32,
    pub grade: String,
    pub answered_count: usize,
    pub total_questions: usize,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportItem {
    pub position: i32,
    pub question_id: Uuid,
    pub text: String,
    pub difficulty: String,
    pub category: String,
    pub reference_answer: String,
    pub answer_id: Option<Uuid>,
    pub answer_text: Option<String>,
    pub score: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub feedback: Option<Value>,
    pub time_spent: Option<i32>,
}

impl From<MockSessionItem> for ReportItem {
    fn from(item: MockSessionItem) -> Self {
        Self {
            position: item.position,
            question_id: item.question_id,
            text: item.text,
            difficulty: item.difficulty,
            category: item.category,
            reference_answer: item.reference_answer,
            answer_id: item.answer_id,
            answer_text: item.answer_text,
            score: item.score,
            feedback: item.feedback,
            time_spent: item.time_spent,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub session_id: Uuid,
    pub role: String,
    pub custom_topic: Option<String>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub overall_score: i32,
    pub grade: String,
    pub answered_count: usize,
    pub total_questions: usize,
    pub elapsed_seconds: i64,
    pub strong_categories: Vec<String>,
    pub weak_categories: Vec<String>,
    pub items: Vec<ReportItem>,
}

/// Topic used to rank bank questions: the custom topic, else the role words
/// unless the role is the generic one.
pub fn session_topic(role: &str, custom_topic: Option<&str>) -> Option<String> {
    if let Some(topic) = custom_topic.map(str::trim).filter(|t| !t.is_empty()) {
        return Some(topic.to_string());
    }
    (role != DEFAULT_ROLE).then(|| role.replace(['_', '-'], " "))
}

/// Mean over every session question, unanswered ones counting as 0.
pub fn overall_score(items: &[MockSessionItem]) -> i32 {
    let scores: Vec<i32> = items.iter().map(|i| i.score.unwrap_or(0)).collect();
    stats::mean(&scores).map_or(0, |mean| mean.round() as i32)
}

pub fn answered_count(items: &[MockSessionItem]) -> usize {
    items.iter().filter(|i| i.answer_id.is_some()).count()
}

/// Categories averaging at least 80, and those below 60, sorted by name.
pub fn category_split(items: &[MockSessionItem]) -> (Vec<String>, Vec<String>) {
    let mut by_category: BTreeMap<&str, Vec<i32>> = BTreeMap::new();
    for item in items {
        by_category
            .entry(item.category.as_str())
            .or_default()
            .push(item.score.unwrap_or(0));
    }

    let mut strong = Vec::new();
    let mut weak = Vec::new();
    for (category, scores) in by_category {
        let Some(mean) = stats::mean(&scores) else {
            continue;
        };
        if mean >= STRONG_CATEGORY_SCORE {
            strong.push(category.to_string());
        } else if mean < WEAK_CATEGORY_SCORE {
            weak.push(category.to_string());
        }
    }
    (strong, weak)
}

/// Seconds between start and completion, or until `now` for open sessions.
pub fn elapsed_seconds(session: &MockSession, now: DateTime<Utc>) -> i64 {
    let end = session.completed_at.unwrap_or(now);
    (end - session.started_at).num_seconds().max(0)
}
