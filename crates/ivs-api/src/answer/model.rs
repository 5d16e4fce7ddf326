use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use ivs_db::models::{Answer, AnswerHistoryRow};
use ivs_scoring::{Evaluation, Grade};

use crate::{ai::AiScore, question::model::FollowUpResponse};

pub const MAX_ANSWER_CHARS: usize = 10_000;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub question_id: Option<Uuid>,
    pub answer_text: String,
    /// Seconds spent on the answer
    #[serde(default)]
    #[validate(range(min = 0, max = 86400, message = "timeSpent must be between 0 and 86400 seconds"))]
    pub time_spent: i64,
    /// Free-form JSON object
    pub metadata: Option<Value>,
    pub parent_answer_id: Option<Uuid>,
    pub follow_up_question_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub id: Uuid,
    pub question_id: Uuid,
    pub parent_answer_id: Option<Uuid>,
    pub follow_up_question_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_session_id: Option<Uuid>,
    pub answer_text: String,
    pub time_spent: i32,
    pub metadata: Value,
    pub score: Option<i32>,
    pub feedback: Option<Value>,
    pub submitted_at: DateTime<Utc>,
    pub scored_at: Option<DateTime<Utc>>,
}

impl From<Answer> for AnswerResponse {
    fn from(answer: Answer) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            parent_answer_id: answer.parent_answer_id,
            follow_up_question_id: answer.follow_up_id,
            mock_session_id: answer.mock_session_id,
            answer_text: answer.answer_text,
            time_spent: answer.time_spent,
            metadata: answer.metadata,
            score: answer.score,
            feedback: answer.feedback,
            submitted_at: answer.submitted_at,
            scored_at: answer.scored_at,
        }
    }
}

/// How an answer was scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Ai,
    Keyword,
}

impl ScoreSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Keyword => "keyword",
        }
    }
}

/// Feedback stored with a scored answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub score: i32,
    /// `excellent`, `good`, `fair` or `needs_work`
    pub grade: String,
    pub summary: String,
    pub highlights: Vec<String>,
    pub improvements: Vec<String>,
    pub suggestions: Vec<String>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub source: ScoreSource,
}

impl Feedback {
    /// Keyword-based feedback, optionally overridden by the AI provider's
    /// judgement. Keyword lists always come from the local evaluation.
    pub fn new(evaluation: Evaluation, ai: Option<AiScore>) -> Self {
        match ai {
            Some(ai) => {
                let grade = Grade::from_score(ai.score);
                Self {
                    score: ai.score,
                    grade: grade.as_str().to_string(),
                    summary: grade.summary().to_string(),
                    highlights: ai.highlights,
                    improvements: ai.improvements,
                    suggestions: ai.suggestions,
                    matched_keywords: evaluation.matched_keywords,
                    missing_keywords: evaluation.missing_keywords,
                    source: ScoreSource::Ai,
                }
            }
            None => Self {
                score: evaluation.score,
                grade: evaluation.grade.as_str().to_string(),
                summary: evaluation.grade.summary().to_string(),
                highlights: evaluation.highlights,
                improvements: evaluation.improvements,
                suggestions: evaluation.suggestions,
                matched_keywords: evaluation.matched_keywords,
                missing_keywords: evaluation.missing_keywords,
                source: ScoreSource::Keyword,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub answer_id: Uuid,
    pub score: i32,
    pub grade: String,
    pub summary: String,
    pub highlights: Vec<String>,
    pub improvements: Vec<String>,
    pub suggestions: Vec<String>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub source: ScoreSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_question: Option<FollowUpResponse>,
    pub evaluated_at: DateTime<Utc>,
}

impl ScoreResponse {
    pub fn new(
        answer_id: Uuid,
        feedback: Feedback,
        follow_up_question: Option<FollowUpResponse>,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            answer_id,
            score: feedback.score,
            grade: feedback.grade,
            summary: feedback.summary,
            highlights: feedback.highlights,
            improvements: feedback.improvements,
            suggestions: feedback.suggestions,
            matched_keywords: feedback.matched_keywords,
            missing_keywords: feedback.missing_keywords,
            source: feedback.source,
            follow_up_question,
            evaluated_at,
        }
    }
}

/// Query string of `GET /answers/history`
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub question_id: Option<Uuid>,
    pub category: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339
    pub start_date: Option<String>,
    /// `YYYY-MM-DD` (inclusive) or RFC 3339
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[serde(flatten)]
    pub answer: AnswerResponse,
    pub question_text: String,
    pub category: String,
}

impl From<AnswerHistoryRow> for HistoryItem {
    fn from(row: AnswerHistoryRow) -> Self {
        Self {
            answer: row.answer.into(),
            question_text: row.question_text,
            category: row.category,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub answers: Vec<HistoryItem>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerStatistics {
    pub total_answered: i64,
    pub average_score: Option<f64>,
    /// Seconds
    pub total_time_spent: i64,
    pub category_stats: BTreeMap<String, CategoryStat>,
    pub recent_activity: Vec<DailyActivity>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub total_answered: i64,
    pub average_score: Option<f64>,
    /// Share of scored answers with a passing score, 0.0 to 1.0
    pub correct_rate: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub answers_count: i64,
    pub average_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_request;
    use serde_json::json;

    #[test]
    fn test_time_spent_range() {
        let parse = |body: Value| -> SubmitAnswerRequest {
            serde_json::from_value(body).expect("valid body")
        };

        let ok = parse(json!({"questionId": Uuid::nil(), "answerText": "x", "timeSpent": 86400}));
        assert!(validate_request(&ok).is_ok());

        let default = parse(json!({"answerText": "x"}));
        assert_eq!(default.time_spent, 0);

        let negative = parse(json!({"answerText": "x", "timeSpent": -1}));
        assert!(validate_request(&negative).is_err());

        let too_long = parse(json!({"answerText": "x", "timeSpent": 86401}));
        assert!(validate_request(&too_long).is_err());
    }

    #[test]
    fn test_feedback_from_keyword_evaluation() {
        let evaluation = ivs_scoring::evaluate(
            "TCP uses a three-way handshake",
            "TCP establishes a connection with a three-way handshake",
        );
        let score = evaluation.score;

        let feedback = Feedback::new(evaluation, None);
        assert_eq!(feedback.score, score);
        assert_eq!(feedback.source, ScoreSource::Keyword);
        assert!(!feedback.matched_keywords.is_empty());
    }

    #[test]
    fn test_feedback_prefers_ai_score() {
        let evaluation = ivs_scoring::evaluate("nothing relevant", "TCP handshake");
        let ai = AiScore {
            score: 91,
            highlights: vec!["Clear".to_string()],
            improvements: vec![],
            suggestions: vec![],
        };

        let feedback = Feedback::new(evaluation, Some(ai));
        assert_eq!(feedback.score, 91);
        assert_eq!(feedback.grade, "excellent");
        assert_eq!(feedback.highlights, vec!["Clear".to_string()]);
        assert_eq!(feedback.source, ScoreSource::Ai);
        assert!(feedback.missing_keywords.contains(&"tcp".to_string()));
    }

    #[test]
    fn test_feedback_roundtrips_through_json() {
        let feedback = Feedback::new(ivs_scoring::evaluate("a b", "c d"), None);
        let value = serde_json::to_value(&feedback).expect("serializable");
        assert_eq!(value["source"], "keyword");
        let back: Feedback = serde_json::from_value(value).expect("deserializable");
        assert_eq!(back, feedback);
    }
}
