use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// User profile, without credentials
#[derive(Debug, Clone, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to check a login attempt
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
}

/// Interview question, either from the shared bank or generated for one user
#[derive(Debug, Clone, FromRow)]
pub struct Question {
    pub id: Uuid,
    /// `None` for bank questions
    pub owner_id: Option<Uuid>,
    pub text: String,
    /// `easy`, `medium` or `hard`
    pub difficulty: String,
    pub category: String,
    pub reference_answer: String,
    /// JSON array of `{text, url}` objects
    pub resources: Value,
    pub tags: Vec<String>,
    /// `bank` or `generated`
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct FollowUp {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub reference_answer: String,
    pub position: i32,
}

/// Question to insert
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub owner_id: Option<Uuid>,
    pub text: String,
    pub difficulty: String,
    pub category: String,
    pub reference_answer: String,
    pub resources: Value,
    pub tags: Vec<String>,
    pub source: String,
}

/// Follow-up to insert alongside a question
#[derive(Debug, Clone)]
pub struct NewFollowUp {
    pub text: String,
    pub reference_answer: String,
}

/// Filters shared by listing and searching questions
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    /// Case-insensitive match on text, category and tags
    pub query: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub question_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Answer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub parent_answer_id: Option<Uuid>,
    pub follow_up_id: Option<Uuid>,
    pub mock_session_id: Option<Uuid>,
    pub answer_text: String,
    pub time_spent: i32,
    pub metadata: Value,
    pub score: Option<i32>,
    pub feedback: Option<Value>,
    pub submitted_at: DateTime<Utc>,
    pub scored_at: Option<DateTime<Utc>>,
}

/// Answer to insert
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub parent_answer_id: Option<Uuid>,
    pub follow_up_id: Option<Uuid>,
    pub mock_session_id: Option<Uuid>,
    pub answer_text: String,
    pub time_spent: i32,
    pub metadata: Value,
}

/// Answer joined with the question it belongs to
#[derive(Debug, Clone, FromRow)]
pub struct AnswerHistoryRow {
    #[sqlx(flatten)]
    pub answer: Answer,
    pub question_text: String,
    pub category: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnswerHistoryFilter {
    pub question_id: Option<Uuid>,
    pub category: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Active or mastered mistake with its question text
#[derive(Debug, Clone, FromRow)]
pub struct Mistake {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub question_text: String,
    pub user_answer: String,
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub category: String,
    pub recorded_at: DateTime<Utc>,
    pub mastered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PracticeSet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub question_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub stored_path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MockSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub custom_topic: Option<String>,
    pub duration_minutes: i32,
    pub question_count: i32,
    /// `in_progress`, `completed` or `expired`
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub overall_score: Option<i32>,
}

/// One question of a mock interview session with the answer given, if any
#[derive(Debug, Clone, FromRow)]
pub struct MockSessionItem {
    pub position: i32,
    pub question_id: Uuid,
    pub text: String,
    pub difficulty: String,
    pub category: String,
    pub reference_answer: String,
    pub answer_id: Option<Uuid>,
    pub answer_text: Option<String>,
    pub score: Option<i32>,
    pub feedback: Option<Value>,
    pub time_spent: Option<i32>,
}

/// Per-user totals for the statistics overview
#[derive(Debug, Clone, FromRow)]
pub struct UserTotals {
    pub total_answered: i64,
    pub scored_answers: i64,
    pub average_score: Option<f64>,
    pub total_time_spent: i64,
    pub mock_interviews_completed: i64,
    pub favorites_count: i64,
    pub mistakes_count: i64,
    pub practice_sets_count: i64,
}

/// Answer count and scores of one category
#[derive(Debug, Clone, FromRow)]
pub struct CategoryScores {
    pub category: String,
    pub total_answered: i64,
    pub scores: Vec<i32>,
}

/// Answer count and scores of one calendar day (UTC)
#[derive(Debug, Clone, FromRow)]
pub struct DailyScores {
    pub day: NaiveDate,
    pub answers_count: i64,
    pub scores: Vec<i32>,
}
