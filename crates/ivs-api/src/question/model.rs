use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use ivs_db::models::{FollowUp, Question};

use crate::{
    export::ExportQuestion,
    validation::{PageParams, slugify},
};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: Uuid,
    pub text: String,
    pub difficulty: String,
    pub category: String,
    pub reference_answer: String,
    /// `[{text, url}]`
    pub resources: Value,
    pub tags: Vec<String>,
    pub source: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_ups: Option<Vec<FollowUpResponse>>,
}

impl From<Question> for QuestionResponse {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            text: question.text,
            difficulty: question.difficulty,
            category: question.category,
            reference_answer: question.reference_answer,
            resources: question.resources,
            tags: question.tags,
            source: question.source,
            created_at: question.created_at,
            follow_ups: None,
        }
    }
}

impl QuestionResponse {
    pub fn with_follow_ups(mut self, follow_ups: Vec<FollowUpResponse>) -> Self {
        self.follow_ups = Some(follow_ups);
        self
    }

    pub fn to_export(&self) -> (String, ExportQuestion) {
        (
            self.category.clone(),
            ExportQuestion {
                text: self.text.clone(),
                difficulty: Some(self.difficulty.clone()),
                reference_answer: Some(self.reference_answer.clone()),
                ..Default::default()
            },
        )
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpResponse {
    pub id: Uuid,
    pub text: String,
    pub reference_answer: String,
    pub position: i32,
}

impl From<FollowUp> for FollowUpResponse {
    fn from(follow_up: FollowUp) -> Self {
        Self {
            id: follow_up.id,
            text: follow_up.text,
            reference_answer: follow_up.reference_answer,
            position: follow_up.position,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionGroup {
    pub category: String,
    pub questions: Vec<QuestionResponse>,
}

/// Group questions by category, keeping categories in order of first
/// appearance.
pub fn group_by_category(questions: Vec<QuestionResponse>) -> Vec<QuestionGroup> {
    let mut groups: Vec<QuestionGroup> = Vec::new();

    for question in questions {
        match groups.iter_mut().find(|g| g.category == question.category) {
            Some(group) => group.questions.push(question),
            None => groups.push(QuestionGroup {
                category: question.category.clone(),
                questions: vec![question],
            }),
        }
    }

    groups
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPage {
    pub items: Vec<QuestionGroup>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    /// Slug of the category name
    pub id: String,
    pub name: String,
    pub question_count: i64,
}

impl CategoryResponse {
    pub fn new(name: String, question_count: i64) -> Self {
        Self {
            id: slugify(&name),
            name,
            question_count,
        }
    }
}

/// Query string of `GET /questions`
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ListQuery {
    pub const fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub filters: SearchFilters,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub question_ids: Vec<Uuid>,
    /// `json` or `txt`
    pub format: Option<String>,
}

/// Where generated questions came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Ai,
    Bank,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub items: Vec<QuestionGroup>,
    pub total: usize,
    pub source: GenerationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(category: &str, text: &str) -> QuestionResponse {
        QuestionResponse {
            id: Uuid::new_v4(),
            text: text.to_string(),
            difficulty: "medium".to_string(),
            category: category.to_string(),
            reference_answer: String::new(),
            resources: json!([]),
            tags: vec![],
            source: "bank".to_string(),
            created_at: Utc::now(),
            follow_ups: None,
        }
    }

    #[test]
    fn test_group_by_category_keeps_order() {
        let groups = group_by_category(vec![
            question("Rust", "a"),
            question("Databases", "b"),
            question("Rust", "c"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, "Rust");
        assert_eq!(groups[0].questions.len(), 2);
        assert_eq!(groups[0].questions[1].text, "c");
        assert_eq!(groups[1].category, "Databases");
    }

    #[test]
    fn test_follow_ups_hidden_unless_loaded() {
        let value = serde_json::to_value(question("Rust", "a")).expect("serializable");
        assert!(value.get("followUps").is_none());
        assert!(value.get("referenceAnswer").is_some());

        let value = serde_json::to_value(question("Rust", "a").with_follow_ups(vec![]))
            .expect("serializable");
        assert_eq!(value["followUps"], json!([]));
    }

    #[test]
    fn test_category_slug() {
        let category = CategoryResponse::new("Data Structures & Algorithms".to_string(), 3);
        assert_eq!(category.id, "data-structures-algorithms");
        assert_eq!(category.question_count, 3);
    }

    #[test]
    fn test_search_request_defaults() {
        let request: SearchRequest =
            serde_json::from_value(json!({"query": "tcp"})).expect("valid body");
        assert_eq!(request.query, "tcp");
        assert!(request.filters.page.is_none());
    }
}
