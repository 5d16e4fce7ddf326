use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use ivs_db::models::PracticeSet;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePracticeSetRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// Partial update. `description: null` clears the description, a missing
/// field leaves it unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePracticeSetRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub is_public: Option<bool>,
}

impl UpdatePracticeSetRequest {
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_public.is_none()
    }
}

/// Distinguish an explicit `null` from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionRequest {
    pub question_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSetResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub question_ids: Vec<Uuid>,
    pub question_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PracticeSet> for PracticeSetResponse {
    fn from(set: PracticeSet) -> Self {
        Self {
            id: set.id,
            owner_id: set.user_id,
            name: set.name,
            description: set.description,
            is_public: set.is_public,
            question_count: set.question_ids.len(),
            question_ids: set.question_ids,
            created_at: set.created_at,
            updated_at: set.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_distinguishes_null_from_missing() {
        let missing: UpdatePracticeSetRequest =
            serde_json::from_value(json!({"name": "Backend"})).expect("valid body");
        assert_eq!(missing.description, None);
        assert!(!missing.is_empty());

        let cleared: UpdatePracticeSetRequest =
            serde_json::from_value(json!({"description": null})).expect("valid body");
        assert_eq!(cleared.description, Some(None));

        let set: UpdatePracticeSetRequest =
            serde_json::from_value(json!({"description": "Mixed"})).expect("valid body");
        assert_eq!(set.description, Some(Some("Mixed".to_string())));

        let empty: UpdatePracticeSetRequest = serde_json::from_value(json!({})).expect("valid body");
        assert!(empty.is_empty());
    }

    #[test]
    fn test_create_defaults_to_private() {
        let request: CreatePracticeSetRequest =
            serde_json::from_value(json!({"name": "Networks"})).expect("valid body");
        assert!(!request.is_public);
        assert!(request.description.is_none());
    }
}
