//! Downloadable exports of question lists and arbitrary client data.

use std::fmt::Write as _;

use axum::{
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::ApiError;

const MAX_FILE_STEM_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Txt,
}

impl ExportFormat {
    /// Parse a `format` parameter, defaulting to JSON. PDF is recognised but
    /// not supported.
    pub fn parse(format: Option<&str>) -> Result<Self, ApiError> {
        let Some(format) = format.map(str::trim).filter(|f| !f.is_empty()) else {
            return Ok(Self::default());
        };

        match format.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "txt" | "text" => Ok(Self::Txt),
            "pdf" => Err(ApiError::Validation(
                "PDF export is not supported, use json or txt".to_string(),
            )),
            _ => Err(ApiError::Validation(format!(
                "Unsupported export format: '{format}'. Must be json or txt"
            ))),
        }
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Txt => "txt",
        }
    }

    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Txt => "text/plain; charset=utf-8",
        }
    }
}

/// `?format=` of the export endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// One category block of a text export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportGroup {
    pub category: String,
    pub questions: Vec<ExportQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuestion {
    pub text: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub reference_answer: Option<String>,
    #[serde(default)]
    pub user_answer: Option<String>,
    #[serde(default)]
    pub score: Option<i32>,
}

/// Group `(category, question)` pairs, keeping categories in order of first
/// appearance.
pub fn group_by_category<I>(items: I) -> Vec<ExportGroup>
where
    I: IntoIterator<Item = (String, ExportQuestion)>,
{
    let mut groups: Vec<ExportGroup> = Vec::new();

    for (category, question) in items {
        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.questions.push(question),
            None => groups.push(ExportGroup {
                category,
                questions: vec![question],
            }),
        }
    }

    groups
}

/// Plain-text layout: a `--- category ---` header per group, then numbered
/// questions with their details indented underneath.
pub fn render_text(groups: &[ExportGroup]) -> String {
    let mut out = String::new();

    for group in groups {
        let _ = writeln!(out, "--- {} ---", group.category);
        out.push('\n');

        for (i, question) in group.questions.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, question.text);
            if let Some(difficulty) = &question.difficulty {
                let _ = writeln!(out, "   (Difficulty: {difficulty})");
            }
            if let Some(reference) = &question.reference_answer {
                let _ = writeln!(out, "   Reference answer: {reference}");
            }
            if let Some(answer) = &question.user_answer {
                let _ = writeln!(out, "   Your answer: {answer}");
            }
            if let Some(score) = question.score {
                let _ = writeln!(out, "   Score: {score}");
            }
            out.push('\n');
        }
    }

    out
}

pub fn render_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::Internal(format!("failed to serialize export: {e}")))
}

/// Render client supplied data.
///
/// For text output a list of category groups becomes a question list, a
/// string is written as is and anything else falls back to pretty JSON.
pub fn render_value(format: ExportFormat, data: &Value) -> Result<String, ApiError> {
    if is_empty_export(data) {
        return Err(ApiError::Validation("No data to export".to_string()));
    }

    match format {
        ExportFormat::Json => render_json(data),
        ExportFormat::Txt => {
            if let Value::String(text) = data {
                return Ok(text.clone());
            }
            match serde_json::from_value::<Vec<ExportGroup>>(data.clone()) {
                Ok(groups) => Ok(render_text(&groups)),
                Err(_) => render_json(data),
            }
        }
    }
}

fn is_empty_export(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Keep a file name to letters, digits, `-` and `_`, dropping any extension.
pub fn sanitize_file_stem(name: Option<&str>, fallback: &str) -> String {
    let name = name.map(str::trim).unwrap_or_default();
    let stem = match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.chars().all(char::is_alphanumeric) =>
        {
            stem
        }
        _ => name,
    };

    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(MAX_FILE_STEM_LEN)
        .collect();
    let cleaned = cleaned.trim_matches('_');

    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned.to_string()
    }
}

/// A rendered export, sent as an attachment
#[derive(Debug)]
pub struct ExportFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub body: String,
}

impl ExportFile {
    pub fn new(file_stem: &str, format: ExportFormat, body: String) -> Self {
        Self {
            file_name: format!("{file_stem}.{}", format.extension()),
            format,
            body,
        }
    }

    /// Export groups as pretty JSON or as the text layout.
    pub fn from_groups<T: Serialize>(
        file_stem: &str,
        format: ExportFormat,
        json: &T,
        groups: &[ExportGroup],
    ) -> Result<Self, ApiError> {
        let body = match format {
            ExportFormat::Json => render_json(json)?,
            ExportFormat::Txt => render_text(groups),
        };
        Ok(Self::new(file_stem, format, body))
    }
}

impl IntoResponse for ExportFile {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.file_name);
        let disposition = HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

        (
            [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(self.format.content_type()),
                ),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.body,
        )
            .into_response()
    }
}
