use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Run `validator` rules and turn failures into a single readable message.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), ApiError> {
    request
        .validate()
        .map_err(|errors| ApiError::Validation(describe(&errors)))
}

fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid ({})", e.code),
            })
        })
        .collect();

    messages.sort();
    messages.dedup();
    messages.join("; ")
}

/// `page` / `pageSize` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub page_size: i64,
}

impl PageParams {
    pub fn resolve(&self) -> Result<Page, ApiError> {
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page < 1 {
            return Err(ApiError::Validation(
                "Page must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ApiError::Validation(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        Ok(Page { page, page_size })
    }
}

impl Page {
    pub const fn limit(&self) -> i64 {
        self.page_size
    }

    pub const fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// Normalize an optional difficulty filter to `easy`, `medium` or `hard`.
pub fn parse_difficulty(difficulty: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(value) = difficulty.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let normalized = value.to_lowercase();
    match normalized.as_str() {
        "easy" | "medium" | "hard" => Ok(Some(normalized)),
        _ => Err(ApiError::Validation(format!(
            "Invalid difficulty: '{value}'. Must be one of easy, medium, hard"
        ))),
    }
}

/// Trim `text` and check it is non-empty and at most `max_chars` characters.
pub fn required_text(text: &str, field: &str, max_chars: usize) -> Result<String, ApiError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ApiError::Validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }

    Ok(trimmed.to_string())
}

/// Treat blank optional strings as missing.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// URL-friendly id for a category name: `Data Structures & Algorithms`
/// becomes `data-structures-algorithms`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Name cannot be empty"))]
        name: String,
        #[validate(range(min = 1, max = 5))]
        count: u32,
    }

    #[test]
    fn test_validate_request_messages() {
        let ok = Sample {
            name: "x".to_string(),
            count: 3,
        };
        assert!(validate_request(&ok).is_ok());

        let bad = Sample {
            name: String::new(),
            count: 9,
        };
        match validate_request(&bad) {
            Err(ApiError::Validation(msg)) => {
                assert!(msg.contains("Name cannot be empty"), "{msg}");
                assert!(msg.contains("count is invalid (range)"), "{msg}");
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_page_params_defaults_and_offset() {
        let page = PageParams::default().resolve().expect("defaults are valid");
        assert_eq!(page, Page { page: 1, page_size: 20 });
        assert_eq!(page.offset(), 0);

        let page = PageParams {
            page: Some(3),
            page_size: Some(10),
        }
        .resolve()
        .expect("valid page");
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_page_params_bounds() {
        let zero_page = PageParams {
            page: Some(0),
            page_size: None,
        };
        assert!(zero_page.resolve().is_err());

        let too_big = PageParams {
            page: None,
            page_size: Some(101),
        };
        assert!(too_big.resolve().is_err());

        let max = PageParams {
            page: None,
            page_size: Some(100),
        };
        assert!(max.resolve().is_ok());
    }

    #[test]
    fn test_parse_difficulty() {
        assert_eq!(parse_difficulty(None).expect("ok"), None);
        assert_eq!(parse_difficulty(Some("  ")).expect("ok"), None);
        assert_eq!(
            parse_difficulty(Some("Hard")).expect("ok"),
            Some("hard".to_string())
        );
        assert!(parse_difficulty(Some("extreme")).is_err());
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("  hi  ", "Answer", 10).expect("ok"), "hi");
        assert!(required_text("   ", "Answer", 10).is_err());
        assert!(required_text("abcdefghijk", "Answer", 10).is_err());
        // Limits count characters, not bytes
        assert!(required_text("网络协议", "Answer", 4).is_ok());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(
            slugify("Data Structures & Algorithms"),
            "data-structures-algorithms"
        );
        assert_eq!(slugify("Rust"), "rust");
        assert_eq!(slugify("  C++ / Systems  "), "c-systems");
        assert_eq!(slugify("计算机网络"), "计算机网络");
    }
}
