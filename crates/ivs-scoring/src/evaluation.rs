//! Heuristic answer evaluation against a reference answer.

use serde::{Deserialize, Serialize};

use crate::keywords::keywords;

/// Minimum score for an answer to count as correct.
pub const PASS_SCORE: i32 = 60;

/// Minimum score for a follow-up question to be offered.
pub const FOLLOW_UP_SCORE: i32 = 70;

/// Score given when the reference answer has no usable keywords.
const NEUTRAL_SCORE: i32 = 60;

/// Keywords named in feedback sentences.
const MAX_NAMED_KEYWORDS: usize = 5;

/// Keywords returned in the matched/missing lists.
const MAX_LISTED_KEYWORDS: usize = 10;

/// Feedback tier derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    /// 90 and above
    Excellent,
    /// 80..90
    Good,
    /// 60..80
    Fair,
    /// Below 60
    NeedsWork,
}

impl Grade {
    pub const fn from_score(score: i32) -> Self {
        match score {
            s if s >= 90 => Self::Excellent,
            s if s >= 80 => Self::Good,
            s if s >= PASS_SCORE => Self::Fair,
            _ => Self::NeedsWork,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::NeedsWork => "needs_work",
        }
    }

    /// Headline shown next to the score
    pub const fn summary(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent answer",
            Self::Good => "Good answer",
            Self::Fair => "Acceptable answer with room for improvement",
            Self::NeedsWork => "Answer needs more work",
        }
    }

    const fn suggestion(&self) -> &'static str {
        match self {
            Self::Excellent => "Practise delivering this answer concisely under time pressure",
            Self::Good => "Add a concrete example or a trade-off to round out the answer",
            Self::Fair => {
                "Review the reference answer and restate the core concepts in your own words"
            }
            Self::NeedsWork => "Study the underlying topic before retrying this question",
        }
    }
}

/// Result of evaluating one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub score: i32,
    pub grade: Grade,
    pub highlights: Vec<String>,
    pub improvements: Vec<String>,
    pub suggestions: Vec<String>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

/// Whether a score counts as a correct answer.
pub const fn is_passing(score: i32) -> bool {
    score >= PASS_SCORE
}

/// Whether a score is high enough to unlock a follow-up question.
pub const fn offers_follow_up(score: i32) -> bool {
    score >= FOLLOW_UP_SCORE
}

/// Score an answer from 0 to 100.
///
/// * Blank answer: 0
/// * Reference without keywords: 60
/// * Otherwise `20 + 80 × coverage`, where coverage is the share of the
///   reference keywords found in the answer
pub fn score_answer(answer: &str, reference: &str) -> i32 {
    if answer.trim().is_empty() {
        return 0;
    }

    let expected = keywords(reference);
    if expected.is_empty() {
        return NEUTRAL_SCORE;
    }

    let given = keywords(answer);
    let matched = expected.intersection(&given).count();
    coverage_score(matched, expected.len())
}

fn coverage_score(matched: usize, expected: usize) -> i32 {
    let coverage = matched as f64 / expected as f64;
    (20.0 + 80.0 * coverage).round() as i32
}

/// Score an answer and build tiered feedback for it.
pub fn evaluate(answer: &str, reference: &str) -> Evaluation {
    if answer.trim().is_empty() {
        let grade = Grade::NeedsWork;
        return Evaluation {
            score: 0,
            grade,
            highlights: Vec::new(),
            improvements: vec!["No answer was provided".to_string()],
            suggestions: vec![grade.suggestion().to_string()],
            matched_keywords: Vec::new(),
            missing_keywords: Vec::new(),
        };
    }

    let expected = keywords(reference);
    let given = keywords(answer);

    let matched: Vec<String> = expected.intersection(&given).cloned().collect();
    let missing: Vec<String> = expected.difference(&given).cloned().collect();

    let score = if expected.is_empty() {
        NEUTRAL_SCORE
    } else {
        coverage_score(matched.len(), expected.len())
    };
    let grade = Grade::from_score(score);

    let mut highlights = Vec::new();
    if !matched.is_empty() {
        highlights.push(format!("Covers key points: {}", named(&matched)));
    }
    if grade == Grade::Excellent {
        highlights.push("Addresses nearly every expected point".to_string());
    }
    if answer.split_whitespace().count() >= 50 {
        highlights.push("Answer is well developed".to_string());
    }

    let mut improvements = Vec::new();
    if !missing.is_empty() {
        improvements.push(format!("Missing key points: {}", named(&missing)));
    }
    if !is_passing(score) {
        improvements.push("Answer misses most of the expected content".to_string());
    }

    Evaluation {
        score,
        grade,
        highlights,
        improvements,
        suggestions: vec![grade.suggestion().to_string()],
        matched_keywords: matched.into_iter().take(MAX_LISTED_KEYWORDS).collect(),
        missing_keywords: missing.into_iter().take(MAX_LISTED_KEYWORDS).collect(),
    }
}

fn named(words: &[String]) -> String {
    words
        .iter()
        .take(MAX_NAMED_KEYWORDS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
