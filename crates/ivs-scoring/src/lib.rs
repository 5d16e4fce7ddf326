//! Answer scoring library for IntelliView
//!
//! This crate holds the pure logic behind answer evaluation and practice
//! statistics: keyword extraction, heuristic scoring against a reference
//! answer, feedback tiers, relevance ranking and streak computation.
//!
//! Nothing in here touches the database or the network, so the API crate can
//! fall back to it whenever no external AI provider is configured.

pub mod evaluation;
pub mod keywords;
pub mod ranking;
pub mod stats;

pub use evaluation::{Evaluation, FOLLOW_UP_SCORE, Grade, PASS_SCORE, evaluate, score_answer};
pub use keywords::keywords;
pub use ranking::{rank_by_relevance, relevance};
