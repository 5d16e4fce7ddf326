//! Client for an OpenAI-compatible chat-completions provider.
//!
//! Used to score answers and to generate interview questions. Every failure
//! (transport, timeout, non-2xx status, unparsable content) surfaces as
//! [`ApiError::AiService`].

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{error::ApiError, metrics::record_ai_event};

const SCORING_PROMPT: &str = "You are a senior technical interviewer. Grade the candidate's answer \
against the reference answer. Reply with a JSON object: {\"score\": integer 0-100, \
\"highlights\": [string], \"improvements\": [string], \"suggestions\": [string]}.";

const GENERATION_PROMPT: &str = "You are a senior technical interviewer preparing an interview. \
Reply with a JSON object: {\"questions\": [{\"text\": string, \"difficulty\": \"easy\" | \"medium\" | \"hard\", \
\"category\": string, \"referenceAnswer\": string, \"followUps\": [{\"text\": string, \"referenceAnswer\": string}]}]}.";

#[derive(Clone)]
pub struct AiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

/// Score and feedback returned by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct AiScore {
    pub score: i32,
    pub highlights: Vec<String>,
    pub improvements: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawScore {
    score: f64,
    #[serde(default)]
    highlights: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub text: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub reference_answer: String,
    #[serde(default)]
    pub follow_ups: Vec<GeneratedFollowUp>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFollowUp {
    pub text: String,
    #[serde(default)]
    pub reference_answer: String,
}

fn default_difficulty() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestions {
    questions: Vec<GeneratedQuestion>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Input for question generation
#[derive(Debug, Default)]
pub struct GenerationRequest<'a> {
    pub job_description: &'a str,
    pub resume_text: Option<&'a str>,
    pub resume_file_name: Option<&'a str>,
    pub question_count: u32,
    pub include_follow_ups: bool,
}

impl AiClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5).min(timeout))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    pub async fn score_answer(
        &self,
        question: &str,
        reference_answer: &str,
        answer: &str,
    ) -> Result<AiScore, ApiError> {
        let prompt = scoring_prompt(question, reference_answer, answer);
        let raw: RawScore = self.chat("score", SCORING_PROMPT, &prompt).await?;
        Ok(raw.into())
    }

    pub async fn generate_questions(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<Vec<GeneratedQuestion>, ApiError> {
        let prompt = generation_prompt(request);
        let generated: GeneratedQuestions =
            self.chat("generate", GENERATION_PROMPT, &prompt).await?;

        let questions: Vec<GeneratedQuestion> = generated
            .questions
            .into_iter()
            .filter(|q| !q.text.trim().is_empty())
            .map(normalize_generated)
            .take(request.question_count as usize)
            .collect();

        if questions.is_empty() {
            return Err(ApiError::AiService(
                "provider returned no questions".to_string(),
            ));
        }

        Ok(questions)
    }

    async fn chat<T: DeserializeOwned>(
        &self,
        operation: &str,
        system: &str,
        user: &str,
    ) -> Result<T, ApiError> {
        let start = Instant::now();
        let result = self.send_chat(system, user).await;
        let elapsed = start.elapsed().as_secs_f64();

        record_ai_event(operation, result.is_ok(), elapsed);

        let content = result?;
        parse_content(&content)
    }

    async fn send_chat(&self, system: &str, user: &str) -> Result<String, ApiError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.2,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::AiService(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::AiService(format!(
                "provider responded with status {status}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ApiError::AiService(format!("invalid response body: {e}")))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ApiError::AiService("response contained no message".to_string()))
    }
}

impl From<RawScore> for AiScore {
    fn from(raw: RawScore) -> Self {
        Self {
            score: raw.score.round().clamp(0.0, 100.0) as i32,
            highlights: raw.highlights,
            improvements: raw.improvements,
            suggestions: raw.suggestions,
        }
    }
}

/// Parse the JSON object in a message, tolerating a surrounding code fence.
fn parse_content<T: DeserializeOwned>(content: &str) -> Result<T, ApiError> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(json.trim())
        .map_err(|e| ApiError::AiService(format!("unexpected content: {e}")))
}

fn normalize_generated(mut question: GeneratedQuestion) -> GeneratedQuestion {
    question.text = question.text.trim().to_string();
    question.difficulty = question.difficulty.trim().to_lowercase();
    if !matches!(question.difficulty.as_str(), "easy" | "medium" | "hard") {
        question.difficulty = default_difficulty();
    }
    if question.category.trim().is_empty() {
        question.category = "General".to_string();
    } else {
        question.category = question.category.trim().to_string();
    }
    question.follow_ups.retain(|f| !f.text.trim().is_empty());
    question
}

fn scoring_prompt(question: &str, reference_answer: &str, answer: &str) -> String {
    format!(
        "Question:\n{question}\n\nReference answer:\n{reference_answer}\n\nCandidate answer:\n{answer}"
    )
}

fn generation_prompt(request: &GenerationRequest<'_>) -> String {
    let mut prompt = format!(
        "Write {} interview questions for this job description:\n{}\n",
        request.question_count, request.job_description
    );

    if let Some(text) = request.resume_text {
        prompt.push_str(&format!("\nCandidate resume:\n{text}\n"));
    } else if let Some(name) = request.resume_file_name {
        prompt.push_str(&format!("\nThe candidate uploaded a resume named \"{name}\".\n"));
    }

    if request.include_follow_ups {
        prompt.push_str("\nGive each question one or two follow-up questions.");
    } else {
        prompt.push_str("\nLeave followUps empty.");
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_plain_and_fenced() {
        let plain: RawScore = parse_content(r#"{"score": 72.6, "highlights": ["clear"]}"#)
            .expect("plain JSON should parse");
        assert_eq!(AiScore::from(plain).score, 73);

        let fenced: RawScore = parse_content("```json\n{\"score\": 40}\n```")
            .expect("fenced JSON should parse");
        assert_eq!(fenced.score, 40.0);
        assert!(fenced.improvements.is_empty());
    }

    #[test]
    fn test_parse_content_rejects_garbage() {
        let result: Result<RawScore, _> = parse_content("I think this answer is good");
        assert!(matches!(result, Err(ApiError::AiService(_))));
    }

    #[test]
    fn test_score_is_clamped() {
        let high = AiScore::from(RawScore {
            score: 140.0,
            highlights: vec![],
            improvements: vec![],
            suggestions: vec![],
        });
        assert_eq!(high.score, 100);

        let low = AiScore::from(RawScore {
            score: -3.0,
            highlights: vec![],
            improvements: vec![],
            suggestions: vec![],
        });
        assert_eq!(low.score, 0);
    }

    #[test]
    fn test_normalize_generated_question() {
        let parsed: GeneratedQuestions = parse_content(
            r#"{"questions": [{"text": " What is TCP? ", "difficulty": "Expert",
                 "followUps": [{"text": ""}, {"text": "And UDP?"}]}]}"#,
        )
        .expect("questions should parse");

        let question = normalize_generated(parsed.questions[0].clone());
        assert_eq!(question.text, "What is TCP?");
        assert_eq!(question.difficulty, "medium");
        assert_eq!(question.category, "General");
        assert_eq!(question.follow_ups.len(), 1);
        assert_eq!(question.follow_ups[0].text, "And UDP?");
    }

    #[test]
    fn test_generation_prompt_mentions_resume() {
        let request = GenerationRequest {
            job_description: "Backend engineer, Rust and Postgres",
            resume_text: None,
            resume_file_name: Some("cv.pdf"),
            question_count: 5,
            include_follow_ups: false,
        };

        let prompt = generation_prompt(&request);
        assert!(prompt.starts_with("Write 5 interview questions"));
        assert!(prompt.contains("cv.pdf"));
        assert!(prompt.contains("Leave followUps empty"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = AiClient::new(
            "key".to_string(),
            "https://api.example.com/v1/",
            "model".to_string(),
            Duration::from_secs(10),
        )
        .expect("client should build");
        assert_eq!(client.base_url, "https://api.example.com/v1");
    }
}
