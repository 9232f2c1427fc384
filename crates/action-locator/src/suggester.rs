//! Probabilistic candidate suggestion
//!
//! The suggester is an unreliable external collaborator. Whatever it sends
//! back goes through [`sanitize_suggestions`]; anything that still fails to
//! parse turns into [`SuggesterReply::FlagForReview`] instead of an error.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::SuggestError;

pub const INVALID_OUTPUT_REASON: &str = "LLM returned invalid JSON";

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([\]}])").expect("trailing comma pattern"));

/// One suggested locator expression with the suggester's confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub locator: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Suggestion {
    pub fn new(locator: impl Into<String>, confidence: f64) -> Self {
        Self {
            locator: locator.into(),
            confidence: confidence.clamp(0.0, 1.0),
            strategy: None,
            reason: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggesterReply {
    Candidates { suggestions: Vec<Suggestion> },
    FlagForReview { reasoning: String },
}

impl SuggesterReply {
    pub fn flag(reasoning: impl Into<String>) -> Self {
        SuggesterReply::FlagForReview {
            reasoning: reasoning.into(),
        }
    }

    /// Suggestions to rank; a review flag contributes none.
    pub fn into_suggestions(self) -> Vec<Suggestion> {
        match self {
            SuggesterReply::Candidates { suggestions } => suggestions,
            SuggesterReply::FlagForReview { .. } => Vec::new(),
        }
    }
}

#[async_trait]
pub trait CandidateSuggester: Send + Sync {
    async fn suggest(&self, snapshot_path: &Path, original_expression: &str) -> SuggesterReply;
}

/// Cleans up typical model output and parses it into suggestions.
pub fn sanitize_suggestions(raw: &str) -> Result<Vec<Suggestion>, SuggestError> {
    let trimmed = strip_fences(raw.trim());
    if trimmed.is_empty() {
        return Err(SuggestError::Empty);
    }
    let unescaped = trimmed.replace("\\'", "'");
    let mut cleaned = TRAILING_COMMA.replace_all(&unescaped, "$1").into_owned();
    if cleaned.starts_with('{') && cleaned.ends_with('}') {
        cleaned = format!("[{}]", cleaned);
    }

    let parsed: Value =
        serde_json::from_str(&cleaned).map_err(|err| SuggestError::Malformed(err.to_string()))?;
    let Value::Array(items) = parsed else {
        return Err(SuggestError::Malformed("expected a JSON list".to_string()));
    };

    let mut suggestions = Vec::with_capacity(items.len());
    for item in items {
        match suggestion_from_value(&item) {
            Some(suggestion) => suggestions.push(suggestion),
            None => {
                warn!(target: "suggester", entry = %item, "skipping suggestion without locator")
            }
        }
    }
    Ok(suggestions)
}

/// Sanitizes raw output into a reply; failures flag the case for review.
pub fn reply_from_output(raw: &str) -> SuggesterReply {
    match sanitize_suggestions(raw) {
        Ok(suggestions) => SuggesterReply::Candidates { suggestions },
        Err(err) => {
            warn!(target: "suggester", error = %err, "malformed suggester output");
            SuggesterReply::flag(INVALID_OUTPUT_REASON)
        }
    }
}

fn strip_fences(raw: &str) -> &str {
    let Some(body) = raw.strip_prefix("```") else {
        return raw;
    };
    let body = match body.find('\n') {
        Some(newline) => &body[newline + 1..],
        None => body,
    };
    body.trim_end().trim_end_matches("```").trim()
}

fn suggestion_from_value(item: &Value) -> Option<Suggestion> {
    let locator = item.get("locator")?.as_str()?.trim();
    if locator.is_empty() {
        return None;
    }
    let confidence = match item.get("confidence") {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    let text_field = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
    Some(Suggestion {
        strategy: text_field("strategy"),
        reason: text_field("reason"),
        ..Suggestion::new(locator, confidence)
    })
}

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Suggester backed by an Ollama chat endpoint.
pub struct OllamaSuggester {
    client: Client,
    config: OllamaConfig,
}

impl OllamaSuggester {
    pub fn new(config: OllamaConfig) -> Result<Self, SuggestError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| SuggestError::Transport(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    async fn request(
        &self,
        snapshot: &str,
        original_expression: &str,
    ) -> Result<String, SuggestError> {
        let url = format!("{}/api/chat", self.config.api_base.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Original locator: {}\n\nAccessibility snapshot:\n{}",
                        original_expression, snapshot
                    ),
                },
            ],
        };

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(SuggestError::Transport(format!("ollama returned {}: {}", status, text)));
        }
        let response: ChatResponse = response.json().await?;
        Ok(response.message.content)
    }
}

#[async_trait]
impl CandidateSuggester for OllamaSuggester {
    async fn suggest(&self, snapshot_path: &Path, original_expression: &str) -> SuggesterReply {
        let snapshot = match tokio::fs::read_to_string(snapshot_path).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                let err = SuggestError::Snapshot(format!("{}: {}", snapshot_path.display(), err));
                warn!(target: "suggester", error = %err, "cannot read snapshot");
                return SuggesterReply::flag(err.to_string());
            }
        };

        info!(
            target: "suggester",
            model = %self.config.model,
            original = original_expression,
            "requesting suggestions"
        );
        match self.request(&snapshot, original_expression).await {
            Ok(raw) => reply_from_output(&raw),
            Err(err) => {
                warn!(target: "suggester", error = %err, "suggester request failed");
                SuggesterReply::flag(err.to_string())
            }
        }
    }
}

const SYSTEM_PROMPT: &str = r#"You repair broken Playwright locators.
You receive the locator that failed and the accessibility snapshot of the page (YAML).
Find the element the locator was meant to target and propose replacement locators.

Rules:
- Use only roles, names and text that appear in the snapshot.
- Prefer page.getByRole(role, { name }) over getByLabel, getByPlaceholder and getByText.
- Use page.locator(css) only when nothing accessible identifies the element.
- Every locator must match exactly one element.

Answer with a JSON list and nothing else:
[{"locator": "page.getByRole('button', { name: 'Log in' })", "value": "Log in", "role": "button",
  "attributes": {}, "confidence": 0.0-1.0, "strategy": "role", "reason": "short explanation"}]"#;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_common_model_mistakes() {
        let raw = "```json\n[{\"locator\": \"page.getByRole('button', { name: \\'Log in\\' })\", \"confidence\": 0.92,},]\n```";
        let suggestions = sanitize_suggestions(raw).unwrap();
        assert_eq!(
            suggestions,
            vec![Suggestion::new("page.getByRole('button', { name: 'Log in' })", 0.92)]
        );
    }

    #[test]
    fn lone_object_is_wrapped() {
        let suggestions = sanitize_suggestions(
            r#"{"locator": "page.getByLabel('Email')", "confidence": "0.7", "reason": "label"}"#,
        )
        .unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].confidence, 0.7);
        assert_eq!(suggestions[0].reason.as_deref(), Some("label"));
    }

    #[test]
    fn confidence_defaults_and_clamps() {
        let suggestions = sanitize_suggestions(
            r#"[{"locator": "page.locator('#a')"}, {"locator": "page.locator('#b')", "confidence": 3}, {"value": "x"}]"#,
        )
        .unwrap();
        let confidences: Vec<_> = suggestions.iter().map(|s| s.confidence).collect();
        assert_eq!(confidences, vec![0.0, 1.0]);
    }

    #[test]
    fn malformed_output_flags_for_review() {
        assert!(matches!(sanitize_suggestions("   "), Err(SuggestError::Empty)));
        assert!(matches!(
            sanitize_suggestions("I could not find the element"),
            Err(SuggestError::Malformed(_))
        ));
        assert_eq!(
            reply_from_output("I could not find the element"),
            SuggesterReply::flag(INVALID_OUTPUT_REASON)
        );
        assert!(reply_from_output("not json").into_suggestions().is_empty());
    }

    #[test]
    fn chat_request_shape() {
        let body = ChatRequest {
            model: "llama3.1:8b",
            stream: false,
            options: ChatOptions { temperature: 0.0 },
            messages: vec![ChatMessage {
                role: "user",
                content: "hi".to_string(),
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], Value::Bool(false));
        assert_eq!(json["options"]["temperature"], serde_json::json!(0.0));
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
