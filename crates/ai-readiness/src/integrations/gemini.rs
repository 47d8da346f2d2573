use std::fmt;

use serde::Deserialize;
use serde_json::{json, Value};

use super::{ensure_success, http_client};
use crate::assessment::gateways::{CollaboratorError, TextGenerator};
use crate::config::GeminiConfig;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// `generateContent` client for the Gemini API.
#[derive(Clone)]
pub struct GeminiTextGenerator {
    config: GeminiConfig,
    base_url: String,
}

impl fmt::Debug for GeminiTextGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiTextGenerator")
            .field("model", &self.config.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

impl GeminiTextGenerator {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl TextGenerator for GeminiTextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let response = http_client()?
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.config.model
            ))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request_body(prompt))
            .send()?;
        let generated: GenerateResponse = ensure_success(response)?.json()?;
        extract_text(generated)
    }
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [
            { "role": "user", "parts": [ { "text": prompt } ] }
        ]
    })
}

fn extract_text(response: GenerateResponse) -> Result<String, CollaboratorError> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(CollaboratorError::Rejected {
            status: 200,
            message: format!("prompt blocked: {reason}"),
        });
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| CollaboratorError::InvalidResponse("no candidates returned".to_string()))?;
    let finish_reason = candidate.finish_reason;
    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(CollaboratorError::InvalidResponse(format!(
            "empty completion (finish reason: {})",
            finish_reason.as_deref().unwrap_or("unspecified")
        )));
    }
    Ok(text)
}
