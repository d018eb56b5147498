//! HTTPS JSON client for the `prompt` primitive (§6, §10.4)
//!
//! Built on `reqwest`'s async client rather than its `blocking` feature:
//! every `Primitive::execute` is already an `async fn` running on the
//! Tokio runtime, so `prompt` can simply `.await` the request in place —
//! behaviorally a blocking call from the script's point of view, without
//! pulling in a second HTTP stack or panicking from inside a runtime the
//! way `reqwest::blocking` would.

use serde::{Deserialize, Serialize};

use crate::control_flow::RunError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
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
    content: String,
}

/// Configuration read once by the driver from the process environment and
/// threaded down to the `prompt` primitive.
#[derive(Clone)]
pub struct PromptConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl PromptConfig {
    /// Reads `OPENAI_API_KEY` (required), `OPENAI_API_URL` and
    /// `OPENAI_MODEL` (both optional, falling back to the OpenAI default
    /// endpoint and a small chat model).
    pub fn from_env() -> Result<Self, RunError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| RunError::AuthFailure("OPENAI_API_KEY is not set".to_string()))?;
        let base_url = std::env::var("OPENAI_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self { api_key, base_url, model })
    }
}

pub struct PromptClient {
    http: reqwest::Client,
    config: PromptConfig,
}

impl PromptClient {
    pub fn new(config: PromptConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    /// Sends `message` as a single user turn and returns the assistant's
    /// reply text. Timeouts, connection failures, non-2xx statuses, and
    /// malformed JSON all surface as `RunError::PromptFailure`.
    pub async fn complete(&self, message: &str) -> Result<String, RunError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage { role: "user", content: message }],
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RunError::PromptFailure(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RunError::PromptFailure(format!("{}: {}", status, body)));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| RunError::PromptFailure(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RunError::PromptFailure("response contained no choices".to_string()))
    }
}
