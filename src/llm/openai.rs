//! OpenAI-compatible chat completion client.
//!
//! Works against any endpoint speaking the `/chat/completions` protocol;
//! Groq is the default. One request per call, no retries, no streaming.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{AppError, Result};
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OpenAI-compatible client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "llama3-8b-8192").
    pub model: String,
    /// API base URL, e.g. `https://api.groq.com/openai/v1`.
    pub base_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    /// Creates a new config with the given API key, model and base URL.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: Url) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

/// OpenAI-compatible LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Converts internal messages to the wire format.
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Maps a non-success response to an error.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> AppError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return AppError::llm("Authentication failed. Check your API key.");
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return AppError::llm("Rate limited. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(body) {
            return AppError::llm(format!(
                "Completion API error: {}",
                error_response.error.message
            ));
        }

        AppError::llm(format!("Completion API error ({}): {}", status, body))
    }

    fn map_request_error(e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::llm("Request timed out. Try again.")
        } else if e.is_connect() {
            AppError::llm("Failed to connect to the completion API. Check your network.")
        } else {
            AppError::llm(format!("Request failed: {}", e))
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            stream: false,
        };

        debug!(
            "Completion request to {} (model {})",
            self.config.completions_url(),
            self.config.model
        );

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::llm(format!("Failed to parse response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::llm("No response from the completion API"))
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
