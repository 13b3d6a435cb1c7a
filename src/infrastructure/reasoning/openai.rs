//! OpenAI-compatible reasoning client
//!
//! Speaks the chat-completions wire format, which most hosted reasoning
//! services accept. Only the request/response path is implemented; the
//! workflow never streams.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::reasoning::{ReasoningClient, ReasoningError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Configuration for the OpenAI-compatible client
#[derive(Debug, Clone)]
pub struct OpenAiClientConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// Base URL of the service
    pub base_url: String,
    /// Model answering the calls
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl OpenAiClientConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Reasoning client over an OpenAI-compatible HTTP API
#[derive(Debug, Clone)]
pub struct OpenAiReasoningClient {
    client: reqwest::Client,
    auth_header: String,
    base_url: String,
    model: String,
}

impl OpenAiReasoningClient {
    /// Build a client from configuration
    pub fn new(config: OpenAiClientConfig) -> Result<Self, ReasoningError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReasoningError::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth_header: format!("Bearer {}", config.api_key),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
        })
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ReasoningClient for OpenAiReasoningClient {
    async fn invoke(&self, system_prompt: &str, prompt: &str) -> Result<String, ReasoningError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(self.chat_completions_url())
            .header("Authorization", &self.auth_header)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReasoningError::transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 429 {
            let message = response.text().await.unwrap_or_default();
            return Err(ReasoningError::rate_limited(message));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReasoningError::api(status.as_u16(), message));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::malformed(format!("Failed to parse response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ReasoningError::malformed("No choices in response"))?
            .message
            .content
            .ok_or_else(|| ReasoningError::malformed("Choice has no content"))?;

        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
