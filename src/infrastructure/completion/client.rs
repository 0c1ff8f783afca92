//! HTTP client for an OpenAI-style chat completions endpoint.
//!
//! Sends the rendered messages in one request and parses the first
//! choice's content as a JSON document.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::models::CompletionConfig;
use crate::domain::ports::{ChatMessage, CompletionClient, CompletionError, Role};
use crate::services::extract_json_from_response;

use super::error::CompletionApiError;

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Chat completion client backed by an OpenAI-compatible API.
#[derive(Debug)]
pub struct OpenAiCompletionClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    api_key: String,
}

impl OpenAiCompletionClient {
    /// Build a client from configuration, reading the API key from the
    /// environment variable the configuration names.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, CompletionApiError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| CompletionApiError::MissingApiKey(config.api_key_env.clone()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            api_key,
        })
    }

    async fn request(&self, messages: &[ChatMessage]) -> Result<Value, CompletionApiError> {
        let wire_messages: Vec<WireMessage<'_>> = messages
            .iter()
            .map(|m| WireMessage {
                role: match m.role {
                    Role::System => "system",
                    Role::User => "user",
                },
                content: &m.content,
            })
            .collect();

        let body = CompletionRequest {
            model: &self.model,
            messages: wire_messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(url = %url, model = %self.model, "Sending completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionApiError::Timeout
                } else {
                    CompletionApiError::NetworkError(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED => CompletionApiError::InvalidApiKey,
                StatusCode::TOO_MANY_REQUESTS => CompletionApiError::RateLimitExceeded,
                s if s.is_server_error() => CompletionApiError::ServerError(s.as_u16(), text),
                s => CompletionApiError::UnexpectedStatus(s.as_u16(), text),
            });
        }

        let parsed: CompletionResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(CompletionApiError::EmptyResponse)?;

        let document = extract_json_from_response(&content);
        serde_json::from_str(&document).map_err(|e| {
            warn!(error = %e, "Completion content failed to parse as JSON");
            CompletionApiError::InvalidContent(e.to_string())
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Value, CompletionError> {
        self.request(messages).await.map_err(CompletionError::from)
    }
}
