// ABOUTME: OpenAI-compatible chat-completion client used for the DeepSeek upstream
// ABOUTME: Single-shot and streaming completions with friendly categorized failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # `OpenAI`-Compatible Provider
//!
//! Talks to any endpoint implementing `POST {base_url}/chat/completions`.
//! The default deployment points it at `DeepSeek`.
//!
//! Failures are mapped to four categories whose messages are safe to show to
//! the end user. The raw upstream body only ever reaches the logs.
//!
//! | Upstream condition | Code | Message |
//! |---|---|---|
//! | 401 / 403 | `ExternalAuthFailed` | API认证失败，请检查API密钥 |
//! | 429 | `ExternalRateLimited` | API调用频率过高，请稍后重试 |
//! | timeout, 408, 504 | `ExternalTimeout` | API请求超时，请稍后重试 |
//! | anything else | `ExternalServiceUnavailable` | AI服务暂时不可用，请稍后重试 |

use std::time::Duration;

use async_trait::async_trait;
use bubble_core::constants::{ai, messages};
use bubble_core::errors::{AppError, AppResult, ErrorCode};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use super::sse_parser::create_sse_stream;
use super::{ChatMessage, ChatRequest, ChatResponse, ChatStream, LlmProvider, StreamChunk, TokenUsage};
use crate::config::AiConfig;

/// Longest slice of an upstream error body kept in logs
const LOGGED_BODY_CHARS: usize = 300;

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for OpenAiMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            role: msg.role.as_str(),
            content: &msg.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(rename = "prompt_tokens")]
    prompt: u32,
    #[serde(rename = "completion_tokens")]
    completion: u32,
    #[serde(rename = "total_tokens")]
    total: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., <https://api.deepseek.com/v1>)
    pub base_url: String,
    /// Bearer API key
    pub api_key: String,
    /// Default model to use
    pub default_model: String,
    /// Temperature applied when the request leaves it unset
    pub temperature: f32,
    /// Completion ceiling applied when the request leaves it unset
    pub max_tokens: u32,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Per-read timeout, also the cap on a whole buffered request
    pub request_timeout: Duration,
}

impl OpenAiCompatibleConfig {
    /// Derive the provider configuration from server settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no API key is set
    pub fn from_ai_config(config: &AiConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::config_missing(messages::AI_KEY_MISSING))?;
        Ok(Self {
            base_url: config.base_url.clone(),
            api_key,
            default_model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            connect_timeout: config.connect_timeout,
            request_timeout: config.request_timeout,
        })
    }
}

// ============================================================================
// Error Classification
// ============================================================================

/// Map a non-success upstream status to a categorized error
fn classify_status(status: StatusCode, body: &str) -> AppError {
    let excerpt: String = body.chars().take(LOGGED_BODY_CHARS).collect();
    warn!(status = %status, body = %excerpt, "Upstream AI request rejected");

    match status.as_u16() {
        401 | 403 => AppError::new(ErrorCode::ExternalAuthFailed, messages::AI_AUTH_FAILED),
        429 => AppError::new(ErrorCode::ExternalRateLimited, messages::AI_RATE_LIMITED),
        408 | 504 => AppError::new(ErrorCode::ExternalTimeout, messages::AI_TIMEOUT),
        _ => AppError::new(
            ErrorCode::ExternalServiceUnavailable,
            messages::AI_UNAVAILABLE,
        ),
    }
}

/// Map a transport failure (before or during the body) to a categorized error
fn classify_transport(error: reqwest::Error) -> AppError {
    error!(error = %error, "Upstream AI transport failure");
    if error.is_timeout() {
        AppError::new(ErrorCode::ExternalTimeout, messages::AI_TIMEOUT).with_source(error)
    } else {
        AppError::new(
            ErrorCode::ExternalServiceUnavailable,
            messages::AI_UNAVAILABLE,
        )
        .with_source(error)
    }
}

/// Parse one streamed payload; malformed payloads are skipped
fn parse_stream_chunk(json_str: &str) -> Option<StreamChunk> {
    let chunk = match serde_json::from_str::<OpenAiStreamChunk>(json_str) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!(error = %e, "Skipping malformed stream chunk");
            return None;
        }
    };
    let choice = chunk.choices.into_iter().next()?;
    Some(StreamChunk {
        delta: choice.delta.content.unwrap_or_default(),
        is_final: choice.finish_reason.is_some(),
        finish_reason: choice.finish_reason,
    })
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// `OpenAI`-compatible LLM provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// `request_timeout` bounds each read on the connection; buffered
    /// completions are additionally capped by it as a whole.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn add_auth_header(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.config.api_key)
    }

    fn model_for<'a>(&'a self, request: &'a ChatRequest) -> &'a str {
        request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model)
    }

    fn build_request<'a>(&'a self, request: &'a ChatRequest, stream: bool) -> OpenAiRequest<'a> {
        OpenAiRequest {
            model: self.model_for(request),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature.unwrap_or(self.config.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            stream,
        }
    }

    async fn send(&self, body: &OpenAiRequest<'_>) -> AppResult<reqwest::Response> {
        debug!(
            messages = body.messages.len(),
            stream = body.stream,
            "Sending chat completion request to {}",
            ai::PROVIDER_NAME
        );

        let mut request = self
            .add_auth_header(self.client.post(self.api_url("chat/completions")))
            .json(body);
        if !body.stream {
            request = request.timeout(self.config.request_timeout);
        }

        let response = request
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_status(status, &body))
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %self.model_for(request)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let body = self.build_request(request, false);
        let response = self.send(&body).await?;

        let text = response.text().await.map_err(classify_transport)?;
        let parsed: OpenAiResponse = serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, "Failed to parse chat completion response");
            AppError::new(ErrorCode::ExternalServiceUnavailable, messages::AI_UNAVAILABLE)
                .with_source(e)
        })?;

        let choice = parsed.choices.into_iter().next();
        let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
        let content = choice
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                warn!("Upstream returned an empty completion");
                AppError::new(ErrorCode::ExternalServiceUnavailable, messages::AI_UNAVAILABLE)
            })?;

        debug!(
            chars = content.chars().count(),
            finish_reason = ?finish_reason,
            "Received chat completion"
        );

        Ok(ChatResponse {
            content,
            model: parsed.model.unwrap_or_else(|| body.model.to_owned()),
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt,
                completion_tokens: u.completion,
                total_tokens: u.total,
            }),
            finish_reason,
        })
    }

    #[instrument(skip(self, request), fields(model = %self.model_for(request)))]
    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, AppError> {
        let body = self.build_request(request, true);
        let response = self.send(&body).await?;

        Ok(create_sse_stream(
            response.bytes_stream(),
            parse_stream_chunk,
            classify_transport,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let err = classify_status(StatusCode::UNAUTHORIZED, "{}");
        assert_eq!(err.code, ErrorCode::ExternalAuthFailed);
        assert_eq!(err.user_message(), messages::AI_AUTH_FAILED);

        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(err.user_message(), messages::AI_RATE_LIMITED);

        let err = classify_status(StatusCode::GATEWAY_TIMEOUT, "");
        assert_eq!(err.code, ErrorCode::ExternalTimeout);

        let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, "stack trace");
        assert_eq!(err.user_message(), messages::AI_UNAVAILABLE);
        assert!(!err.message.contains("stack trace"));
    }

    #[test]
    fn test_parse_stream_chunk() {
        let chunk =
            parse_stream_chunk(r#"{"choices":[{"delta":{"content":"你好"},"finish_reason":null}]}"#)
                .unwrap();
        assert_eq!(chunk.delta, "你好");
        assert!(!chunk.is_final);

        let last = parse_stream_chunk(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#)
            .unwrap();
        assert!(last.is_final);
        assert!(last.delta.is_empty());

        assert!(parse_stream_chunk("{broken").is_none());
        assert!(parse_stream_chunk(r#"{"choices":[]}"#).is_none());
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = OpenAiCompatibleConfig::from_ai_config(&AiConfig::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissing);
        assert_eq!(err.user_message(), messages::AI_KEY_MISSING);
    }
}
