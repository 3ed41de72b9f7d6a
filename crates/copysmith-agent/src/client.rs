//! Anthropic-style completion-service client
//!
//! `CompletionService` is the seam the conversation loop, grader, and tests
//! depend on; `AnthropicClient` is the production implementation with rate
//! limit retry and exponential backoff.

use crate::types::{CompletionRequest, CompletionResponse, StopReason, ToolCatalogEntry};
use async_trait::async_trait;
use copysmith_core::{ContentBlock, CopysmithError, Model, Result, Usage};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

// Rate limit retry configuration
const MAX_RETRIES: u32 = 5;
const INITIAL_BACKOFF_SECS: u64 = 30;
const MAX_BACKOFF_SECS: u64 = 300; // 5 minutes max

/// External LLM endpoint that accepts a conversation and returns either
/// final text or a request to invoke tools.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

/// Production completion-service client
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: Model,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [copysmith_core::ConversationMessage],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ToolCatalogEntry],
}

#[derive(Deserialize)]
struct WireResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model: Model) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model,
        }
    }

    /// Build a client from the configured API key environment variable
    pub fn from_env(api_key_env: &str, model: Model) -> Result<Self> {
        let api_key = std::env::var(api_key_env).map_err(|_| {
            CopysmithError::Config(format!("Environment variable {} is not set", api_key_env))
        })?;
        Ok(Self::new(api_key, model))
    }
}

#[async_trait]
impl CompletionService for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let wire = WireRequest {
            model: self.model.api_name(),
            max_tokens: request.max_tokens,
            system: request.system.as_deref(),
            messages: &request.messages,
            tools: &request.tools,
        };

        // Retry loop with exponential backoff for rate limits
        let mut retries = 0;
        let mut backoff_secs = INITIAL_BACKOFF_SECS;

        loop {
            tracing::debug!("Sending completion request (attempt {})", retries + 1);

            let response = self
                .http
                .post(API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION)
                .header("content-type", "application/json")
                .json(&wire)
                .send()
                .await
                .map_err(|e| CopysmithError::Api(format!("Failed to send request: {}", e)))?;

            let status = response.status();

            // Handle rate limit (429) with retry
            if status.as_u16() == 429 {
                retries += 1;

                if retries > MAX_RETRIES {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown".to_string());
                    return Err(CopysmithError::ApiLimit(format!(
                        "Rate limit exceeded after {} retries. Last error: {}",
                        MAX_RETRIES, error_text
                    )));
                }

                // Honor the retry-after header when present
                let wait_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(backoff_secs);

                tracing::warn!(
                    "Rate limited (429). Waiting {} seconds before retry {}/{}",
                    wait_secs,
                    retries,
                    MAX_RETRIES
                );

                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                continue;
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown".to_string());

                // Retry on 5xx errors
                if status.is_server_error() && retries < MAX_RETRIES {
                    retries += 1;
                    tracing::warn!(
                        "Server error ({}). Waiting {} seconds before retry {}/{}",
                        status,
                        backoff_secs,
                        retries,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                return Err(CopysmithError::Api(format!(
                    "Completion API error {}: {}",
                    status, error_text
                )));
            }

            let wire_response: WireResponse = response
                .json()
                .await
                .map_err(|e| CopysmithError::Api(format!("Failed to parse response: {}", e)))?;

            return Ok(CompletionResponse {
                stop_reason: StopReason::parse(wire_response.stop_reason.as_deref()),
                content: wire_response.content,
                usage: wire_response.usage,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_missing_key() {
        std::env::remove_var("COPYSMITH_TEST_MISSING_KEY");
        let result = AnthropicClient::from_env("COPYSMITH_TEST_MISSING_KEY", Model::Sonnet);
        assert!(matches!(result, Err(CopysmithError::Config(_))));
    }

    #[test]
    fn test_wire_request_omits_empty_tools() {
        let wire = WireRequest {
            model: Model::Sonnet.api_name(),
            max_tokens: 1024,
            system: None,
            messages: &[copysmith_core::ConversationMessage::user("hello")],
            tools: &[],
        };
        let json = serde_json::to_value(&wire).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("system").is_none());
        assert_eq!(json["max_tokens"], 1024);
    }
}
