//! Model invoker — the single point of entry for all Claude API calls.
//!
//! ARCHITECTURAL RULE: no other module may call the Anthropic API directly.
//! All model interactions go through the `ModelInvoker` trait.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Default model for all calls. Intentionally hardcoded to prevent drift.
pub const MODEL: &str = "claude-sonnet-4-5";

pub const DEFAULT_MAX_TOKENS: u32 = 64_000;
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("model returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Input shapes
// ────────────────────────────────────────────────────────────────────────────

/// Message content as callers may supply it: a plain string or a list of
/// composite parts. Either way it is flattened to text before the API call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageContent {
    fn into_text(self) -> String {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

/// Heterogeneous invocation input: a bare instruction string, or an ordered
/// message list. Resolved once into the provider's canonical shape.
#[derive(Debug, Clone)]
pub enum PromptInput {
    Raw(String),
    Messages(Vec<ChatMessage>),
}

impl PromptInput {
    /// Normalizes into `(system, messages)`. Messages tagged "system" are
    /// promoted to the dedicated system-prompt slot; order of the remaining
    /// messages is preserved.
    fn normalize(self) -> (Option<String>, Vec<AnthropicMessage>) {
        match self {
            PromptInput::Raw(text) => (
                None,
                vec![AnthropicMessage {
                    role: "user".to_string(),
                    content: text,
                }],
            ),
            PromptInput::Messages(messages) => {
                let mut system_parts = Vec::new();
                let mut normalized = Vec::new();
                for message in messages {
                    let text = message.content.into_text();
                    if message.role.eq_ignore_ascii_case("system") {
                        system_parts.push(text);
                    } else {
                        normalized.push(AnthropicMessage {
                            role: message.role,
                            content: text,
                        });
                    }
                }
                let system = if system_parts.is_empty() {
                    None
                } else {
                    Some(system_parts.join("\n\n"))
                };
                (system, normalized)
            }
        }
    }
}

/// Per-call knobs. Defaults match the production pipeline.
#[derive(Debug, Clone)]
pub struct InvokeOptions {
    pub model: Option<String>,
    pub max_tokens: u32,
    pub retries: u32,
    pub timeout: Duration,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            retries: DEFAULT_RETRIES,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output shapes
// ────────────────────────────────────────────────────────────────────────────

/// Why generation stopped. `MaxTokens` drives the truncation re-prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    Other(String),
}

impl StopReason {
    fn from_api(raw: Option<String>) -> Self {
        match raw.as_deref() {
            Some("end_turn") | None => StopReason::EndTurn,
            Some("max_tokens") => StopReason::MaxTokens,
            Some(other) => StopReason::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Raw provider response, surfaced whole so callers can inspect the finish
/// indicator and token counters for diagnostics.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub text: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

impl ModelResponse {
    pub fn is_truncated(&self) -> bool {
        self.stop_reason == StopReason::MaxTokens
    }
}

#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(
        &self,
        input: PromptInput,
        options: InvokeOptions,
    ) -> Result<ModelResponse, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Anthropic implementation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [AnthropicMessage],
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Production invoker backed by the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicInvoker {
    client: Client,
    api_key: String,
}

impl AnthropicInvoker {
    pub fn new(api_key: String) -> Self {
        // No client-level timeout: each attempt is raced explicitly below.
        Self {
            client: Client::new(),
            api_key,
        }
    }

    async fn call_once(
        &self,
        model: &str,
        max_tokens: u32,
        system: Option<&str>,
        messages: &[AnthropicMessage],
    ) -> Result<ModelResponse, LlmError> {
        let request_body = AnthropicRequest {
            model,
            max_tokens,
            system,
            messages,
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: ApiResponse = response.json().await?;
        let text = api_response
            .content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.clone())
            .ok_or(LlmError::EmptyContent)?;

        Ok(ModelResponse {
            text,
            stop_reason: StopReason::from_api(api_response.stop_reason),
            usage: api_response.usage,
        })
    }
}

#[async_trait]
impl ModelInvoker for AnthropicInvoker {
    /// One provider call per attempt, raced against a timer. Failed attempts
    /// retry immediately — no backoff, by contract. The last error propagates
    /// once the retry budget is exhausted.
    async fn invoke(
        &self,
        input: PromptInput,
        options: InvokeOptions,
    ) -> Result<ModelResponse, LlmError> {
        let (system, messages) = input.normalize();
        let model = options.model.as_deref().unwrap_or(MODEL);

        let mut last_error: Option<LlmError> = None;
        for attempt in 0..=options.retries {
            let call = self.call_once(model, options.max_tokens, system.as_deref(), &messages);
            match tokio::time::timeout(options.timeout, call).await {
                Ok(Ok(response)) => {
                    debug!(
                        "model call succeeded: input_tokens={}, output_tokens={}, stop_reason={:?}",
                        response.usage.input_tokens,
                        response.usage.output_tokens,
                        response.stop_reason
                    );
                    return Ok(response);
                }
                Ok(Err(e)) => last_error = Some(e),
                Err(_) => last_error = Some(LlmError::Timeout(options.timeout)),
            }

            if attempt < options.retries {
                warn!(
                    "model call failed ({}); retrying, {} attempts remaining",
                    last_error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
                    options.retries - attempt
                );
            }
        }

        Err(last_error.unwrap_or(LlmError::EmptyContent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_input_becomes_single_user_message() {
        let (system, messages) = PromptInput::Raw("write a resume".to_string()).normalize();
        assert!(system.is_none());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "write a resume");
    }

    #[test]
    fn test_system_message_promoted_to_system_slot() {
        let input = PromptInput::Messages(vec![
            ChatMessage {
                role: "system".to_string(),
                content: MessageContent::Text("be terse".to_string()),
            },
            ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Text("hello".to_string()),
            },
        ]);
        let (system, messages) = input.normalize();
        assert_eq!(system.as_deref(), Some("be terse"));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn test_composite_parts_flatten_to_text() {
        let input = PromptInput::Messages(vec![ChatMessage {
            role: "system".to_string(),
            content: MessageContent::Parts(vec![
                ContentPart {
                    kind: Some("text".to_string()),
                    text: Some("first".to_string()),
                },
                ContentPart {
                    kind: Some("image".to_string()),
                    text: None,
                },
                ContentPart {
                    kind: Some("text".to_string()),
                    text: Some("second".to_string()),
                },
            ]),
        }]);
        let (system, messages) = input.normalize();
        assert_eq!(system.as_deref(), Some("first\nsecond"));
        assert!(messages.is_empty());
    }

    #[test]
    fn test_message_order_preserved_around_system_extraction() {
        let input = PromptInput::Messages(vec![
            ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Text("a".to_string()),
            },
            ChatMessage {
                role: "system".to_string(),
                content: MessageContent::Text("sys".to_string()),
            },
            ChatMessage {
                role: "assistant".to_string(),
                content: MessageContent::Text("b".to_string()),
            },
            ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Text("c".to_string()),
            },
        ]);
        let (system, messages) = input.normalize();
        assert_eq!(system.as_deref(), Some("sys"));
        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["user", "assistant", "user"]);
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(
            StopReason::from_api(Some("end_turn".to_string())),
            StopReason::EndTurn
        );
        assert_eq!(
            StopReason::from_api(Some("max_tokens".to_string())),
            StopReason::MaxTokens
        );
        assert_eq!(
            StopReason::from_api(Some("tool_use".to_string())),
            StopReason::Other("tool_use".to_string())
        );
        assert_eq!(StopReason::from_api(None), StopReason::EndTurn);
    }

    #[test]
    fn test_truncation_flag_follows_stop_reason() {
        let response = ModelResponse {
            text: "{}".to_string(),
            stop_reason: StopReason::MaxTokens,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 64_000,
            },
        };
        assert!(response.is_truncated());
    }

    #[test]
    fn test_invoke_options_defaults() {
        let options = InvokeOptions::default();
        assert_eq!(options.max_tokens, 64_000);
        assert_eq!(options.retries, 2);
        assert_eq!(options.timeout, Duration::from_secs(120));
        assert!(options.model.is_none());
    }

    #[test]
    fn test_message_content_deserializes_both_shapes() {
        let plain: ChatMessage =
            serde_json::from_str(r#"{"role": "user", "content": "hi"}"#).unwrap();
        assert!(matches!(plain.content, MessageContent::Text(_)));

        let composite: ChatMessage = serde_json::from_str(
            r#"{"role": "system", "content": [{"type": "text", "text": "hi"}]}"#,
        )
        .unwrap();
        assert!(matches!(composite.content, MessageContent::Parts(_)));
    }
}
