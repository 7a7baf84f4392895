// ABOUTME: Generic OpenAI-compatible LLM provider for cloud chat-completions endpoints
// ABOUTME: Backs both the Groq and OpenAI entries in the fallback chain
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # `OpenAI`-Compatible Provider
//!
//! Generic implementation for any endpoint speaking the `OpenAI` chat
//! completions API with function calling. Groq and `OpenAI` itself are both
//! configured through this adapter; only the base URL, key, and default
//! model differ.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::{
    ChatMessage, ChatRequest, ChatResponseWithTools, FunctionCall, LlmCapabilities, LlmProvider,
    Tool, TokenUsage,
};
use crate::errors::AppError;

/// Connection timeout for cloud endpoints
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Request timeout; tool-heavy completions can take a while
const REQUEST_TIMEOUT_SECS: u64 = 120;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const GROQ_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

/// OpenAI-compatible API request structure
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

/// Tool definition for OpenAI-compatible API
#[derive(Debug, Clone, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAiFunction,
}

/// Function definition within a tool
#[derive(Debug, Clone, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

/// Message structure for OpenAI-compatible API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

/// OpenAI-compatible API response structure
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    model: String,
}

/// Choice in response
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

/// Message in response
#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

/// Tool call in response
#[derive(Debug, Clone, Deserialize)]
struct OpenAiToolCall {
    function: OpenAiFunctionCall,
}

/// Function call details in response
#[derive(Debug, Clone, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

/// Usage statistics in response
#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(rename = "prompt_tokens")]
    prompt: u32,
    #[serde(rename = "completion_tokens")]
    completion: u32,
    #[serde(rename = "total_tokens")]
    total: u32,
}

/// Error response structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// Default model to use
    pub default_model: String,
    /// Provider name for logging and registry lookups
    pub provider_name: &'static str,
    /// Provider display name
    pub display_name: &'static str,
    /// Capabilities of this provider
    pub capabilities: LlmCapabilities,
}

impl OpenAiCompatibleConfig {
    /// Configuration for the Groq chat completions API
    #[must_use]
    pub fn groq(api_key: &str) -> Self {
        Self {
            base_url: GROQ_BASE_URL.to_owned(),
            api_key: api_key.to_owned(),
            default_model: GROQ_DEFAULT_MODEL.to_owned(),
            provider_name: "groq",
            display_name: "Groq",
            capabilities: LlmCapabilities::full_featured(),
        }
    }

    /// Configuration for the OpenAI chat completions API
    #[must_use]
    pub fn openai(api_key: &str) -> Self {
        Self {
            base_url: OPENAI_BASE_URL.to_owned(),
            api_key: api_key.to_owned(),
            default_model: OPENAI_DEFAULT_MODEL.to_owned(),
            provider_name: "openai",
            display_name: "OpenAI",
            capabilities: LlmCapabilities::full_featured(),
        }
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Generic `OpenAI`-compatible LLM provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create a Groq-backed provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn groq(api_key: &str) -> Result<Self, AppError> {
        Self::new(OpenAiCompatibleConfig::groq(api_key))
    }

    /// Create an OpenAI-backed provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn openai(api_key: &str) -> Result<Self, AppError> {
        Self::new(OpenAiCompatibleConfig::openai(api_key))
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    /// Convert internal messages to `OpenAI` format
    fn convert_messages(messages: &[ChatMessage]) -> Vec<OpenAiMessage> {
        messages.iter().map(OpenAiMessage::from).collect()
    }

    /// Parse error response from API.
    ///
    /// The message text is preserved verbatim where possible; the fallback
    /// and retry classifiers in the agent match on it.
    fn parse_error_response(&self, status: reqwest::StatusCode, body: &str) -> AppError {
        let display = self.config.display_name;

        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            let error_type = error_response
                .error
                .error_type
                .unwrap_or_else(|| "unknown".to_owned());

            match status.as_u16() {
                401 => AppError::auth_invalid(format!(
                    "{display} authentication failed: {}",
                    error_response.error.message
                )),
                429 => AppError::external_service(
                    display,
                    format!("rate limit exceeded: {}", error_response.error.message),
                ),
                _ => AppError::external_service(
                    display,
                    format!("{} - {}", error_type, error_response.error.message),
                ),
            }
        } else {
            AppError::external_service(
                display,
                format!(
                    "API error ({}): {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            )
        }
    }

    /// Convert internal Tool format to OpenAI-compatible format
    fn convert_tools(tools: &[Tool]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .flat_map(|tool| {
                tool.function_declarations.iter().map(|func| OpenAiTool {
                    tool_type: "function".to_owned(),
                    function: OpenAiFunction {
                        name: func.name.clone(),
                        description: func.description.clone(),
                        parameters: func.parameters.clone(),
                    },
                })
            })
            .collect()
    }

    /// Convert tool calls to internal `FunctionCall` format
    fn convert_tool_calls(tool_calls: &[OpenAiToolCall]) -> Vec<FunctionCall> {
        tool_calls
            .iter()
            .map(|call| {
                let args: Value =
                    serde_json::from_str(&call.function.arguments).unwrap_or_default();
                FunctionCall {
                    name: call.function.name.clone(),
                    args,
                }
            })
            .collect()
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        self.config.provider_name
    }

    fn display_name(&self) -> &'static str {
        self.config.display_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.config.capabilities
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request, tools), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        tools: Option<Vec<Tool>>,
    ) -> Result<ChatResponseWithTools, AppError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        let openai_request = OpenAiRequest {
            model: model.to_owned(),
            messages: Self::convert_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tools: tools.as_ref().map(|t| Self::convert_tools(t)),
            tool_choice: tools.as_ref().map(|_| "auto".to_owned()),
        };

        debug!(
            provider = self.config.provider_name,
            messages = openai_request.messages.len(),
            has_tools = openai_request.tools.is_some(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                error!(
                    provider = self.config.provider_name,
                    "Failed to send request: {e}"
                );
                AppError::external_service(
                    self.config.display_name,
                    format!("ApiConnectionError: {e}"),
                )
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service(
                self.config.display_name,
                format!("Failed to read response: {e}"),
            )
        })?;

        if !status.is_success() {
            return Err(self.parse_error_response(status, &body));
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            error!(
                provider = self.config.provider_name,
                "Failed to parse API response: {e} - body: {}",
                body.chars().take(500).collect::<String>()
            );
            AppError::external_service(
                self.config.display_name,
                format!("Failed to parse response: {e}"),
            )
        })?;

        let choice = openai_response.choices.into_iter().next().ok_or_else(|| {
            AppError::external_service(self.config.display_name, "API returned no choices")
        })?;

        let content = choice.message.content;
        let function_calls = choice
            .message
            .tool_calls
            .map(|calls| Self::convert_tool_calls(&calls));

        debug!(
            provider = self.config.provider_name,
            content_len = content.as_ref().map(String::len),
            tool_calls = function_calls.as_ref().map(Vec::len),
            finish_reason = ?choice.finish_reason,
            "Received response"
        );

        Ok(ChatResponseWithTools {
            content,
            function_calls,
            model: openai_response.model,
            usage: openai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt,
                completion_tokens: u.completion,
                total_tokens: u.total,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}
