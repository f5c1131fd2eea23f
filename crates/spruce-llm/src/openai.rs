//! OpenAI-compatible chat completion backend.
//!
//! This module provides `OpenAiBackend` which connects to OpenAI's API
//! or any service exposing the same `/chat/completions` endpoint.

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{LlmBackend, SharedBackend, with_retry};
use crate::error::{LlmError, RateLimitInfo, Result};
use crate::types::{CompletionRequest, CompletionResponse, Content, ContentPart, StopReason, Usage};

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";

/// Default timeout for requests.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication (optional for keyless local servers).
    pub api_key: Option<String>,

    /// Base URL for the API.
    pub base_url: String,

    /// Model to use when a request leaves it empty.
    pub model: Option<String>,

    /// Request timeout.
    pub timeout: Duration,

    /// Maximum retries for transient errors.
    pub max_retries: u32,

    /// Initial backoff duration for retries.
    pub retry_backoff: Duration,

    /// Name for this backend instance.
    pub name: String,
}

impl OpenAiConfig {
    /// Create a new config for OpenAI.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: DEFAULT_OPENAI_BASE.to_string(),
            model: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
            name: "openai".to_string(),
        }
    }


    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the backend name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set max retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the initial retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI Backend
// ─────────────────────────────────────────────────────────────────────────────

/// OpenAI-compatible API backend.
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    /// Create a new OpenAI-compatible backend with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Add authentication headers to a request.
    fn add_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(header::CONTENT_TYPE, "application/json");

        if let Some(ref api_key) = self.config.api_key {
            builder.header(header::AUTHORIZATION, format!("Bearer {}", api_key))
        } else {
            builder
        }
    }

    /// Convert our CompletionRequest to OpenAI-compatible format.
    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAiChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(ref system) = request.system {
            messages.push(OpenAiMessage {
                role: "system".to_string(),
                content: OpenAiContent::Text(system.clone()),
            });
        }

        for m in &request.messages {
            let content = match &m.content {
                Content::Text(text) => OpenAiContent::Text(text.clone()),
                Content::Parts(parts) => {
                    OpenAiContent::Parts(parts.iter().map(OpenAiContentPart::from).collect())
                }
            };
            messages.push(OpenAiMessage {
                role: m.role.as_str().to_string(),
                content,
            });
        }

        let stop = if request.stop_sequences.is_empty() {
            None
        } else {
            Some(request.stop_sequences.clone())
        };

        let model = if request.model.is_empty() {
            self.config.model.clone().unwrap_or_default()
        } else {
            request.model.clone()
        };

        OpenAiChatRequest {
            model,
            messages,
            max_tokens: Some(request.max_tokens),
            temperature: request.temperature,
            stop,
        }
    }

    /// Handle a completion response.
    async fn handle_response(response: Response, backend_name: &str) -> Result<CompletionResponse> {
        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let body = response.text().await?;
        let parsed: OpenAiChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Serialization(e.to_string()))?;

        parsed.into_completion(backend_name)
    }

    /// Handle an error response.
    async fn handle_error_response(response: Response) -> LlmError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<OpenAiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

        match status.as_u16() {
            401 | 403 => LlmError::Auth(format!("Authentication failed: {}", message)),
            429 => LlmError::RateLimit(RateLimitInfo::parse_openai(
                &message,
                retry_after.as_deref(),
            )),
            400 | 404 | 422 => LlmError::InvalidRequest(message),
            500..=599 => LlmError::Backend(format!("Server error: {}", message)),
            _ => LlmError::Backend(message),
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let openai_request = self.to_openai_request(&request);

        tracing::debug!(
            backend = %self.config.name,
            model = %openai_request.model,
            messages = openai_request.messages.len(),
            "Sending OpenAI-compatible request"
        );

        let response = with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            &self.config.name,
            || async {
                let response = self
                    .add_headers(self.client.post(self.completions_url()))
                    .json(&openai_request)
                    .send()
                    .await?;

                Self::handle_response(response, &self.config.name).await
            },
        )
        .await?;

        tracing::debug!(
            backend = %self.config.name,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Completion received"
        );

        Ok(response)
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

/// Create a shared OpenAI-compatible backend.
pub fn create_shared_backend(config: OpenAiConfig) -> Result<SharedBackend> {
    Ok(Arc::new(OpenAiBackend::new(config)?))
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI API Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, serde::Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, serde::Serialize)]
struct OpenAiMessage {
    role: String,
    content: OpenAiContent,
}

#[derive(Debug, serde::Serialize)]
#[serde(untagged)]
enum OpenAiContent {
    Text(String),
    Parts(Vec<OpenAiContentPart>),
}

#[derive(Debug, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAiContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAiImageUrl },
}

#[derive(Debug, serde::Serialize)]
struct OpenAiImageUrl {
    url: String,
}

impl From<&ContentPart> for OpenAiContentPart {
    fn from(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text { text } => OpenAiContentPart::Text { text: text.clone() },
            ContentPart::ImageUrl { url } => OpenAiContentPart::ImageUrl {
                image_url: OpenAiImageUrl { url: url.clone() },
            },
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiChatResponse {
    id: String,
    choices: Vec<OpenAiChoice>,
    model: String,
    usage: Option<OpenAiUsage>,
}

impl OpenAiChatResponse {
    fn into_completion(self, backend_name: &str) -> Result<CompletionResponse> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::EmptyResponse(backend_name.to_string()))?;

        let content = choice.message.content.unwrap_or_default();
        let stop_reason = StopReason::from_finish_reason(choice.finish_reason.as_deref());
        let usage = self
            .usage
            .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse::new(
            self.id,
            self.model,
            content,
            stop_reason,
            usage,
        ))
    }
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    fn backend() -> OpenAiBackend {
        OpenAiBackend::new(OpenAiConfig::openai("sk-test").with_model("gpt-4o-mini")).unwrap()
    }

    #[test]
    fn test_openai_config() {
        let config = OpenAiConfig::openai("test-key");
        assert_eq!(config.api_key, Some("test-key".to_string()));
        assert_eq!(config.base_url, DEFAULT_OPENAI_BASE);
        assert_eq!(config.name, "openai");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_config_builder() {
        let config = OpenAiConfig::openai("key")
            .with_base_url("http://localhost:8080/v1/")
            .with_model("custom-model")
            .with_name("custom")
            .with_timeout(Duration::from_secs(30))
            .with_max_retries(0);

        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, Some("custom-model".to_string()));
        assert_eq!(config.name, "custom");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            backend().completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_to_openai_request_places_system_first() {
        let request = CompletionRequest::new("gpt-4o-mini", vec![Message::user("Hello")], 100)
            .with_system("You are helpful")
            .with_temperature(0.0);

        let openai_req = backend().to_openai_request(&request);
        let json = serde_json::to_value(&openai_req).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "You are helpful");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Hello");
        assert!(json.get("stop").is_none());
    }

    #[test]
    fn test_to_openai_request_image_parts() {
        let request = CompletionRequest::new(
            "gpt-4o-mini",
            vec![Message::user_parts(vec![
                ContentPart::text("list services"),
                ContentPart::image_url("https://example.com/icon.png"),
            ])],
            50,
        );

        let json = serde_json::to_value(backend().to_openai_request(&request)).unwrap();
        let parts = &json["messages"][0]["content"];
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], "list services");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "https://example.com/icon.png");
    }

    #[test]
    fn test_empty_request_model_falls_back_to_config() {
        let request = CompletionRequest::new("", vec![Message::user("hi")], 10);
        let openai_req = backend().to_openai_request(&request);
        assert_eq!(openai_req.model, "gpt-4o-mini");
    }

    #[test]
    fn test_openai_response_conversion() {
        let body = r#"{
            "id": "chatcmpl-123",
            "model": "gpt-4o-mini",
            "choices": [{"message": {"content": "Hello!"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;
        let parsed: OpenAiChatResponse = serde_json::from_str(body).unwrap();
        let response = parsed.into_completion("openai").unwrap();

        assert_eq!(response.id, "chatcmpl-123");
        assert_eq!(response.text(), "Hello!");
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(response.usage.total(), 15);
    }

    #[test]
    fn test_openai_response_without_choices() {
        let body = r#"{"id": "x", "model": "m", "choices": []}"#;
        let parsed: OpenAiChatResponse = serde_json::from_str(body).unwrap();
        let err = parsed.into_completion("openai").unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse(_)));
    }
}
