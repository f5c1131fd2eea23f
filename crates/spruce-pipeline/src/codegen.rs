//! Code generation: rules and inquiries in, Python source out.

use spruce_llm::{CompletionRequest, Message, SharedBackend};

use crate::error::Result;
use crate::prompts::{EXTRACTOR_SYSTEM_PROMPT, VALIDATOR_SYSTEM_PROMPT};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Asks the model for the validator and extractor snippets.
///
/// The returned text is the model's answer verbatim; structural checks happen
/// before execution, in [`crate::executor`].
#[derive(Clone)]
pub struct CodeGenerator {
    backend: SharedBackend,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl CodeGenerator {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Python source for `validateCustomerSchedulingParameters` enforcing `rules`.
    pub async fn generate_validator(&self, rules: &[String]) -> Result<String> {
        let payload = serde_json::json!({ "validationRules": rules }).to_string();
        self.complete(VALIDATOR_SYSTEM_PROMPT, payload).await
    }

    /// Python source for `getCustomerSchedulingParameters` reading `inquiry`.
    pub async fn generate_parameter_extractor(&self, inquiry: &str) -> Result<String> {
        self.complete(EXTRACTOR_SYSTEM_PROMPT, inquiry).await
    }

    async fn complete(&self, system: &str, user: impl Into<String>) -> Result<String> {
        let request =
            CompletionRequest::new(&self.model, vec![Message::user(user)], self.max_tokens)
                .with_system(system)
                .with_temperature(self.temperature);

        let response = self.backend.complete(request).await?;
        tracing::debug!(
            backend = self.backend.name(),
            output_tokens = response.usage.output_tokens,
            bytes = response.content.len(),
            "Generated code"
        );
        Ok(response.content)
    }
}

impl std::fmt::Debug for CodeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenerator")
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkflowError;
    use spruce_llm::{Content, LlmError, MockBackend, MockResponse};
    use std::sync::Arc;

    fn user_text(request: &CompletionRequest) -> String {
        match &request.messages[0].content {
            Content::Text(text) => text.clone(),
            Content::Parts(_) => panic!("expected text content"),
        }
    }

    #[tokio::test]
    async fn test_validator_request_shape() {
        let backend = Arc::new(MockBackend::with_text("def validateCustomerSchedulingParameters(): pass"));
        let generator = CodeGenerator::new(backend.clone()).with_max_tokens(512);

        let rules = vec!["No appointments on Sundays.".to_string()];
        let code = generator.generate_validator(&rules).await.unwrap();
        assert_eq!(code, "def validateCustomerSchedulingParameters(): pass");

        let request = &backend.requests()[0];
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, 512);
        assert_eq!(request.system.as_deref(), Some(VALIDATOR_SYSTEM_PROMPT));

        let payload: serde_json::Value = serde_json::from_str(&user_text(request)).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({"validationRules": ["No appointments on Sundays."]})
        );
    }

    #[tokio::test]
    async fn test_extractor_sends_raw_inquiry() {
        let backend = Arc::new(MockBackend::with_text("  code\n"));
        let generator = CodeGenerator::new(backend.clone()).with_model("gpt-4o");

        let code = generator
            .generate_parameter_extractor("book Sunday at 10am")
            .await
            .unwrap();
        assert_eq!(code, "  code\n");

        let request = &backend.requests()[0];
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.system.as_deref(), Some(EXTRACTOR_SYSTEM_PROMPT));
        assert_eq!(user_text(request), "book Sunday at 10am");
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let backend = Arc::new(MockBackend::new(vec![MockResponse::Error(
            "overloaded".to_string(),
        )]));
        let err = CodeGenerator::new(backend)
            .generate_validator(&[])
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Llm(LlmError::Backend(_))));
    }
}
