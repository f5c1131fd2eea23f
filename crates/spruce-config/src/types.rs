//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [llm]          # chat completion endpoint
//! [embedding]    # embedding provider
//! [store]        # Qdrant connection + collection
//! [sandbox]      # Piston connection + execution limits
//! [quotation]    # quotation workflow defaults
//! [logging]      # file logging
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Placeholder shown instead of secret values.
pub const REDACTED: &str = "********";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged. Use the `effective_*` accessors to
/// read a section with its defaults filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpruceConfig {
    pub llm: Option<LlmConfig>,
    pub embedding: Option<EmbeddingConfig>,
    pub store: Option<StoreConfig>,
    pub sandbox: Option<SandboxConfig>,
    pub quotation: Option<QuotationConfig>,
    pub logging: Option<LoggingConfig>,
}

impl SpruceConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// A config with every section present and set to its defaults.
    pub fn with_defaults() -> Self {
        Self {
            llm: Some(LlmConfig::default()),
            embedding: Some(EmbeddingConfig::default()),
            store: Some(StoreConfig::default()),
            sandbox: Some(SandboxConfig::default()),
            quotation: Some(QuotationConfig::default()),
            logging: Some(LoggingConfig::default()),
        }
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not merged field by field.
    pub fn merge(&mut self, other: SpruceConfig) {
        if other.llm.is_some() {
            self.llm = other.llm;
        }
        if other.embedding.is_some() {
            self.embedding = other.embedding;
        }
        if other.store.is_some() {
            self.store = other.store;
        }
        if other.sandbox.is_some() {
            self.sandbox = other.sandbox;
        }
        if other.quotation.is_some() {
            self.quotation = other.quotation;
        }
        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    pub fn effective_llm(&self) -> LlmConfig {
        self.llm.clone().unwrap_or_default()
    }

    pub fn effective_embedding(&self) -> EmbeddingConfig {
        self.embedding.clone().unwrap_or_default()
    }

    pub fn effective_store(&self) -> StoreConfig {
        self.store.clone().unwrap_or_default()
    }

    pub fn effective_sandbox(&self) -> SandboxConfig {
        self.sandbox.clone().unwrap_or_default()
    }

    pub fn effective_quotation(&self) -> QuotationConfig {
        self.quotation.clone().unwrap_or_default()
    }

    pub fn effective_logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> crate::Result<()> {
        let llm = self.effective_llm();
        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(invalid("llm.temperature", "must be between 0.0 and 2.0"));
        }
        if llm.max_tokens == 0 {
            return Err(invalid("llm.max_tokens", "must be greater than zero"));
        }

        let embedding = self.effective_embedding();
        let store = self.effective_store();
        if embedding.dimensions != store.vector_size {
            return Err(invalid(
                "embedding.dimensions",
                format!(
                    "{} does not match store.vector_size {}",
                    embedding.dimensions, store.vector_size
                ),
            ));
        }
        if store.collection.trim().is_empty() {
            return Err(invalid("store.collection", "must not be empty"));
        }
        if store.scroll_page_size == 0 {
            return Err(invalid("store.scroll_page_size", "must be at least 1"));
        }

        if self.effective_sandbox().run_timeout_ms == 0 {
            return Err(invalid("sandbox.run_timeout_ms", "must be greater than zero"));
        }

        let quotation = self.effective_quotation();
        if quotation.knowledge_results == 0 {
            return Err(invalid("quotation.knowledge_results", "must be at least 1"));
        }
        if quotation.max_services == 0 {
            return Err(invalid("quotation.max_services", "must be at least 1"));
        }
        Ok(())
    }

    /// A copy with every secret replaced by [`REDACTED`], for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        let redact = |key: &mut Option<String>| {
            if key.is_some() {
                *key = Some(REDACTED.to_string());
            }
        };
        if let Some(llm) = config.llm.as_mut() {
            redact(&mut llm.api_key);
        }
        if let Some(embedding) = config.embedding.as_mut() {
            redact(&mut embedding.api_key);
        }
        if let Some(store) = config.store.as_mut() {
            redact(&mut store.api_key);
        }
        config
    }

    /// Section names holding a plaintext API key.
    pub fn plaintext_key_sections(&self) -> Vec<&'static str> {
        let mut sections = Vec::new();
        if self.llm.as_ref().is_some_and(|c| c.api_key.is_some()) {
            sections.push("llm");
        }
        if self.embedding.as_ref().is_some_and(|c| c.api_key.is_some()) {
            sections.push("embedding");
        }
        if self.store.as_ref().is_some_and(|c| c.api_key.is_some()) {
            sections.push("store");
        }
        sections
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM
// ─────────────────────────────────────────────────────────────────────────────

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Custom API base URL (proxies, compatible providers).
    pub base_url: Option<String>,
    pub model: String,
    /// API key (prefer `OPENAI_API_KEY`; warns if set here).
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Transport retries on network and rate-limit errors.
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.0,
            max_tokens: 2048,
            timeout_secs: 120,
            max_retries: 3,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedding
// ─────────────────────────────────────────────────────────────────────────────

/// Supported embedding providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI embeddings API.
    #[default]
    OpenAi,
    /// Deterministic offline embedder.
    Mock,
}

impl EmbeddingProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingProvider::OpenAi => "openai",
            EmbeddingProvider::Mock => "mock",
        }
    }
}

/// Embedding provider configuration.
///
/// ```toml
/// [embedding]
/// provider = "openai"
/// model = "text-embedding-3-small"
/// dimensions = 1536
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub base_url: Option<String>,
    /// Falls back to the `[llm]` key and `OPENAI_API_KEY` when unset.
    pub api_key: Option<String>,
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAi,
            model: "text-embedding-3-small".to_string(),
            base_url: None,
            api_key: None,
            dimensions: 1536,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

/// Qdrant connection and collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub vector_size: usize,
    /// Points fetched per request when listing a collection.
    pub scroll_page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            collection: "spruce".to_string(),
            vector_size: 1536,
            scroll_page_size: 256,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sandbox
// ─────────────────────────────────────────────────────────────────────────────

/// Piston connection and execution limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub base_url: String,
    pub language: String,
    /// Pinned runtime version; looked up from the sandbox when unset.
    pub version: Option<String>,
    pub run_timeout_ms: u64,
    pub compile_timeout_ms: u64,
    pub memory_limit_bytes: Option<u64>,
    /// Extra time allowed on top of the execution limits for the HTTP round-trip.
    pub request_timeout_secs: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            base_url: "https://emkc.org/api/v2/piston".to_string(),
            language: "python".to_string(),
            version: None,
            run_timeout_ms: 3000,
            compile_timeout_ms: 10000,
            memory_limit_bytes: None,
            request_timeout_secs: 10,
        }
    }
}

impl SandboxConfig {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms)
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_millis(self.compile_timeout_ms)
    }

    pub fn request_grace(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Quotation
// ─────────────────────────────────────────────────────────────────────────────

/// Defaults for the quotation workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotationConfig {
    /// Request used when none is given on the command line.
    pub request: String,
    /// Knowledge base documents retrieved per request.
    pub knowledge_results: usize,
    pub max_services: usize,
    /// Image attached to the service-suggestion prompt; none when unset.
    pub service_image_url: Option<String>,
}

impl Default for QuotationConfig {
    fn default() -> Self {
        Self {
            request: "move-out cleaning".to_string(),
            knowledge_results: 2,
            max_services: 2,
            service_image_url: Some(
                "https://cdn-icons-png.flaticon.com/512/3770/3770771.png".to_string(),
            ),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// File logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log directory; `<config dir>/logs` when unset.
    pub dir: Option<PathBuf>,
    /// `EnvFilter` directive for the JSON file log, e.g. `spruce=debug`.
    pub file_filter: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = SpruceConfig::from_toml("").unwrap();
        assert_eq!(config, SpruceConfig::default());
        assert_eq!(config.effective_llm().model, "gpt-4o-mini");
        assert_eq!(config.effective_store().collection, "spruce");
        assert_eq!(config.effective_sandbox().run_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let config = SpruceConfig::from_toml(
            r#"
[llm]
model = "gpt-4o"

[sandbox]
version = "3.10.0"
memory_limit_bytes = 134217728
"#,
        )
        .unwrap();

        let llm = config.effective_llm();
        assert_eq!(llm.model, "gpt-4o");
        assert_eq!(llm.max_tokens, 2048);
        assert_eq!(llm.temperature, 0.0);

        let sandbox = config.effective_sandbox();
        assert_eq!(sandbox.version.as_deref(), Some("3.10.0"));
        assert_eq!(sandbox.memory_limit_bytes, Some(128 * 1024 * 1024));
        assert_eq!(sandbox.language, "python");
        assert!(config.store.is_none());
    }

    #[test]
    fn test_embedding_provider_names() {
        let config = SpruceConfig::from_toml("[embedding]\nprovider = \"mock\"").unwrap();
        assert_eq!(config.effective_embedding().provider, EmbeddingProvider::Mock);
        assert_eq!(EmbeddingProvider::OpenAi.as_str(), "openai");

        let err = SpruceConfig::from_toml("[embedding]\nprovider = \"onnx\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_merge_replaces_sections() {
        let mut base = SpruceConfig::with_defaults();
        let overlay = SpruceConfig::from_toml("[store]\ncollection = \"demo\"").unwrap();
        base.merge(overlay);

        assert_eq!(base.effective_store().collection, "demo");
        assert_eq!(base.effective_store().url, "http://localhost:6333");
        assert!(base.llm.is_some());
    }

    #[test]
    fn test_toml_round_trip_keeps_values() {
        let mut config = SpruceConfig::with_defaults();
        if let Some(q) = config.quotation.as_mut() {
            q.max_services = 3;
        }
        let parsed = SpruceConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate() {
        assert!(SpruceConfig::default().validate().is_ok());

        let config = SpruceConfig::from_toml("[embedding]\ndimensions = 384").unwrap();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { ref field, .. } if field == "embedding.dimensions")
        );

        let config = SpruceConfig::from_toml("[quotation]\nmax_services = 0").unwrap();
        assert!(config.validate().is_err());

        let config = SpruceConfig::from_toml("[store]\nscroll_page_size = 0").unwrap();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { ref field, .. } if field == "store.scroll_page_size")
        );
    }

    #[test]
    fn test_store_scroll_page_size() {
        assert_eq!(SpruceConfig::default().effective_store().scroll_page_size, 256);

        let config = SpruceConfig::from_toml("[store]\nscroll_page_size = 50").unwrap();
        let store = config.effective_store();
        assert_eq!(store.scroll_page_size, 50);
        assert_eq!(store.vector_size, 1536);
    }

    #[test]
    fn test_redacted_hides_keys() {
        let config = SpruceConfig::from_toml(
            r#"
[llm]
api_key = "sk-secret"

[store]
url = "https://qdrant.example.com"
"#,
        )
        .unwrap();

        let shown = config.redacted().to_toml().unwrap();
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains(REDACTED));
        assert!(shown.contains("qdrant.example.com"));
        assert_eq!(config.plaintext_key_sections(), vec!["llm"]);
    }
}
