//! Embeddings for similarity search.
//!
//! This module provides the [`Embedder`] trait and implementations for
//! turning text into dense vectors. The document store embeds both stored
//! documents and queries with the same embedder.
//!
//! # Implementations
//!
//! - [`MockEmbedder`]: deterministic token-hashing embeddings for tests and offline runs
//! - [`OpenAiEmbedder`]: OpenAI's `/embeddings` API

use async_trait::async_trait;
use reqwest::{Client, header};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::with_retry;
use crate::error::{LlmError, RateLimitInfo, Result};
use crate::openai::DEFAULT_OPENAI_BASE;

/// Default OpenAI embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Dimensions of [`DEFAULT_EMBEDDING_MODEL`].
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

// ─────────────────────────────────────────────────────────────────────────────
// Embedder Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for generating text embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts in a batch.
    ///
    /// Default implementation calls `embed` for each text sequentially.
    /// Implementations may override for more efficient batching.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Get the dimensionality of embeddings produced by this embedder.
    fn dimensions(&self) -> usize;

    /// Get the name of this embedder.
    fn name(&self) -> &str;
}

/// A shared embedder that can be used across threads.
pub type SharedEmbedder = Arc<dyn Embedder>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// A mock embedder for testing purposes.
///
/// Hashes each lowercase word into a bucket of the vector, so identical texts
/// get identical embeddings and texts sharing words score as similar. Good
/// enough for offline similarity search without an external model.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    /// Create a new mock embedder with the specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = simple_hash(&word.to_lowercase());
            let bucket = (hash % self.dimensions as u64) as usize;
            embedding[bucket] += 1.0;
        }

        normalize(&mut embedding);
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Simple hash function for deterministic embedding generation.
fn simple_hash(s: &str) -> u64 {
    let mut hash: u64 = 5381;
    for byte in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
    }
    hash
}

fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for OpenAI embeddings.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedderConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Model to use for embeddings.
    pub model: String,
    /// Requested output dimensions; `None` keeps the model's native size.
    pub dimensions: Option<usize>,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries for transient errors.
    pub max_retries: u32,
}

impl OpenAiEmbedderConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: None,
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Request a specific output size.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Set max retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// OpenAI embeddings API client.
pub struct OpenAiEmbedder {
    client: Client,
    config: OpenAiEmbedderConfig,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Create a new OpenAI embedder.
    pub fn new(config: OpenAiEmbedderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let dimensions = config
            .dimensions
            .unwrap_or_else(|| native_dimensions(&config.model));

        Ok(Self {
            client,
            config,
            dimensions,
        })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.base_url)
    }

    async fn send_batch(&self, request: &EmbeddingRequest) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(self.embeddings_url())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            let message = format!("Embedding request failed: HTTP {} - {}", status, body);
            return Err(match status.as_u16() {
                401 | 403 => LlmError::Auth(message),
                429 => LlmError::RateLimit(RateLimitInfo::parse_openai(
                    &message,
                    retry_after.as_deref(),
                )),
                _ => LlmError::Backend(message),
            });
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Serialization(format!("Failed to parse response: {}", e)))?;

        // Sort by index to ensure correct order
        let mut embeddings = result.data;
        embeddings.sort_by_key(|e| e.index);

        if embeddings.len() != request.input.len() {
            return Err(LlmError::Backend(format!(
                "Expected {} embeddings, got {}",
                request.input.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings.into_iter().map(|e| e.embedding).collect())
    }
}

fn native_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => DEFAULT_EMBEDDING_DIMENSIONS,
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::EmptyResponse("openai embeddings".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: self.config.model.clone(),
            input: texts.iter().map(|s| s.to_string()).collect(),
            dimensions: self.config.dimensions,
        };

        tracing::debug!(model = %request.model, inputs = texts.len(), "Requesting embeddings");

        with_retry(
            self.config.max_retries,
            Duration::from_millis(500),
            "openai-embeddings",
            || self.send_batch(&request),
        )
        .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, serde::Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, serde::Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, serde::Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedder Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for building an embedder from application config.
///
/// Provider-agnostic so that this crate does not depend on `spruce-config`.
#[derive(Debug, Clone, Default)]
pub struct EmbedderSpec {
    /// Provider name: "openai" or "mock".
    pub provider: String,
    /// OpenAI API key (required for "openai" provider).
    pub openai_api_key: Option<String>,
    /// OpenAI model name.
    pub openai_model: Option<String>,
    /// OpenAI base URL override.
    pub openai_base_url: Option<String>,
    /// Requested dimensions.
    pub dimensions: Option<usize>,
}

/// Build a `SharedEmbedder` from a spec.
pub fn build_embedder(spec: &EmbedderSpec) -> Result<SharedEmbedder> {
    match spec.provider.as_str() {
        "openai" => {
            let api_key = spec.openai_api_key.as_deref().ok_or_else(|| {
                LlmError::Config(
                    "OpenAI embedding provider requires an API key. \
                     Set OPENAI_API_KEY or configure [embedding] api_key."
                        .to_string(),
                )
            })?;
            let mut config = OpenAiEmbedderConfig::new(api_key);
            if let Some(ref model) = spec.openai_model {
                config = config.with_model(model);
            }
            if let Some(ref base_url) = spec.openai_base_url {
                config = config.with_base_url(base_url);
            }
            if let Some(dims) = spec.dimensions
                && dims != native_dimensions(&config.model)
            {
                config = config.with_dimensions(dims);
            }
            Ok(Arc::new(OpenAiEmbedder::new(config)?))
        }
        "mock" => {
            let dims = spec.dimensions.unwrap_or(DEFAULT_EMBEDDING_DIMENSIONS);
            Ok(Arc::new(MockEmbedder::new(dims)))
        }
        other => Err(LlmError::Config(format!(
            "Unknown embedding provider '{}'. Valid: openai, mock",
            other
        ))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Utility Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Calculate cosine similarity between two embeddings.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedder() {
        let embedder = MockEmbedder::default();
        assert_eq!(embedder.dimensions(), 1536);
        assert_eq!(embedder.name(), "mock");

        let embedding = embedder.embed("hello world").await.unwrap();
        assert_eq!(embedding.len(), 1536);

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_mock_embedder_deterministic() {
        let embedder = MockEmbedder::new(64);
        let e1 = embedder.embed("move-out cleaning").await.unwrap();
        let e2 = embedder.embed("move-out cleaning").await.unwrap();
        assert_eq!(e1, e2);
    }

    #[tokio::test]
    async fn test_mock_embedder_shared_words_score_higher() {
        let embedder = MockEmbedder::new(256);
        let query = embedder.embed("carpet cleaning").await.unwrap();
        let carpet = embedder
            .embed("deep cleaning of your carpets and carpet stains")
            .await
            .unwrap();
        let office = embedder.embed("weekly office trash removal").await.unwrap();

        assert!(cosine_similarity(&query, &carpet) > cosine_similarity(&query, &office));
    }

    #[tokio::test]
    async fn test_mock_embedder_empty_text() {
        let embedder = MockEmbedder::new(8);
        let embedding = embedder.embed("").await.unwrap();
        assert_eq!(embedding, vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let embedder = MockEmbedder::new(32);
        let embeddings = embedder.embed_batch(&["one", "two", "three"]).await.unwrap();
        assert_eq!(embeddings.len(), 3);
        assert!(embeddings.iter().all(|e| e.len() == 32));
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let c = vec![0.0, 1.0, 0.0];

        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&a, &c).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[1.0]), 0.0);
    }

    #[test]
    fn test_openai_embedder_config_builder() {
        let config = OpenAiEmbedderConfig::new("key")
            .with_base_url("http://localhost:9999/v1/")
            .with_model("text-embedding-3-large")
            .with_dimensions(256);
        assert_eq!(config.base_url, "http://localhost:9999/v1");
        assert_eq!(config.model, "text-embedding-3-large");

        let embedder = OpenAiEmbedder::new(config).unwrap();
        assert_eq!(embedder.dimensions(), 256);
    }

    #[test]
    fn test_openai_embedder_native_dimensions() {
        let embedder = OpenAiEmbedder::new(OpenAiEmbedderConfig::new("key")).unwrap();
        assert_eq!(embedder.dimensions(), 1536);
    }

    #[test]
    fn test_build_embedder() {
        let spec = EmbedderSpec {
            provider: "mock".to_string(),
            dimensions: Some(16),
            ..Default::default()
        };
        assert_eq!(build_embedder(&spec).unwrap().dimensions(), 16);

        let spec = EmbedderSpec {
            provider: "openai".to_string(),
            ..Default::default()
        };
        assert!(matches!(build_embedder(&spec), Err(LlmError::Config(_))));

        let spec = EmbedderSpec {
            provider: "onnx".to_string(),
            ..Default::default()
        };
        assert!(matches!(build_embedder(&spec), Err(LlmError::Config(_))));
    }
}
