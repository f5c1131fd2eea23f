//! Qdrant REST client.
//!
//! Talks to Qdrant's HTTP API directly with `reqwest`. Points carry a
//! `{"content", "metadata"}` payload and a vector from the injected embedder.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use spruce_llm::SharedEmbedder;

use crate::backend::{CollectionStatus, DEFAULT_VECTOR_SIZE, DocumentStore};
use crate::document::{Document, ScoredDocument};
use crate::error::{Result, StoreError};
use crate::filter::Filter;

/// Default Qdrant URL.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SCROLL_PAGE_SIZE: usize = 256;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Connection settings for [`QdrantStore`].
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// Base URL of the Qdrant server.
    pub url: String,
    /// Sent as the `api-key` header when set.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Vector size for new collections.
    pub vector_size: usize,
    /// Points fetched per scroll request.
    pub scroll_page_size: usize,
}

impl QdrantConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            vector_size: DEFAULT_VECTOR_SIZE,
            scroll_page_size: DEFAULT_SCROLL_PAGE_SIZE,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_vector_size(mut self, size: usize) -> Self {
        self.vector_size = size;
        self
    }

    pub fn with_scroll_page_size(mut self, size: usize) -> Self {
        self.scroll_page_size = size.max(1);
        self
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QDRANT_URL)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Qdrant Store
// ─────────────────────────────────────────────────────────────────────────────

/// A [`DocumentStore`] backed by a Qdrant server.
pub struct QdrantStore {
    http: Client,
    base_url: Url,
    config: QdrantConfig,
    embedder: SharedEmbedder,
}

impl QdrantStore {
    /// Create a client. No request is made until the first operation.
    pub fn new(config: QdrantConfig, embedder: SharedEmbedder) -> Result<Self> {
        let base_url = Url::parse(&config.url)?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "Qdrant URL '{}' cannot be used as a base URL",
                config.url
            )));
        }

        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url,
            config,
            embedder,
        })
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.config.api_key {
            Some(ref key) => builder.header("api-key", key),
            None => builder,
        }
    }

    /// Decode a `{"result": ...}` envelope or map the failure.
    async fn handle_response<T: DeserializeOwned>(
        response: Response,
        collection: &str,
    ) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::extract_error(response, collection).await);
        }
        let body = response.text().await?;
        let envelope: QdrantEnvelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.result)
    }

    async fn extract_error(response: Response, collection: &str) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<QdrantErrorBody>(&body)
            .ok()
            .and_then(|b| b.status)
            .and_then(|s| s.error)
            .unwrap_or(body);

        if status == 404 {
            StoreError::CollectionNotFound(collection.to_string())
        } else {
            StoreError::Api { status, message }
        }
    }
}

impl std::fmt::Debug for QdrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantStore")
            .field("url", &self.base_url.as_str())
            .field("api_key", &self.config.api_key.as_ref().map(|_| "***"))
            .field("embedder", &self.embedder.name())
            .finish()
    }
}

fn is_already_exists(status: u16, message: &str) -> bool {
    status == 409 || message.to_ascii_lowercase().contains("already exists")
}

fn document_from_payload(payload: Option<Value>) -> Result<Document> {
    let payload = payload
        .ok_or_else(|| StoreError::InvalidResponse("point without payload".to_string()))?;
    serde_json::from_value(payload)
        .map_err(|e| StoreError::InvalidResponse(format!("unexpected point payload: {}", e)))
}

#[async_trait]
impl DocumentStore for QdrantStore {
    async fn create_collection(&self, name: &str) -> Result<CollectionStatus> {
        let body = json!({
            "vectors": { "size": self.config.vector_size, "distance": "Cosine" }
        });
        let response = self
            .with_auth(self.http.put(self.endpoint(&["collections", name])))
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::info!(collection = name, size = self.config.vector_size, "Created collection");
            return Ok(CollectionStatus::Created);
        }

        match Self::extract_error(response, name).await {
            StoreError::Api { status, message } if is_already_exists(status, &message) => {
                tracing::debug!(collection = name, "Collection already exists");
                Ok(CollectionStatus::AlreadyExists)
            }
            other => Err(other),
        }
    }

    async fn add_documents(&self, docs: &[Document], name: &str) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != docs.len() {
            return Err(StoreError::InvalidResponse(format!(
                "embedder returned {} vectors for {} documents",
                vectors.len(),
                docs.len()
            )));
        }

        let points: Vec<Value> = docs
            .iter()
            .zip(vectors)
            .map(|(doc, vector)| {
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "vector": vector,
                    "payload": doc,
                })
            })
            .collect();

        let mut url = self.endpoint(&["collections", name, "points"]);
        url.query_pairs_mut().append_pair("wait", "true");

        let response = self
            .with_auth(self.http.put(url))
            .json(&json!({ "points": points }))
            .send()
            .await?;
        let _: Value = Self::handle_response(response, name).await?;

        tracing::debug!(collection = name, count = docs.len(), "Upserted documents");
        Ok(docs.len())
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        name: &str,
        filter: Option<&Filter>,
    ) -> Result<Vec<ScoredDocument>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query).await?;

        let mut body = json!({
            "vector": vector,
            "limit": k,
            "with_payload": true,
        });
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            body["filter"] = filter.to_qdrant();
        }

        let response = self
            .with_auth(
                self.http
                    .post(self.endpoint(&["collections", name, "points", "search"])),
            )
            .json(&body)
            .send()
            .await?;
        let hits: Vec<QdrantScoredPoint> = Self::handle_response(response, name).await?;

        tracing::debug!(collection = name, k, hits = hits.len(), "Similarity search");

        // At most k, even if the server ignored `limit`.
        hits.into_iter()
            .take(k)
            .map(|hit| {
                Ok(ScoredDocument {
                    document: document_from_payload(hit.payload)?,
                    score: hit.score,
                })
            })
            .collect()
    }

    async fn scroll(&self, name: &str, filter: Option<&Filter>) -> Result<Vec<Document>> {
        let url = self.endpoint(&["collections", name, "points", "scroll"]);
        let mut documents = Vec::new();
        let mut offset: Option<Value> = None;

        loop {
            let mut body = json!({
                "limit": self.config.scroll_page_size,
                "with_payload": true,
                "with_vector": false,
            });
            if let Some(filter) = filter.filter(|f| !f.is_empty()) {
                body["filter"] = filter.to_qdrant();
            }
            if let Some(ref offset) = offset {
                body["offset"] = offset.clone();
            }

            let response = self
                .with_auth(self.http.post(url.clone()))
                .json(&body)
                .send()
                .await?;
            let page: QdrantScrollPage = Self::handle_response(response, name).await?;

            for point in page.points {
                documents.push(document_from_payload(point.payload)?);
            }

            match page.next_page_offset {
                Some(next) if !next.is_null() && Some(&next) != offset.as_ref() => {
                    offset = Some(next)
                }
                _ => break,
            }
        }

        tracing::debug!(collection = name, count = documents.len(), "Scrolled collection");
        Ok(documents)
    }

    async fn point_count(&self, name: &str) -> Result<u64> {
        let response = self
            .with_auth(self.http.get(self.endpoint(&["collections", name])))
            .send()
            .await?;
        let info: QdrantCollectionInfo = Self::handle_response(response, name).await?;
        Ok(info.points_count.unwrap_or(0))
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Qdrant API Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QdrantEnvelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct QdrantErrorBody {
    status: Option<QdrantErrorStatus>,
}

#[derive(Debug, Deserialize)]
struct QdrantErrorStatus {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QdrantScoredPoint {
    score: f32,
    payload: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QdrantPoint {
    payload: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QdrantScrollPage {
    points: Vec<QdrantPoint>,
    next_page_offset: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QdrantCollectionInfo {
    points_count: Option<u64>,
}
