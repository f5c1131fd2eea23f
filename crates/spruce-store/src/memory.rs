//! In-process document store.
//!
//! Keeps collections in memory and ranks by cosine similarity over the
//! injected embedder's vectors. Used by tests and by the CLI's offline mode.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use spruce_llm::{SharedEmbedder, cosine_similarity};

use crate::backend::{CollectionStatus, DocumentStore};
use crate::document::{Document, ScoredDocument};
use crate::error::{Result, StoreError};
use crate::filter::Filter;

#[derive(Debug, Clone)]
struct StoredPoint {
    vector: Vec<f32>,
    document: Document,
}

/// A [`DocumentStore`] backed by a `HashMap` of collections.
pub struct InMemoryStore {
    embedder: SharedEmbedder,
    collections: RwLock<HashMap<String, Vec<StoredPoint>>>,
}

impl InMemoryStore {
    pub fn new(embedder: SharedEmbedder) -> Self {
        Self {
            embedder,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Names of all collections, sorted.
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<_> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("embedder", &self.embedder.name())
            .field("collections", &self.collections())
            .finish()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create_collection(&self, name: &str) -> Result<CollectionStatus> {
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Ok(CollectionStatus::AlreadyExists);
        }
        collections.insert(name.to_string(), Vec::new());
        tracing::debug!(collection = name, "Created in-memory collection");
        Ok(CollectionStatus::Created)
    }

    async fn add_documents(&self, docs: &[Document], name: &str) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }
        if !self.collections.read().contains_key(name) {
            return Err(StoreError::CollectionNotFound(name.to_string()));
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

        let mut collections = self.collections.write();
        let points = collections
            .get_mut(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;
        points.extend(
            docs.iter()
                .cloned()
                .zip(vectors)
                .map(|(document, vector)| StoredPoint { vector, document }),
        );
        Ok(docs.len())
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        name: &str,
        filter: Option<&Filter>,
    ) -> Result<Vec<ScoredDocument>> {
        let query_vector = self.embedder.embed(query).await?;

        let collections = self.collections.read();
        let points = collections
            .get(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;

        let mut hits: Vec<ScoredDocument> = points
            .iter()
            .filter(|p| filter.is_none_or(|f| f.matches(&p.document.metadata)))
            .map(|p| ScoredDocument {
                document: p.document.clone(),
                score: cosine_similarity(&query_vector, &p.vector),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    async fn scroll(&self, name: &str, filter: Option<&Filter>) -> Result<Vec<Document>> {
        let collections = self.collections.read();
        let points = collections
            .get(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;

        Ok(points
            .iter()
            .filter(|p| filter.is_none_or(|f| f.matches(&p.document.metadata)))
            .map(|p| p.document.clone())
            .collect())
    }

    async fn point_count(&self, name: &str) -> Result<u64> {
        self.collections
            .read()
            .get(name)
            .map(|points| points.len() as u64)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spruce_llm::MockEmbedder;
    use std::sync::Arc;

    fn store() -> InMemoryStore {
        InMemoryStore::new(Arc::new(MockEmbedder::new(128)))
    }

    async fn seeded() -> InMemoryStore {
        let store = store();
        store.create_collection("c").await.unwrap();
        store
            .add_documents(
                &[
                    Document::new("Our carpet cleaning uses eco-friendly products").with_source("Mary"),
                    Document::new("Our office cleaning includes trash removal").with_source("Tech"),
                    Document::scheduling_rule("No appointments are available on Sundays."),
                    Document::new("Move-out cleaning of kitchens and floors").with_source("John"),
                ],
                "c",
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_collection_twice() {
        let store = store();
        assert_eq!(store.create_collection("c").await.unwrap(), CollectionStatus::Created);
        assert_eq!(
            store.create_collection("c").await.unwrap(),
            CollectionStatus::AlreadyExists
        );
        assert_eq!(store.collections(), vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn test_add_to_missing_collection() {
        let err = store()
            .add_documents(&[Document::new("x")], "missing")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_add_empty_is_noop() {
        let store = store();
        assert_eq!(store.add_documents(&[], "anything").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_similarity_search_ranks_and_limits() {
        let store = seeded().await;
        let hits = store
            .similarity_search("carpet cleaning products", 2, "c", None)
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.source(), Some("Mary"));
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_similarity_search_respects_filter() {
        let store = seeded().await;
        let filter = Filter::exclude_scheduling_rules();
        let hits = store
            .similarity_search("appointments on Sundays", 10, "c", Some(&filter))
            .await
            .unwrap();

        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| !h.document.is_scheduling_rule()));
    }

    #[tokio::test]
    async fn test_similarity_search_zero_k() {
        let store = seeded().await;
        let hits = store.similarity_search("anything", 0, "c", None).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_scroll_preserves_order() {
        let store = seeded().await;
        let all = store.scroll("c", None).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].source(), Some("Mary"));
        assert_eq!(all[3].source(), Some("John"));

        let rules = store.scroll("c", Some(&Filter::scheduling_rules())).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].content, "No appointments are available on Sundays.");
    }

    #[tokio::test]
    async fn test_has_documents() {
        let store = store();
        assert!(!store.has_documents("c").await);

        store.create_collection("c").await.unwrap();
        assert!(!store.has_documents("c").await);

        store.add_documents(&[Document::new("x")], "c").await.unwrap();
        assert!(store.has_documents("c").await);
        assert_eq!(store.point_count("c").await.unwrap(), 1);
    }
}
