//! Document store trait for pluggable vector stores.
//!
//! Both [`QdrantStore`](crate::QdrantStore) and
//! [`InMemoryStore`](crate::InMemoryStore) implement [`DocumentStore`], so the
//! workflows can run against a real Qdrant server or entirely in process.

use async_trait::async_trait;
use std::sync::Arc;

use crate::document::{Document, ScoredDocument};
use crate::error::Result;
use crate::filter::Filter;

/// Vector size of newly created collections (OpenAI `text-embedding-3-small`).
pub const DEFAULT_VECTOR_SIZE: usize = 1536;

/// Outcome of [`DocumentStore::create_collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Created,
    AlreadyExists,
}

/// Trait for vector document stores.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow sharing across the
/// concurrently running workflow branches.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a cosine-distance collection.
    ///
    /// An existing collection is not an error and yields
    /// [`CollectionStatus::AlreadyExists`]. Any other failure is returned.
    async fn create_collection(&self, name: &str) -> Result<CollectionStatus>;

    /// Embed and insert documents, returning how many were written.
    ///
    /// Each document gets a fresh point id. An empty slice is a no-op.
    async fn add_documents(&self, docs: &[Document], name: &str) -> Result<usize>;

    /// Return at most `k` documents closest to `query`, best first.
    ///
    /// Documents rejected by `filter` are never returned.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        name: &str,
        filter: Option<&Filter>,
    ) -> Result<Vec<ScoredDocument>>;

    /// Return every document matching `filter`, in store order.
    async fn scroll(&self, name: &str, filter: Option<&Filter>) -> Result<Vec<Document>>;

    /// Number of points in the collection.
    async fn point_count(&self, name: &str) -> Result<u64>;

    /// Whether the collection holds at least one point.
    ///
    /// Errors (including a missing collection or an unreachable store) are
    /// reported as `false`; callers cannot tell "empty" from "failed".
    async fn has_documents(&self, name: &str) -> bool {
        match self.point_count(name).await {
            Ok(count) => count > 0,
            Err(e) => {
                tracing::debug!(collection = name, error = %e, "Point count failed, treating as empty");
                false
            }
        }
    }

    /// Get the name of this store implementation.
    fn name(&self) -> &str;
}

/// A store that can be shared across tasks.
pub type SharedStore = Arc<dyn DocumentStore>;
